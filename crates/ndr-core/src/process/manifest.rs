//! Placeholder substitution over the attribute values of an archive manifest.

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// Placeholder the build system normally fills with the application id.
pub const APPLICATION_ID_PLACEHOLDER: &str = "${applicationId}";

pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// One replacement rule. `${name}` tokens are variables and are replaced
/// wherever they occur; any other token is a literal prefix, replaced once at
/// the start of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub token: String,
    pub value: String,
}

impl Substitution {
    pub fn new(token: &str, value: &str) -> Self {
        Self {
            token: token.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_variable(&self) -> bool {
        self.token.starts_with("${") && self.token.ends_with('}')
    }

    pub fn apply(&self, input: &str) -> Option<String> {
        if self.token.is_empty() {
            return None;
        }
        if self.is_variable() {
            input
                .contains(&self.token)
                .then(|| input.replace(&self.token, &self.value))
        } else {
            input
                .strip_prefix(&self.token)
                .map(|rest| format!("{}{rest}", self.value))
        }
    }
}

/// Apply every substitution in order; returns `None` when nothing changed.
pub fn substitute_value(value: &str, substitutions: &[Substitution]) -> Option<String> {
    let mut current = value.to_string();
    let mut changed = false;
    for sub in substitutions {
        if let Some(next) = sub.apply(&current) {
            current = next;
            changed = true;
        }
    }
    changed.then_some(current)
}

fn rewrite_element(element: &BytesStart<'_>, substitutions: &[Substitution]) -> Result<Option<BytesStart<'static>>> {
    let name = std::str::from_utf8(element.name().as_ref())
        .context("element name is not UTF-8")?
        .to_string();
    let mut changed = false;
    let mut attributes = Vec::new();
    for attr in element.attributes() {
        let attr = attr.context("malformed attribute")?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .context("attribute name is not UTF-8")?
            .to_string();
        let value = attr.unescape_value().context("attribute value")?.into_owned();
        match substitute_value(&value, substitutions) {
            Some(new_value) => {
                changed = true;
                attributes.push((key, new_value));
            }
            None => attributes.push((key, value)),
        }
    }
    if !changed {
        return Ok(None);
    }
    let mut rewritten = BytesStart::new(name);
    for (key, value) in &attributes {
        rewritten.push_attribute((key.as_str(), value.as_str()));
    }
    Ok(Some(rewritten))
}

/// Rewrite attribute values of every element. Returns the new document, or
/// `None` if no attribute changed.
pub fn substitute_manifest(xml: &str, substitutions: &[Substitution]) -> Result<Option<String>> {
    if substitutions.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut changed = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("parse manifest at byte {}", reader.buffer_position()))?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) => match rewrite_element(e, substitutions)? {
                Some(new) => {
                    changed = true;
                    writer.write_event(Event::Start(new))?;
                }
                None => writer.write_event(&event)?,
            },
            Event::Empty(ref e) => match rewrite_element(e, substitutions)? {
                Some(new) => {
                    changed = true;
                    writer.write_event(Event::Empty(new))?;
                }
                None => writer.write_event(&event)?,
            },
            other => writer.write_event(other)?,
        }
    }
    if !changed {
        return Ok(None);
    }
    let out = String::from_utf8(writer.into_inner()).context("rewritten manifest is not UTF-8")?;
    Ok(Some(out))
}

pub fn has_unresolved_application_id(xml: &str) -> bool {
    xml.contains(APPLICATION_ID_PLACEHOLDER)
}
