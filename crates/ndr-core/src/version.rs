//! Ordering for dotted version strings such as `16.0.1` or `1.0.0-alpha2`.
//!
//! Components are compared numerically left to right and the shorter version
//! is padded with zeros, so `1.2` == `1.2.0` and `1.10` > `1.9`. A component
//! that is not a plain integer weighs 0. An optional `-suffix` only breaks
//! ties: a release sorts after any suffixed build of the same numbers. The
//! suffix of a malformed version is ignored, so two malformed versions weigh
//! the same.

use std::cmp::Ordering;

/// Split `1.2.3-rc1` into (`1.2.3`, Some(`rc1`)).
fn split_suffix(version: &str) -> (&str, Option<&str>) {
    match version.split_once('-') {
        Some((numbers, suffix)) => (numbers, Some(suffix)),
        None => (version, None),
    }
}

/// Numeric components, and whether every one of them parsed.
fn components(numbers: &str) -> (Vec<u64>, bool) {
    let mut well_formed = true;
    let parts = numbers
        .split('.')
        .map(|c| {
            c.trim().parse::<u64>().unwrap_or_else(|_| {
                well_formed = false;
                0
            })
        })
        .collect();
    (parts, well_formed)
}

/// Split into numeric components and the tie-breaking suffix, if it counts.
fn sort_key(version: &str) -> (Vec<u64>, Option<&str>) {
    let (numbers, suffix) = split_suffix(version.trim());
    let (parts, well_formed) = components(numbers);
    (parts, suffix.filter(|_| well_formed))
}

/// Compare two version strings. Total, antisymmetric and transitive.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a_parts, a_suffix) = sort_key(a);
    let (b_parts, b_suffix) = sort_key(b);

    let len = a_parts.len().max(b_parts.len());
    for i in 0..len {
        let x = a_parts.get(i).copied().unwrap_or(0);
        let y = b_parts.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    match (a_suffix, b_suffix) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_makes_trailing_zeros_equal() {
        assert_eq!(compare_versions("1.2.0", "1.2"), Ordering::Equal);
        assert_eq!(compare_versions("1", "1.0.0.0"), Ordering::Equal);
    }

    #[test]
    fn components_compare_numerically() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("2.0", "10.0"), Ordering::Less);
    }

    #[test]
    fn malformed_components_weigh_zero() {
        assert_eq!(compare_versions("x.y", "0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.x", "1.0"), Ordering::Equal);
    }

    #[test]
    fn malformed_versions_ignore_their_suffix() {
        assert_eq!(compare_versions("garbage", "other-garbage"), Ordering::Equal);
        assert_eq!(compare_versions("abc-z", "xyz-a"), Ordering::Equal);
        assert_eq!(compare_versions("1.x-rc1", "1.0-rc2"), Ordering::Greater);
        assert_eq!(compare_versions("1.x-rc1", "1.0"), Ordering::Equal);
    }

    #[test]
    fn suffix_breaks_ties_only() {
        assert_eq!(compare_versions("1.0.0-alpha1", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1-alpha1", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-beta", "1.0-alpha"), Ordering::Greater);
    }

    #[test]
    fn antisymmetric_and_transitive_over_samples() {
        let samples = [
            "0", "1", "1.0", "1.2", "1.2.0", "1.9", "1.10", "1.10.0-rc1", "2.0-alpha", "2.0",
            "x", "10.0.1", "x-b", "y-a", "1.x-z", "1.0-a", "1.0-b",
        ];
        for a in samples {
            for b in samples {
                assert_eq!(compare_versions(a, b), compare_versions(b, a).reverse());
                for c in samples {
                    if compare_versions(a, b) != Ordering::Greater
                        && compare_versions(b, c) != Ordering::Greater
                    {
                        assert_ne!(compare_versions(a, c), Ordering::Greater, "{a} {b} {c}");
                    }
                }
            }
        }
    }
}
