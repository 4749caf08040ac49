//! Where things live inside a project.

use std::path::{Path, PathBuf};

const ASSETS_DIR: &str = "Assets";
const PACKAGES_DIR: &str = "Packages";
const STATE_DIR: &str = ".ndr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Declarations and unmanaged archives live here.
    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }

    /// Root for package-relative local repositories.
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join(PACKAGES_DIR)
    }

    /// Destination of fetched artifacts.
    pub fn destination(&self) -> PathBuf {
        self.assets_dir().join("Plugins").join("Android")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.state_dir().join("labels.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join("resolution_state.json")
    }

    /// Roots relative local repositories are resolved against, in priority order.
    pub fn repository_roots(&self) -> Vec<PathBuf> {
        vec![self.packages_dir(), self.assets_dir()]
    }

    /// Project-relative form of `path`, `/`-separated; absolute paths outside
    /// the project are kept as given.
    pub fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    pub fn absolute(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
