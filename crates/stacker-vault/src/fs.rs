//! Access to the recipe documents directory.
//!
//! Every component reaches recipe files through [`RecipeFs`], addressed by
//! file reference (`soup.md`, `stacked/<id>.md`) relative to the documents
//! root. The empty reference names the root itself.

use std::io;
use std::path::{Component, Path, PathBuf};

use stacker_core::recipe::RECIPE_EXTENSION;

/// File system holding recipe documents.
pub trait RecipeFs: Send + Sync {
    /// Whether writes survive the process. Hosts without persistent storage
    /// skip seeding and serve bundled content directly.
    fn is_persistent(&self) -> bool;

    fn exists(&self, reference: &str) -> bool;

    fn create_dir_all(&self, reference: &str) -> io::Result<()>;

    /// Read a document. A missing document is an error of kind
    /// [`io::ErrorKind::NotFound`].
    fn read_to_string(&self, reference: &str) -> io::Result<String>;

    /// Write a document, creating parent directories as needed.
    fn write(&self, reference: &str, content: &str) -> io::Result<()>;

    /// File names of the visible markdown documents directly inside
    /// `namespace`, sorted. A missing namespace lists as empty.
    fn list_markdown(&self, namespace: &str) -> io::Result<Vec<String>>;
}

/// Whether a directory entry name is a visible recipe document.
pub fn is_recipe_file_name(name: &str) -> bool {
    !name.starts_with('.')
        && Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == RECIPE_EXTENSION)
}

/// Join a namespace and a file name into a file reference.
pub fn join_reference(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", namespace.trim_end_matches('/'))
    }
}

/// Recipe documents stored under a local directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a reference onto the root, refusing anything that would escape it.
    fn resolve(&self, reference: &str) -> io::Result<PathBuf> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("recipe reference '{reference}' leaves the documents directory"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl RecipeFs for LocalFs {
    fn is_persistent(&self) -> bool {
        true
    }

    fn exists(&self, reference: &str) -> bool {
        self.resolve(reference).is_ok_and(|p| p.exists())
    }

    fn create_dir_all(&self, reference: &str) -> io::Result<()> {
        std::fs::create_dir_all(self.resolve(reference)?)
    }

    fn read_to_string(&self, reference: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(reference)?)
    }

    fn write(&self, reference: &str, content: &str) -> io::Result<()> {
        let path = self.resolve(reference)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    fn list_markdown(&self, namespace: &str) -> io::Result<Vec<String>> {
        let dir = self.resolve(namespace)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_recipe_file_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
