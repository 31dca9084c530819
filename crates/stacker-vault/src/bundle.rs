//! Bundled recipe documents supplied by the host application.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::fs::{is_recipe_file_name, RecipeFs};

type Loader = Arc<dyn Fn() -> io::Result<String> + Send + Sync>;

/// One read-only bundled document: its file name and a loader for its text.
#[derive(Clone)]
pub struct BundledAsset {
    name: String,
    loader: Loader,
}

impl BundledAsset {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> io::Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Arc::new(loader),
        }
    }

    /// An asset whose content is already in memory.
    pub fn from_static(name: impl Into<String>, content: &'static str) -> Self {
        Self::new(name, move || Ok(content.to_string()))
    }

    /// Enumerate the markdown documents of a directory, ordered by name.
    /// Content is read when the asset is loaded, not here.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn from_dir(dir: &Path) -> io::Result<Vec<Self>> {
        let mut assets = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_recipe_file_name(&name) {
                continue;
            }
            let path = entry.path();
            assets.push(Self::new(name, move || std::fs::read_to_string(&path)));
        }
        assets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(assets)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// Propagates the loader's I/O error.
    pub fn load(&self) -> io::Result<String> {
        (self.loader)()
    }
}

impl fmt::Debug for BundledAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundledAsset")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Read-only view over the bundle, for hosts without persistent storage.
///
/// Only the ordinary namespace exists here: stacked documents are never
/// bundled, and writes are rejected.
#[derive(Debug, Clone)]
pub struct BundleFs {
    assets: Vec<BundledAsset>,
}

impl BundleFs {
    pub fn new(assets: Vec<BundledAsset>) -> Self {
        Self { assets }
    }

    fn find(&self, reference: &str) -> Option<&BundledAsset> {
        self.assets.iter().find(|a| a.name == reference)
    }
}

impl RecipeFs for BundleFs {
    fn is_persistent(&self) -> bool {
        false
    }

    fn exists(&self, reference: &str) -> bool {
        reference.is_empty() || self.find(reference).is_some()
    }

    fn create_dir_all(&self, _reference: &str) -> io::Result<()> {
        Err(read_only())
    }

    fn read_to_string(&self, reference: &str) -> io::Result<String> {
        match self.find(reference) {
            Some(asset) => asset.load(),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{reference}' is not bundled"),
            )),
        }
    }

    fn write(&self, _reference: &str, _content: &str) -> io::Result<()> {
        Err(read_only())
    }

    fn list_markdown(&self, namespace: &str) -> io::Result<Vec<String>> {
        if !namespace.is_empty() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = self
            .assets
            .iter()
            .filter(|a| is_recipe_file_name(&a.name))
            .map(|a| a.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

fn read_only() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "bundled recipes are read-only on this host",
    )
}
