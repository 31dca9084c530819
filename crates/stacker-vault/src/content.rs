//! In-memory cache of recipe document text.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use stacker_core::error::{Result, StackError};
use stacker_core::markdown::{
    is_placeholder, not_found_placeholder, recipe_body, MISSING_RECIPE_BODY,
};
use stacker_core::recipe::RECIPE_EXTENSION;

use crate::fs::RecipeFs;

/// Maps file references to document text.
///
/// Entries are filled on first successful read and are never invalidated
/// or evicted for the lifetime of the cache. Two callers missing on the
/// same reference at once may both read the file; the later insert wins
/// with identical text.
pub struct ContentCache {
    fs: Arc<dyn RecipeFs>,
    entries: Mutex<HashMap<String, String>>,
}

impl ContentCache {
    pub fn new(fs: Arc<dyn RecipeFs>) -> Self {
        Self {
            fs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The file system this cache reads from.
    pub fn fs(&self) -> &Arc<dyn RecipeFs> {
        &self.fs
    }

    /// Full text of the document at `reference`.
    ///
    /// A missing document yields the not-found placeholder (see
    /// [`stacker_core::markdown::is_placeholder`]); the placeholder is not
    /// cached, so the document is picked up once it appears.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Io`] for read failures other than a missing file.
    pub fn get_content(&self, reference: &str) -> Result<String> {
        if let Some(hit) = self.lock().get(reference) {
            tracing::debug!(reference, "Recipe content cache hit");
            return Ok(hit.clone());
        }

        match self.fs.read_to_string(reference) {
            Ok(content) => {
                self.lock().insert(reference.to_string(), content.clone());
                Ok(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(reference, "Recipe file not found");
                Ok(not_found_placeholder(reference))
            }
            Err(e) => Err(StackError::Io(e)),
        }
    }

    /// Displayable body of a recipe given its id or file reference.
    ///
    /// Returns [`MISSING_RECIPE_BODY`] when the document does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Io`] for read failures other than a missing file.
    pub fn load_recipe_body(&self, id_or_reference: &str) -> Result<String> {
        let reference = if id_or_reference.ends_with(&format!(".{RECIPE_EXTENSION}")) {
            id_or_reference.to_string()
        } else {
            format!("{id_or_reference}.{RECIPE_EXTENSION}")
        };

        let content = self.get_content(&reference)?;
        if is_placeholder(&content) {
            return Ok(MISSING_RECIPE_BODY.to_string());
        }
        Ok(recipe_body(&content).to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.lock().contains_key(reference)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts reads passing through to a local directory.
    struct ReadCounting {
        inner: LocalFs,
        reads: AtomicUsize,
    }

    impl RecipeFs for ReadCounting {
        fn is_persistent(&self) -> bool {
            true
        }
        fn exists(&self, reference: &str) -> bool {
            self.inner.exists(reference)
        }
        fn create_dir_all(&self, reference: &str) -> io::Result<()> {
            self.inner.create_dir_all(reference)
        }
        fn read_to_string(&self, reference: &str) -> io::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_to_string(reference)
        }
        fn write(&self, reference: &str, content: &str) -> io::Result<()> {
            self.inner.write(reference, content)
        }
        fn list_markdown(&self, namespace: &str) -> io::Result<Vec<String>> {
            self.inner.list_markdown(namespace)
        }
    }

    fn counting(dir: &std::path::Path) -> Arc<ReadCounting> {
        Arc::new(ReadCounting {
            inner: LocalFs::new(dir),
            reads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn second_read_is_served_from_memory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("soup.md"), "# Tomato Soup\n---\nBody").unwrap();
        let fs = counting(dir.path());
        let cache = ContentCache::new(fs.clone());

        let first = cache.get_content("soup.md").unwrap();
        let second = cache.get_content("soup.md").unwrap();
        assert_eq!(first, second);
        assert_eq!(fs.reads.load(Ordering::SeqCst), 1);
        assert!(cache.contains("soup.md"));
    }

    #[test]
    fn cached_content_is_never_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("soup.md"), "# Old").unwrap();
        let cache = ContentCache::new(Arc::new(LocalFs::new(dir.path())));

        assert_eq!(cache.get_content("soup.md").unwrap(), "# Old");
        std::fs::write(dir.path().join("soup.md"), "# New").unwrap();
        assert_eq!(cache.get_content("soup.md").unwrap(), "# Old");
    }

    #[test]
    fn missing_file_yields_uncached_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let fs = counting(dir.path());
        let cache = ContentCache::new(fs.clone());

        let content = cache.get_content("stacked/gone.md").unwrap();
        assert!(is_placeholder(&content));
        assert!(content.starts_with("# stacked/gone.md"));
        assert!(cache.is_empty());

        std::fs::create_dir_all(dir.path().join("stacked")).unwrap();
        std::fs::write(dir.path().join("stacked").join("gone.md"), "# Back").unwrap();
        assert_eq!(cache.get_content("stacked/gone.md").unwrap(), "# Back");
        assert_eq!(fs.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn other_read_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("folder.md")).unwrap();
        let cache = ContentCache::new(Arc::new(LocalFs::new(dir.path())));
        assert!(matches!(
            cache.get_content("folder.md"),
            Err(StackError::Io(_))
        ));
    }

    #[test]
    fn load_recipe_body_resolves_ids_and_references() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("soup.md"),
            "# Tomato Soup\n> Simple and warm\n---\nBody text",
        )
        .unwrap();
        let cache = ContentCache::new(Arc::new(LocalFs::new(dir.path())));

        assert_eq!(cache.load_recipe_body("soup").unwrap(), "Body text");
        assert_eq!(cache.load_recipe_body("soup.md").unwrap(), "Body text");
        assert_eq!(cache.load_recipe_body("missing").unwrap(), MISSING_RECIPE_BODY);
    }
}
