//! One-time copy of bundled recipe documents into the documents directory.

use std::sync::Arc;

use serde::Serialize;

use crate::bundle::BundledAsset;
use crate::fs::RecipeFs;

/// Outcome of [`AssetSeeder::ensure_seeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStatus {
    /// Documents were copied on this call.
    Seeded,
    /// The documents directory already existed; nothing was copied.
    AlreadySeeded,
    /// The host has no persistent storage; bundled content is read directly.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub status: SeedStatus,
    pub copied: usize,
    /// Names of assets that could not be loaded or written.
    pub failed: Vec<String>,
}

impl SeedReport {
    fn skipped(status: SeedStatus) -> Self {
        Self {
            status,
            copied: 0,
            failed: Vec::new(),
        }
    }
}

/// Copies bundled documents into a writable [`RecipeFs`].
pub struct AssetSeeder {
    fs: Arc<dyn RecipeFs>,
    assets: Vec<BundledAsset>,
}

impl AssetSeeder {
    pub fn new(fs: Arc<dyn RecipeFs>, assets: Vec<BundledAsset>) -> Self {
        Self { fs, assets }
    }

    /// Copy every bundled document into the documents directory unless the
    /// directory already exists.
    ///
    /// Presence of the directory is the only check: a document deleted
    /// after seeding is not restored. Individual copy failures are logged
    /// and skipped.
    pub fn ensure_seeded(&self) -> SeedReport {
        if !self.fs.is_persistent() {
            tracing::debug!("No persistent storage; bundled recipes are read in place");
            return SeedReport::skipped(SeedStatus::Unavailable);
        }
        if self.fs.exists("") {
            tracing::debug!("Recipes directory present; skipping seeding");
            return SeedReport::skipped(SeedStatus::AlreadySeeded);
        }

        let mut report = SeedReport::skipped(SeedStatus::Seeded);
        if let Err(e) = self.fs.create_dir_all("") {
            tracing::error!(error = %e, "Failed to create recipes directory");
            report.failed = self.assets.iter().map(|a| a.name().to_string()).collect();
            return report;
        }

        for asset in &self.assets {
            let copied = asset
                .load()
                .and_then(|content| self.fs.write(asset.name(), &content));
            match copied {
                Ok(()) => report.copied += 1,
                Err(e) => {
                    tracing::warn!(asset = asset.name(), error = %e, "Failed to seed recipe");
                    report.failed.push(asset.name().to_string());
                }
            }
        }

        tracing::info!(
            copied = report.copied,
            failed = report.failed.len(),
            "Seeded bundled recipes"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleFs;
    use crate::fs::LocalFs;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes passing through to a local directory.
    struct WriteCounting {
        inner: LocalFs,
        writes: AtomicUsize,
    }

    impl RecipeFs for WriteCounting {
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
            self.inner.read_to_string(reference)
        }
        fn write(&self, reference: &str, content: &str) -> io::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write(reference, content)
        }
        fn list_markdown(&self, namespace: &str) -> io::Result<Vec<String>> {
            self.inner.list_markdown(namespace)
        }
    }

    fn bundled() -> Vec<BundledAsset> {
        vec![
            BundledAsset::from_static("bread.md", "# Garlic Bread\n> Crispy"),
            BundledAsset::from_static("soup.md", "# Tomato Soup\n> Simple and warm"),
        ]
    }

    #[test]
    fn seeding_twice_copies_once() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(WriteCounting {
            inner: LocalFs::new(dir.path().join("recipes")),
            writes: AtomicUsize::new(0),
        });
        let seeder = AssetSeeder::new(fs.clone(), bundled());

        let first = seeder.ensure_seeded();
        assert_eq!(first.status, SeedStatus::Seeded);
        assert_eq!(first.copied, 2);
        assert_eq!(fs.writes.load(Ordering::SeqCst), 2);

        let second = seeder.ensure_seeded();
        assert_eq!(second.status, SeedStatus::AlreadySeeded);
        assert_eq!(fs.writes.load(Ordering::SeqCst), 2);

        assert_eq!(
            std::fs::read_to_string(dir.path().join("recipes").join("soup.md")).unwrap(),
            "# Tomato Soup\n> Simple and warm"
        );
    }

    #[test]
    fn deleted_documents_are_not_restored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recipes");
        let seeder = AssetSeeder::new(Arc::new(LocalFs::new(&root)), bundled());
        seeder.ensure_seeded();

        std::fs::remove_file(root.join("bread.md")).unwrap();
        seeder.ensure_seeded();
        assert!(!root.join("bread.md").exists());
        assert!(root.join("soup.md").exists());
    }

    #[test]
    fn failed_asset_does_not_stop_seeding() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recipes");
        let assets = vec![
            BundledAsset::new("broken.md", || Err(io::Error::other("asset missing"))),
            BundledAsset::from_static("soup.md", "# Tomato Soup"),
        ];
        let report = AssetSeeder::new(Arc::new(LocalFs::new(&root)), assets).ensure_seeded();

        assert_eq!(report.status, SeedStatus::Seeded);
        assert_eq!(report.copied, 1);
        assert_eq!(report.failed, vec!["broken.md"]);
        assert!(root.join("soup.md").exists());
    }

    #[test]
    fn non_persistent_host_skips_seeding() {
        let bundle = Arc::new(BundleFs::new(bundled()));
        let report = AssetSeeder::new(bundle, bundled()).ensure_seeded();
        assert_eq!(report.status, SeedStatus::Unavailable);
        assert_eq!(report.copied, 0);
    }
}
