//! API secret storage and provisioning.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use stacker_core::error::{Result, StackError};

/// Key under which the merge endpoint's API secret is stored.
pub const API_KEY_ENTRY: &str = "api_key";

/// Process-persistent key-value store for secrets.
pub trait SecretStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Secrets kept in a TOML file readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| StackError::Serialization(e.to_string()))
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        let content =
            toml::to_string(&entries).map_err(|e| StackError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        restrict_to_owner(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Secrets held for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Hands out the API secret, provisioning it from configuration when the
/// secret store has none.
#[derive(Clone)]
pub struct ApiKeyProvider {
    store: Arc<dyn SecretStore>,
    configured: Option<String>,
}

impl ApiKeyProvider {
    pub fn new(store: Arc<dyn SecretStore>, configured: Option<String>) -> Self {
        Self { store, configured }
    }

    /// Write the configured secret into the secret store.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if no secret is configured.
    pub fn provision(&self) -> Result<String> {
        let key = self
            .configured
            .clone()
            .ok_or_else(|| StackError::Config("API key not configured".to_string()))?;
        self.store.set(API_KEY_ENTRY, &key)?;
        tracing::debug!("Provisioned API key into secret store");
        Ok(key)
    }

    /// The stored secret, provisioned first if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if the store is empty and no secret is
    /// configured.
    pub fn api_key(&self) -> Result<String> {
        match self.store.get(API_KEY_ENTRY)? {
            Some(key) if !key.is_empty() => Ok(key),
            _ => {
                tracing::debug!("API key missing from secret store; provisioning");
                self.provision()
            }
        }
    }
}
