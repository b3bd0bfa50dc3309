//! Storage for the remote service credential.
//!
//! The key is a single string stored under [`CREDENTIAL_KEY`]. Where it lives
//! is up to the [`CredentialStore`] implementation: a TOML file on disk,
//! environment variables, or memory for tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// Environment variables checked by [`EnvCredentialStore`], in order.
pub const CREDENTIAL_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize credential file: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Credential store is read-only")]
    ReadOnly,
}

/// Read/write access to the API credential.
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential. Blank values count as absent.
    fn load(&self) -> Result<Option<String>, CredentialError>;

    /// Persist `value`, replacing any previous credential.
    fn save(&self, value: &str) -> Result<(), CredentialError>;
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Credential kept in a small TOML file (`gemini_api_key = "..."`).
///
/// Other keys in the file are preserved on save.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|source| CredentialError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        let mut table = self.read_table()?;
        Ok(table.remove(CREDENTIAL_KEY).and_then(non_blank))
    }

    fn save(&self, value: &str) -> Result<(), CredentialError> {
        let mut table = self.read_table()?;
        table.insert(CREDENTIAL_KEY.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, toml::to_string(&table)?)?;
        log::debug!("Saved credential to {}", self.path.display());
        Ok(())
    }
}

/// Read-only credential taken from `GEMINI_API_KEY` or `API_KEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

impl CredentialStore for EnvCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(CREDENTIAL_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(non_blank))
    }

    fn save(&self, _value: &str) -> Result<(), CredentialError> {
        Err(CredentialError::ReadOnly)
    }
}

/// In-memory credential, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        let guard = self.value.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().and_then(non_blank))
    }

    fn save(&self, value: &str) -> Result<(), CredentialError> {
        let mut guard = self.value.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value.to_string());
        Ok(())
    }
}

/// Tries each store in order on load; saves to the first writable one.
pub struct ChainedCredentialStore {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl ChainedCredentialStore {
    pub fn new(stores: Vec<Box<dyn CredentialStore>>) -> Self {
        Self { stores }
    }
}

impl CredentialStore for ChainedCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        for store in &self.stores {
            if let Some(value) = store.load()? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn save(&self, value: &str) -> Result<(), CredentialError> {
        for store in &self.stores {
            match store.save(value) {
                Err(CredentialError::ReadOnly) => continue,
                other => return other,
            }
        }
        Err(CredentialError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ChainedCredentialStore, CredentialError, CredentialStore, EnvCredentialStore,
        FileCredentialStore, MemoryCredentialStore,
    };

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.toml"));

        assert_eq!(store.load().unwrap(), None);
        store.save("secret-key").unwrap();
        assert_eq!(store.load().unwrap(), Some("secret-key".to_string()));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("gemini_api_key"));
    }

    #[test]
    fn file_store_keeps_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "other = \"value\"\n").unwrap();

        let store = FileCredentialStore::new(&path);
        store.save("k").unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("other = \"value\""));
    }

    #[test]
    fn blank_value_reads_as_absent() {
        let store = MemoryCredentialStore::new(Some("   ".to_string()));
        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn env_store_is_read_only() {
        assert!(matches!(
            EnvCredentialStore.save("x"),
            Err(CredentialError::ReadOnly)
        ));
    }

    #[test]
    fn chain_falls_through_and_saves_to_first_writable() {
        let chain = ChainedCredentialStore::new(vec![
            Box::new(EnvCredentialStore),
            Box::new(MemoryCredentialStore::default()),
        ]);
        chain.save("from-chain").unwrap();
        // Env vars may be set on the host; only assert when they are not.
        if EnvCredentialStore.load().unwrap().is_none() {
            assert_eq!(chain.load().unwrap(), Some("from-chain".to_string()));
        }
    }
}
