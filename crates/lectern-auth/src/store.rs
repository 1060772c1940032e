//! Credential persistence.
//!
//! One credential file per installation, owner-readable only, replaced
//! atomically so a concurrent reader never observes a partial write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::credential::Credential;
use crate::error::{AuthError, Result};

/// Default credential file name within the lectern config directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

// ============================================================================
// TokenStore Trait
// ============================================================================

/// Storage for the one persisted credential.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Load the persisted credential. [`AuthError::NotFound`] if the user
    /// never authenticated.
    async fn load(&self) -> Result<Credential>;

    /// Atomically persist a credential, replacing any prior value.
    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove the persisted credential. Absence is not an error.
    async fn delete(&self) -> Result<()>;

    /// Whether a credential exists that is currently valid or refreshable.
    async fn is_authenticated(&self) -> bool {
        match self.load().await {
            Ok(c) => !c.is_terminal(),
            Err(_) => false,
        }
    }
}

/// Shared token store for use across async contexts.
pub type SharedTokenStore = Arc<dyn TokenStore>;

// ============================================================================
// FileTokenStore
// ============================================================================

/// File-backed token store for production use.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<Credential>>,
}

impl FileTokenStore {
    /// Create a store persisting to `<config_dir>/credential.json`.
    pub fn new(config_dir: &Path) -> Self {
        Self::with_path(config_dir.join(CREDENTIAL_FILE))
    }

    /// Create a store persisting to an explicit path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    /// The credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, json: &str) -> std::io::Result<()> {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
        }

        // Write to a sibling temp file, then rename over the target. The
        // rename is atomic on POSIX filesystems, so readers see either the
        // old credential or the new one, never a torn file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp, &self.path)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Credential> {
        {
            let cached = self.cached.read().await;
            if let Some(credential) = cached.as_ref() {
                return Ok(credential.clone());
            }
        }

        if !self.path.exists() {
            return Err(AuthError::NotFound);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Store(format!("Failed to read credential file: {}", e)))?;

        let credential: Credential = serde_json::from_str(&content).map_err(|e| {
            AuthError::Serialization(format!("Failed to parse credential file: {}", e))
        })?;

        let mut cached = self.cached.write().await;
        *cached = Some(credential.clone());

        Ok(credential)
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential).map_err(|e| {
            AuthError::Serialization(format!("Failed to serialize credential: {}", e))
        })?;

        self.write_atomic(&json)
            .map_err(|e| AuthError::Store(format!("Failed to write credential file: {}", e)))?;

        let mut cached = self.cached.write().await;
        *cached = Some(credential.clone());

        tracing::info!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| AuthError::Store(format!("Failed to delete credential: {}", e)))?;
        }
        let mut cached = self.cached.write().await;
        *cached = None;
        Ok(())
    }
}

// ============================================================================
// MemoryTokenStore (for testing)
// ============================================================================

/// In-memory token store for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Credential> {
        self.credential
            .read()
            .await
            .clone()
            .ok_or(AuthError::NotFound)
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let mut guard = self.credential.write().await;
        *guard = Some(credential.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let mut guard = self.credential.write().await;
        *guard = None;
        Ok(())
    }
}
