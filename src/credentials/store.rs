use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::credentials::token::TokenSet;
use crate::error::Error;

pub const STORE_VERSION: u32 = 1;

/// On-disk shape of the credential document. The version field allows
/// the format to evolve without breaking old files.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    version: u32,
    #[serde(flatten)]
    token: TokenSet,
}

/// Durable holder of the current TokenSet: one JSON document, read at
/// process start, overwritten on every acquisition/refresh.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }

    /// Read the persisted TokenSet, if any.
    ///
    /// A missing file means the service starts unauthenticated. A corrupt
    /// or future-versioned document is logged and treated the same way —
    /// never a startup failure.
    pub async fn load(&self) -> Result<Option<TokenSet>, Error> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(e)),
        };

        match serde_json::from_str::<StoredCredentials>(&raw) {
            Ok(stored) if stored.version == STORE_VERSION => Ok(Some(stored.token)),
            Ok(stored) => {
                warn!(
                    "credential file '{}' has unsupported version {}, ignoring",
                    self.path.display(),
                    stored.version
                );
                Ok(None)
            }
            Err(e) => {
                warn!(
                    "credential file '{}' is unreadable ({}), ignoring",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Persist a TokenSet atomically: write a tmp sibling, restrict
    /// permissions, then rename over the target so a reader never
    /// observes a partially written file.
    pub async fn save(&self, token: &TokenSet) -> Result<(), Error> {
        let stored = StoredCredentials {
            version: STORE_VERSION,
            token: token.clone(),
        };
        let body = serde_json::to_vec_pretty(&stored).map_err(|e| Error::Deserialization {
            message: format!("serializing credentials: {}", e),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &body).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        fs::rename(&tmp, &self.path).await?;
        info!("credentials persisted to '{}'", self.path.display());
        Ok(())
    }

    /// Remove the persisted document. Used when the vendor revokes the
    /// refresh token, so a restart does not resurrect dead credentials.
    pub async fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e)),
        }
    }
}
