use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    io::AsyncWriteExt,
    sync::{broadcast, Mutex, RwLock},
};
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};

/// Opaque tokens issued by the login endpoint. Field names double as the
/// fixed storage keys of the persisted session document.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    /// The server rejected the live credential; the session has already been
    /// evicted and the user has to authenticate again.
    ReauthenticationRequired,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> ClientResult<Option<Credentials>>;
    async fn save(&self, credentials: &Credentials) -> ClientResult<()>;
    async fn clear(&self) -> ClientResult<()>;
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credentials>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> ClientResult<Option<Credentials>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        *self.slot.lock().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        self.slot.lock().await.take();
        Ok(())
    }
}

/// JSON document on disk holding the session tokens.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_private(path: &Path, raw: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;
    // `mode` only applies on creation; a leftover staging file keeps its bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    file.write_all(raw).await?;
    file.sync_all().await
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> ClientError {
    ClientError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> ClientResult<Option<Credentials>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(storage_error(&self.path, err)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let credentials: Credentials =
            serde_json::from_str(&raw).map_err(|err| storage_error(&self.path, err))?;
        Ok((!credentials.access_token.is_empty()).then_some(credentials))
    }

    async fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| storage_error(parent, err))?;
        }
        let raw = serde_json::to_vec_pretty(credentials)
            .map_err(|err| storage_error(&self.path, err))?;

        // Owner-only staging file renamed over the document, so readers see
        // either the old tokens or the new ones.
        let staging = self.staging_path();
        write_private(&staging, &raw)
            .await
            .map_err(|err| storage_error(&staging, err))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| storage_error(&self.path, err))
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error(&self.path, err)),
        }
    }
}

/// Holds at most one live credential. Every write is a single assignment
/// under the lock, followed by write-through to the persistence backend.
pub struct SessionStore {
    current: RwLock<Option<Credentials>>,
    persistence: Arc<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn in_memory() -> Arc<Self> {
        Self::with_credentials(Arc::new(MemoryCredentialStore::default()), None)
    }

    /// Opens a session backed by `persistence`, picking up whatever
    /// credential it already holds.
    pub async fn restore(persistence: Arc<dyn CredentialStore>) -> ClientResult<Arc<Self>> {
        let credentials = persistence.load().await?;
        if credentials.is_some() {
            info!("session: restored persisted credential");
        }
        Ok(Self::with_credentials(persistence, credentials))
    }

    fn with_credentials(
        persistence: Arc<dyn CredentialStore>,
        credentials: Option<Credentials>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            current: RwLock::new(credentials),
            persistence,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        if self.has_valid().await {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Present-or-absent check; the token is never inspected for expiry.
    pub async fn has_valid(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|creds| creds.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .and_then(|creds| creds.refresh_token.clone())
    }

    pub async fn set(&self, credentials: Credentials) -> ClientResult<()> {
        self.persistence.save(&credentials).await?;
        *self.current.write().await = Some(credentials);
        info!("session: signed in");
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(())
    }

    /// Explicit sign-out. Returns whether a credential was present.
    pub async fn clear(&self) -> bool {
        let previous = self.current.write().await.take();
        self.forget_persisted().await;
        if previous.is_some() {
            info!("session: signed out");
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        previous.is_some()
    }

    /// Evicts the session after the server rejected `rejected_token`.
    ///
    /// Only the request that still matches the live credential performs the
    /// eviction, so a burst of concurrent rejections clears the store once and
    /// emits one reauthentication signal. A rejection of a token that has
    /// since been replaced by a fresh login leaves the new session alone.
    pub async fn evict_rejected(&self, rejected_token: &str) -> bool {
        let evicted = {
            let mut guard = self.current.write().await;
            match guard.as_ref() {
                Some(live) if live.access_token == rejected_token => guard.take().is_some(),
                _ => false,
            }
        };

        if evicted {
            self.forget_persisted().await;
            warn!("session: credential rejected by server, evicted");
            let _ = self.events.send(SessionEvent::ReauthenticationRequired);
        }
        evicted
    }

    async fn forget_persisted(&self) {
        if let Err(err) = self.persistence.clear().await {
            warn!("session: failed to clear persisted credential: {err}");
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
