//! Bearer token persistence.
//!
//! The token is an opaque string: never parsed, only stored and forwarded.
//! At most one is active per process. The store is an injectable capability
//! so the API client can be tested with an in-memory fake.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

/// Well-known file name holding the persisted token.
pub const TOKEN_FILE_NAME: &str = "flowbase_token";

/// Errors from the persistent token store.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Injectable holder of the bearer credential.
///
/// `get` is synchronous and answers from the store's in-process cache;
/// mutation happens only through explicit register/login/logout flows, never
/// from the forwarding layer or the polling loop. Writes are
/// last-writer-wins with no merge semantics; concurrent stores in other
/// processes are not synchronized.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The current token, or `None` when logged out.
    fn get(&self) -> Option<String>;

    /// Replace the stored token.
    async fn set(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Remove the stored token (logout).
    async fn clear(&self) -> Result<(), TokenStoreError>;
}

/// File-backed token store.
///
/// One opaque string under a single well-known file. The only constructor is
/// the async [`load`](FileTokenStore::load), which performs the initial read
/// -- that is the readiness signal: before `load` completes, the persisted
/// state is unknown, not absent, and no `get` can be answered.
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<String>>,
}

impl FileTokenStore {
    /// Read the persisted token (if any) from `dir` and return a ready store.
    ///
    /// A missing file means "no token"; any other I/O failure is an error.
    pub async fn load(dir: &Path) -> Result<Self, TokenStoreError> {
        let path = dir.join(TOKEN_FILE_NAME);

        let cached = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), present = cached.is_some(), "Token store loaded");

        Ok(Self {
            path,
            cached: RwLock::new(cached),
        })
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.read().expect("token cache lock poisoned").clone()
    }

    async fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        tokio::fs::write(&self.path, token).await?;
        *self.cached.write().expect("token cache lock poisoned") = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *self.cached.write().expect("token cache lock poisoned") = None;
        Ok(())
    }
}

/// In-memory token store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    cached: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            cached: RwLock::new(Some(token.to_string())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.read().expect("token cache lock poisoned").clone()
    }

    async fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.cached.write().expect("token cache lock poisoned") = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.cached.write().expect("token cache lock poisoned") = None;
        Ok(())
    }
}
