use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use scribe_db::Database;

use crate::error::ApiError;
use crate::password::Credentials;
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

/// Shared, read-only request state. Built once before the listener starts.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub credentials: Credentials,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenService, credentials: Credentials) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            credentials,
        })
    }
}

/// Run blocking work (SQLite, Argon2) off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("blocking task failed"))
        })?
}
