use std::sync::Arc;

use proofroom_storage::AssetStore;

use crate::config::ServerConfig;
use crate::notify::Mailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: proofroom_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Image CDN client used for proof and final uploads.
    pub assets: Arc<dyn AssetStore>,
    /// SMTP mailer; `None` when SMTP is not configured, in which case
    /// notification and verification emails are skipped.
    pub mailer: Option<Arc<Mailer>>,
}
