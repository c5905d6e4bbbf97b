use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::interview::controller::SessionLifecycleController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Owns every live interview session. Cloning the state shares it.
    pub interviews: Arc<SessionLifecycleController>,
}
