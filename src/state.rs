use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::N8nConfig;
use crate::jobs::JobConfig;
use crate::mailer::Mailer;

/// Shared handles, constructed once at startup and cloned into every
/// worker and request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub http: reqwest::Client,
    pub job: JobConfig,
    pub n8n: N8nConfig,
}
