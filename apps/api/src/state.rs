use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::GenerationClient;
use crate::recommend::score::ScoreSource;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub generation: GenerationClient,
    /// Full runtime configuration, kept for handlers that need settings
    /// beyond the injected clients.
    #[allow(dead_code)]
    pub config: Config,
    /// Pluggable plausibility-score source. Production uses a seedable RNG;
    /// tests pin a fixed value for exact aggregate assertions.
    pub scores: Arc<dyn ScoreSource>,
}
