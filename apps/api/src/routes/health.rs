use axum::extract::State;
use tracing::warn;

use crate::state::AppState;

/// GET /
/// Probes the database. Always answers 200; the text says whether the probe worked.
pub async fn health_handler(State(state): State<AppState>) -> String {
    match state.candidates.ping().await {
        Ok(()) => "Database connected successfully!".to_string(),
        Err(e) => {
            warn!("Health check failed: {e}");
            format!("Database connection failed: {e}")
        }
    }
}
