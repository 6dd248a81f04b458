pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::notifications::handlers as notifications;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        // Candidates
        .route("/candidates", get(candidates::handle_list_candidates))
        .route("/add_candidate", post(candidates::handle_add_candidate))
        .route("/update_status/:id", post(candidates::handle_update_status))
        .route(
            "/delete_candidate/:id",
            delete(candidates::handle_delete_candidate),
        )
        // Email
        .route("/get_templates", get(notifications::handle_get_templates))
        .route(
            "/send_emails_by_filter",
            post(notifications::handle_send_emails_by_filter),
        )
        .with_state(state)
}
