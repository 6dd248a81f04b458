use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::candidates::handlers::{json_body, non_blank, parse_year, query_params};
use crate::errors::AppError;
use crate::models::candidate::{CandidateFilter, CandidateStatus};
use crate::models::response::MessageResponse;
use crate::notifications::templates::EmailTemplate;
use crate::notifications::{send_to_all, BulkMessage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TemplatesQuery {
    pub round: Option<String>,
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<EmailTemplate>,
}

#[derive(Debug, Deserialize)]
pub struct SendByFilterRequest {
    pub year: Option<Value>,
    pub round: Option<String>,
    pub status: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// GET /get_templates
pub async fn handle_get_templates(
    State(state): State<AppState>,
    query: Result<Query<TemplatesQuery>, QueryRejection>,
) -> Result<Json<TemplatesResponse>, AppError> {
    let invalid_round = || AppError::Validation("Invalid or missing round".to_string());
    let params = query_params(query).map_err(|_| invalid_round())?;
    let templates = params
        .round
        .as_deref()
        .and_then(|round| state.templates.get(round))
        .ok_or_else(invalid_round)?;

    Ok(Json(TemplatesResponse {
        templates: templates.to_vec(),
    }))
}

/// POST /send_emails_by_filter
pub async fn handle_send_emails_by_filter(
    State(state): State<AppState>,
    payload: Result<Json<SendByFilterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = json_body(payload)?;

    let round =
        non_blank(req.round).ok_or_else(|| AppError::Validation("Missing round".to_string()))?;
    let (Some(subject), Some(body)) = (non_blank(req.subject), non_blank(req.body)) else {
        return Err(AppError::Validation(
            "Subject and body are required".to_string(),
        ));
    };
    let message = BulkMessage::parse(&subject, &body)
        .map_err(|e| AppError::Validation(format!("Invalid template: {e}")))?;

    let status = non_blank(req.status)
        .map(|s| s.parse::<CandidateStatus>())
        .transpose()
        .map_err(|_| AppError::Validation("Invalid status".to_string()))?;
    let filter = CandidateFilter {
        year: parse_year(req.year.as_ref())?,
        round: Some(round),
        status,
    };

    let candidates = state.candidates.list(&filter).await?;
    if candidates.is_empty() {
        return Err(AppError::NotFound(
            "No candidates found with the given filters".to_string(),
        ));
    }

    let sent = send_to_all(state.mailer.as_ref(), &message, &candidates)
        .await
        .map_err(|e| {
            warn!("Bulk send aborted: {e}");
            AppError::Internal(e.into())
        })?;

    info!("Bulk email delivered to {sent} candidates for {:?}", filter);
    Ok(Json(MessageResponse::new(format!(
        "Emails sent successfully to {sent} candidates!"
    ))))
}
