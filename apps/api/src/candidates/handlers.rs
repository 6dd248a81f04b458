use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateFilter, CandidateStatus, NewCandidate};
use crate::models::response::MessageResponse;
use crate::notifications::status_email;
use crate::state::AppState;

const CANDIDATE_NOT_FOUND: &str = "Candidate not found";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub year: Option<String>,
    pub round: Option<String>,
}

#[derive(Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct AddCandidateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Accepted as a JSON number or a numeric string.
    pub year: Option<Value>,
    pub round: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Treats blank strings as absent, matching how the query filters are sent by the UI.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses an optional year given as a JSON number or string. Blank or null means absent.
pub(crate) fn parse_year(value: Option<&Value>) -> Result<Option<i32>, AppError> {
    let invalid = || AppError::Validation("year must be an integer".to_string());
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Ids that are not a valid integer cannot name a candidate.
fn candidate_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound(CANDIDATE_NOT_FOUND.to_string()))
}

/// GET /candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let params = query_params(query)?;
    let year = non_blank(params.year).map(Value::String);
    let filter = CandidateFilter {
        year: parse_year(year.as_ref())?,
        round: non_blank(params.round),
        status: None,
    };

    let candidates = state.candidates.list(&filter).await?;
    Ok(Json(CandidateListResponse { candidates }))
}

/// POST /add_candidate
pub async fn handle_add_candidate(
    State(state): State<AppState>,
    payload: Result<Json<AddCandidateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = json_body(payload)?;

    let required = |field: &str, value: Option<String>| {
        non_blank(value)
            .map(|v| v.trim().to_string())
            .ok_or_else(|| AppError::Validation(format!("Missing required field '{field}'")))
    };
    let name = required("name", req.name)?;
    let email = required("email", req.email)?;
    let round = required("round", req.round)?;
    let year = parse_year(req.year.as_ref())?
        .ok_or_else(|| AppError::Validation("Missing required field 'year'".to_string()))?;

    let candidate = state
        .candidates
        .create(NewCandidate {
            name,
            email,
            year,
            round,
        })
        .await?;

    info!(
        "Added candidate {} for round {} ({})",
        candidate.id, candidate.round, candidate.year
    );
    Ok(Json(MessageResponse::new("Candidate added successfully!")))
}

/// POST /update_status/:id
///
/// The status change is committed before the notice is sent. If sending fails
/// the change stays in place and the 500 message says so.
pub async fn handle_update_status(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = candidate_id(path)?;
    if state.candidates.get(id).await?.is_none() {
        return Err(AppError::NotFound(CANDIDATE_NOT_FOUND.to_string()));
    }

    let new_status = payload
        .ok()
        .and_then(|Json(req)| req.status)
        .and_then(|s| s.parse::<CandidateStatus>().ok())
        .filter(CandidateStatus::is_decision)
        .ok_or_else(|| AppError::Validation("Invalid status".to_string()))?;

    let candidate = state
        .candidates
        .update_status(id, new_status)
        .await?
        .ok_or_else(|| AppError::NotFound(CANDIDATE_NOT_FOUND.to_string()))?;

    if let Err(e) = state.mailer.send(&status_email(&candidate)).await {
        warn!("Candidate {id} is now {new_status} but the notice to {} failed: {e}", candidate.email);
        return Err(AppError::Internal(anyhow::Error::new(e).context(format!(
            "Candidate status updated to {new_status}, but notification failed"
        ))));
    }

    Ok(Json(MessageResponse::new(format!(
        "Candidate status updated to {new_status}"
    ))))
}

/// DELETE /delete_candidate/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = candidate_id(path)?;
    if !state.candidates.delete(id).await? {
        return Err(AppError::NotFound(CANDIDATE_NOT_FOUND.to_string()));
    }
    Ok(Json(MessageResponse::new("Candidate deleted successfully")))
}
