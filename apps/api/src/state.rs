use std::sync::Arc;

use crate::candidates::CandidateRepository;
use crate::notifications::templates::TemplateCatalog;
use crate::notifications::Mailer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Candidate store. Default: `PgCandidateRepository`.
    pub candidates: Arc<dyn CandidateRepository>,
    /// Outbound mail. Default: `SmtpMailer`.
    pub mailer: Arc<dyn Mailer>,
    /// Immutable, seeded at startup.
    pub templates: Arc<TemplateCatalog>,
}
