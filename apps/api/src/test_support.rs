//! In-memory doubles for the repository and mailer seams.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::candidates::CandidateRepository;
use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateFilter, CandidateStatus, NewCandidate};
use crate::notifications::templates::TemplateCatalog;
use crate::notifications::{MailError, Mailer, OutgoingEmail};
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Default)]
struct MemoryInner {
    next_id: i32,
    rows: BTreeMap<i32, Candidate>,
    unavailable: bool,
}

/// Repository over a `BTreeMap`, enforcing the same email uniqueness as the table.
#[derive(Default)]
pub struct MemoryCandidateRepository {
    inner: Mutex<MemoryInner>,
}

impl MemoryCandidateRepository {
    /// Makes every subsequent call fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    pub fn all(&self) -> Vec<Candidate> {
        self.inner.lock().unwrap().rows.values().cloned().collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, AppError> {
        let guard = self.inner.lock().unwrap();
        if guard.unavailable {
            return Err(AppError::Internal(anyhow::anyhow!("connection refused")));
        }
        Ok(guard)
    }
}

#[async_trait]
impl CandidateRepository for MemoryCandidateRepository {
    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, AppError> {
        let mut inner = self.lock()?;
        if inner.rows.values().any(|c| c.email == candidate.email) {
            return Err(AppError::DuplicateEmail(candidate.email));
        }
        inner.next_id += 1;
        let record = Candidate {
            id: inner.next_id,
            name: candidate.name,
            email: candidate.email,
            status: CandidateStatus::Pending,
            year: candidate.year,
            round: candidate.round,
        };
        inner.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Candidate>, AppError> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: i32,
        status: CandidateStatus,
    ) -> Result<Option<Candidate>, AppError> {
        let mut inner = self.lock()?;
        Ok(inner.rows.get_mut(&id).map(|c| {
            c.status = status;
            c.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.lock()?.rows.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

/// Records every message; optionally fails once `fail_after` messages have gone out.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_after: Mutex<Option<usize>>,
}

impl RecordingMailer {
    pub fn failing_after(count: usize) -> Self {
        Self {
            sent: Mutex::default(),
            fail_after: Mutex::new(Some(count)),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut sent = self.sent.lock().unwrap();
        if let Some(limit) = *self.fail_after.lock().unwrap() {
            if sent.len() >= limit {
                return Err(MailError::Transport("relay rejected message".to_string()));
            }
        }
        sent.push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<MemoryCandidateRepository>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let repository = Arc::new(MemoryCandidateRepository::default());
        let mailer = Arc::new(mailer);
        let state = AppState {
            candidates: repository.clone(),
            mailer: mailer.clone(),
            templates: Arc::new(TemplateCatalog::builtin()),
        };
        Self {
            router: build_router(state),
            repository,
            mailer,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.request(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Adds a candidate through the public endpoint and returns its stored record.
    pub async fn add(&self, name: &str, email: &str, year: i32, round: &str) -> Candidate {
        let response = self
            .post_json(
                "/add_candidate",
                serde_json::json!({ "name": name, "email": email, "year": year, "round": round }),
            )
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        self.repository
            .all()
            .into_iter()
            .find(|c| c.email == email)
            .expect("candidate stored")
    }
}

pub async fn read_body(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable")
        .to_vec()
}

pub async fn read_json_body(response: Response<Body>) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}
