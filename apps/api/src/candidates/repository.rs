//! Candidate persistence.
//!
//! `AppState` carries an `Arc<dyn CandidateRepository>`; production uses
//! `PgCandidateRepository`, tests swap in an in-memory store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::candidate::{
    Candidate, CandidateFilter, CandidateRow, CandidateStatus, NewCandidate,
};

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Inserts a candidate with status `pending`.
    /// Fails with `AppError::DuplicateEmail` without inserting if the email is taken.
    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, AppError>;

    async fn list(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError>;

    async fn get(&self, id: i32) -> Result<Option<Candidate>, AppError>;

    /// Returns `None` if no candidate has this id.
    async fn update_status(
        &self,
        id: i32,
        status: CandidateStatus,
    ) -> Result<Option<Candidate>, AppError>;

    /// Returns `false` if no candidate has this id.
    async fn delete(&self, id: i32) -> Result<bool, AppError>;

    /// Round-trips the backing store.
    async fn ping(&self) -> Result<(), AppError>;
}

const SELECT_COLUMNS: &str = "SELECT id, name, email, status, year, round FROM candidates";

/// PostgreSQL-backed repository over the `candidates` table.
#[derive(Clone)]
pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_candidate(row: CandidateRow) -> Result<Candidate, AppError> {
    Candidate::try_from(row).map_err(|e| AppError::Internal(e.into()))
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, AppError> {
        let result = sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates (name, email, status, year, round)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, status, year, round
            "#,
        )
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(CandidateStatus::Pending.as_str())
        .bind(candidate.year)
        .bind(&candidate.round)
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(AppError::DuplicateEmail(candidate.email));
            }
            Err(e) => return Err(e.into()),
        };

        info!("Inserted candidate {} ({})", row.id, row.email);
        to_candidate(row)
    }

    async fn list(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError> {
        let query = format!(
            r#"{SELECT_COLUMNS}
            WHERE ($1::INT IS NULL OR year = $1)
              AND ($2::TEXT IS NULL OR round = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY id"#
        );
        let rows = sqlx::query_as::<_, CandidateRow>(&query)
            .bind(filter.year)
            .bind(filter.round.as_deref())
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        debug!("Listed {} candidates for {:?}", rows.len(), filter);
        rows.into_iter().map(to_candidate).collect()
    }

    async fn get(&self, id: i32) -> Result<Option<Candidate>, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(to_candidate).transpose()
    }

    async fn update_status(
        &self,
        id: i32,
        status: CandidateStatus,
    ) -> Result<Option<Candidate>, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates SET status = $1
            WHERE id = $2
            RETURNING id, name, email, status, year, round
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            info!("Candidate {id} status set to {status}");
        }
        row.map(to_candidate).transpose()
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted candidate {id}");
        }
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
