use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// A candidate's current disposition in the hiring pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    #[default]
    Pending,
    Selected,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Selected => "selected",
            CandidateStatus::Rejected => "rejected",
        }
    }

    /// Statuses a candidate may be moved to through the update endpoint.
    pub fn is_decision(&self) -> bool {
        matches!(self, CandidateStatus::Selected | CandidateStatus::Rejected)
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown candidate status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for CandidateStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CandidateStatus::Pending),
            "selected" => Ok(CandidateStatus::Selected),
            "rejected" => Ok(CandidateStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A tracked candidate as exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub status: CandidateStatus,
    pub year: i32,
    pub round: String,
}

/// Raw `candidates` row; `status` is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub status: String,
    pub year: i32,
    pub round: String,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = UnknownStatus;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(Candidate {
            id: row.id,
            status: row.status.parse()?,
            name: row.name,
            email: row.email,
            year: row.year,
            round: row.round,
        })
    }
}

/// Fields required to register a candidate. Status always starts as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub year: i32,
    pub round: String,
}

/// Conjunctive filter over candidates. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub year: Option<i32>,
    pub round: Option<String>,
    pub status: Option<CandidateStatus>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.year.map_or(true, |y| candidate.year == y)
            && self.round.as_deref().map_or(true, |r| candidate.round == r)
            && self.status.map_or(true, |s| candidate.status == s)
    }
}
