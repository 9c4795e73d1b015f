//! Job snapshots as reported by the conversion backend.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a conversion job.
///
/// Status is monotonic within a job's lifetime: once a job reaches a
/// terminal status ([`Done`](JobStatus::Done) or [`Failed`](JobStatus::Failed))
/// it never transitions again. The one exception is the explicit user-driven
/// retry, which the backend models as a brand-new pass through `queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// Whether no further transitions are expected for this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// The wire representation (`queued`, `processing`, `done`, `failed`).
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, thiserror::Error)]
#[error("Unknown job status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// One server-tracked conversion job.
///
/// Created by the backend on upload and mutated only by the backend; the
/// client reads snapshots. Identity is the opaque `id`. The backend includes
/// extra bookkeeping fields (`output_csv_path`, `updated_at`, ...) on some
/// endpoints; unknown fields are deliberately tolerated and dropped.
///
/// `created_at` is the backend's naive UTC `isoformat()` timestamp -- it
/// carries no offset, hence [`NaiveDateTime`] rather than `DateTime<Utc>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub filename_original: String,
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Response shape of `GET /jobs`.
///
/// The backend also echoes `limit` and `offset`; they are derivable from the
/// request and ignored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobList {
    pub total: i64,
    pub jobs: Vec<Job>,
}

/// Response shape of `POST /jobs/{id}/retry` (HTTP 202).
///
/// The job is re-queued server-side; observing its progress is a separate,
/// explicit action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryAccepted {
    pub id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
