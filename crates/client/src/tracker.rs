//! The job lifecycle controller backing a list view.
//!
//! Drives `Idle -> Uploading -> Polling -> Terminal`, with terminal states
//! folding back to `Idle` once the job list has been refreshed. Enforces the
//! session invariant: at most one live poll timer per job, and starting a
//! new upload supersedes any prior session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use flowbase_core::job::{Job, JobList, JobStatus, RetryAccepted};

use crate::api::{ApiError, JobApiClient, ListJobsQuery};
use crate::poll::{self, PollEvent, PollHandle};

/// Page size used when refreshing the job list.
const DEFAULT_LIST_LIMIT: i64 = 20;

/// Errors from the tracker layer.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Uploads are disabled until the in-flight upload resolves.
    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Observable controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    Idle,
    Uploading,
    Polling {
        job_id: String,
        last_status: JobStatus,
    },
    /// Transient: set when a terminal snapshot arrives, folded back to
    /// [`Idle`](TrackerState::Idle) once the list refresh completes.
    Terminal {
        job: Job,
    },
}

/// Events delivered to the owning view.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Upload accepted; polling has started with this initial snapshot.
    Uploaded(Job),
    /// A status snapshot observed while polling.
    Status(Job),
    /// The watched job reached a terminal status. `jobs` is the refreshed
    /// list (refetched exactly once; empty on refresh failure, mirroring the
    /// view's silent fallback).
    Finished {
        job: Job,
        jobs: JobList,
    },
    /// The poll session ended on a failed status call. No error is
    /// surfaced; the controller is back to idle.
    Reset {
        job_id: String,
    },
}

struct Inner {
    client: Arc<JobApiClient>,
    poll_interval: Duration,
    state: Mutex<TrackerState>,
    session: Mutex<Option<PollHandle>>,
    /// Bumped by every `watch`; a driver only acts while its generation is
    /// current, so a superseded session can never clobber tracker state.
    generation: AtomicU64,
    events: mpsc::UnboundedSender<TrackerEvent>,
}

impl Inner {
    fn set_state(&self, state: TrackerState) {
        *self.state.lock().expect("tracker state lock poisoned") = state;
    }
}

/// Per-view job lifecycle controller.
pub struct JobTracker {
    inner: Arc<Inner>,
}

impl JobTracker {
    /// Create a tracker and the event stream its owner consumes.
    pub fn new(
        client: Arc<JobApiClient>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            client,
            poll_interval,
            state: Mutex::new(TrackerState::Idle),
            session: Mutex::new(None),
            generation: AtomicU64::new(0),
            events,
        });
        (Self { inner }, receiver)
    }

    /// Current controller state.
    pub fn state(&self) -> TrackerState {
        self.inner
            .state
            .lock()
            .expect("tracker state lock poisoned")
            .clone()
    }

    /// Upload a spreadsheet and start observing the created job.
    ///
    /// Further uploads are rejected until this one resolves. On success the
    /// returned job's id and initial status seed the poll session; on
    /// failure the controller resets to idle and the error propagates to
    /// the caller (upload errors, unlike poll errors, are user-visible).
    pub async fn upload_and_watch(
        &self,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<Job, TrackerError> {
        {
            let mut state = self
                .inner
                .state
                .lock()
                .expect("tracker state lock poisoned");
            if matches!(*state, TrackerState::Uploading) {
                return Err(TrackerError::UploadInProgress);
            }
            *state = TrackerState::Uploading;
        }

        match self.inner.client.upload(filename, contents).await {
            Ok(job) => {
                let _ = self.inner.events.send(TrackerEvent::Uploaded(job.clone()));
                self.watch(&job.id, job.status);
                Ok(job)
            }
            Err(err) => {
                self.inner.set_state(TrackerState::Idle);
                Err(err.into())
            }
        }
    }

    /// Start (or restart) observing `job_id`.
    ///
    /// Any prior poll session is cancelled first -- at most one live timer
    /// per tracker, and per job id, at any instant.
    pub fn watch(&self, job_id: &str, initial_status: JobStatus) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(previous) = self
            .inner
            .session
            .lock()
            .expect("tracker session lock poisoned")
            .take()
        {
            tracing::debug!(job_id = previous.job_id(), "Superseding prior poll session");
            previous.cancel();
        }

        self.inner.set_state(TrackerState::Polling {
            job_id: job_id.to_string(),
            last_status: initial_status,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = poll::spawn(
            Arc::clone(&self.inner.client),
            job_id.to_string(),
            self.inner.poll_interval,
            tx,
        );
        *self
            .inner
            .session
            .lock()
            .expect("tracker session lock poisoned") = Some(handle);

        tokio::spawn(drive(Arc::clone(&self.inner), generation, rx));
    }

    /// Re-queue a failed job and refresh the list once.
    ///
    /// Does **not** resume polling -- observation after a retry is an
    /// explicit, separate action. List refresh failures degrade to an
    /// empty list, like the view's own fallback.
    pub async fn retry(&self, job_id: &str) -> Result<(RetryAccepted, JobList), ApiError> {
        let accepted = self.inner.client.retry(job_id).await?;
        let jobs = refresh_list(&self.inner.client).await;
        Ok((accepted, jobs))
    }

    /// Stop any live poll session (navigation away, logout) and reset to
    /// idle. Deterministic: no further status calls after this returns.
    pub fn cancel_watch(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(session) = self
            .inner
            .session
            .lock()
            .expect("tracker session lock poisoned")
            .take()
        {
            session.cancel();
        }
        self.inner.set_state(TrackerState::Idle);
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.cancel_watch();
    }
}

/// Forward poll events into tracker state and owner events.
async fn drive(
    inner: Arc<Inner>,
    generation: u64,
    mut rx: mpsc::UnboundedReceiver<PollEvent>,
) {
    while let Some(event) = rx.recv().await {
        if inner.generation.load(Ordering::SeqCst) != generation {
            // Superseded by a newer session; its driver owns the state now.
            return;
        }

        match event {
            PollEvent::Status(job) => {
                if !job.status.is_terminal() {
                    inner.set_state(TrackerState::Polling {
                        job_id: job.id.clone(),
                        last_status: job.status,
                    });
                }
                let _ = inner.events.send(TrackerEvent::Status(job));
            }
            PollEvent::Terminal(job) => {
                inner.set_state(TrackerState::Terminal { job: job.clone() });

                // Refetch the source of truth exactly once per session.
                let jobs = refresh_list(&inner.client).await;

                inner
                    .session
                    .lock()
                    .expect("tracker session lock poisoned")
                    .take();
                inner.set_state(TrackerState::Idle);
                let _ = inner.events.send(TrackerEvent::Finished { job, jobs });
                return;
            }
            PollEvent::Aborted { job_id } => {
                inner
                    .session
                    .lock()
                    .expect("tracker session lock poisoned")
                    .take();
                inner.set_state(TrackerState::Idle);
                let _ = inner.events.send(TrackerEvent::Reset { job_id });
                return;
            }
        }
    }
}

async fn refresh_list(client: &JobApiClient) -> JobList {
    let query = ListJobsQuery {
        limit: Some(DEFAULT_LIST_LIMIT),
        ..Default::default()
    };
    match client.list_jobs(&query).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "Job list refresh failed");
            JobList::default()
        }
    }
}
