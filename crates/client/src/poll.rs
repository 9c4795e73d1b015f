//! Poll sessions: one cancellable timer task per observed job.
//!
//! A session calls `GET /jobs/{id}` on a fixed interval and emits events
//! until the job reaches a terminal status, the status call fails, or the
//! owner cancels. Status checks are strictly sequential: the loop awaits
//! each call before the next tick is polled, and missed ticks are skipped
//! rather than replayed, so a slow call never produces a burst of
//! out-of-order snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use flowbase_core::job::Job;

use crate::api::JobApiClient;

/// Default interval between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Events emitted by a poll session, in order.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A fresh status snapshot (emitted for terminal snapshots too, just
    /// before [`PollEvent::Terminal`]).
    Status(Job),
    /// The job reached `done` or `failed`; the session has stopped.
    Terminal(Job),
    /// A status call failed; the session has stopped. Not an error value:
    /// the owner resets to idle without surfacing it.
    Aborted {
        job_id: String,
    },
}

/// Cancel handle for a running poll session.
///
/// Cancelling guarantees zero further status calls for the session's job id;
/// a session that already stopped (terminal or aborted) is unaffected.
pub struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// The job this session observes.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop the session's timer deterministically.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the session task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Spawn a poll session for `job_id`.
///
/// Events arrive on `events`; the session stops on terminal status, on a
/// failed status call, when the receiver is dropped, or when the returned
/// handle is cancelled.
pub fn spawn(
    client: Arc<JobApiClient>,
    job_id: String,
    period: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(
        client,
        job_id.clone(),
        period,
        events,
        cancel.clone(),
    ));

    PollHandle {
        job_id,
        cancel,
        task,
    }
}

async fn run(
    client: Arc<JobApiClient>,
    job_id: String,
    period: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    // If a status call outlasts the period, skip the stacked ticks instead
    // of firing them back-to-back.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // An interval's first tick completes immediately; consume it so the
    // first status check happens one full period after spawn, matching a
    // plain repeating timer.
    ticker.tick().await;

    tracing::debug!(job_id, period_ms = period.as_millis() as u64, "Poll session started");

    loop {
        // Biased: a cancellation that ties with a due tick always wins, so
        // cancelling guarantees no further status calls even at the tick
        // boundary.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(job_id, "Poll session cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        match client.get_job(&job_id).await {
            Ok(job) => {
                let terminal = job.status.is_terminal();
                if events.send(PollEvent::Status(job.clone())).is_err() {
                    // Owner dropped the receiver; nothing left to notify.
                    return;
                }
                if terminal {
                    tracing::debug!(job_id, status = %job.status, "Poll session reached terminal status");
                    let _ = events.send(PollEvent::Terminal(job));
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(job_id, error = %err, "Status poll failed, ending session");
                let _ = events.send(PollEvent::Aborted {
                    job_id: job_id.clone(),
                });
                return;
            }
        }
    }
}
