//! FIFO queue of resolution jobs.
//!
//! The queue and the "currently resolving" flag share one mutex, never held
//! across an await. Queueing an automatic job cancels every other automatic
//! job that has not started yet; explicit jobs always run.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

use super::job::{JobResult, ResolutionPass, ResolutionRequest, Trigger};
use crate::history::{HistoryDb, RunCounts, RunId, RunState};
use crate::resolve::ResolutionOutcome;

struct QueuedJob {
    id: u64,
    request: ResolutionRequest,
    run_id: Option<RunId>,
    reply: oneshot::Sender<JobResult>,
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<QueuedJob>,
    resolving: bool,
    next_id: u64,
}

/// Receives the result of a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    pub id: u64,
    pub run_id: Option<RunId>,
    receiver: oneshot::Receiver<JobResult>,
}

impl JobHandle {
    pub async fn wait(self) -> JobResult {
        self.receiver.await.unwrap_or(JobResult::Cancelled)
    }
}

#[derive(Default)]
pub struct ResolutionScheduler {
    state: Mutex<QueueState>,
    history: Option<HistoryDb>,
}

impl ResolutionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every job in `history`.
    pub fn with_history(history: HistoryDb) -> Self {
        Self {
            state: Mutex::default(),
            history: Some(history),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn pending(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_resolving(&self) -> bool {
        self.lock().resolving
    }

    pub async fn submit(&self, request: ResolutionRequest) -> JobHandle {
        let run_id = match &self.history {
            Some(db) => match db.add_run(request.trigger, request.force).await {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("failed to record resolution job: {e:#}");
                    None
                }
            },
            None => None,
        };

        let (tx, rx) = oneshot::channel();
        let (id, cancelled) = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            let mut cancelled = Vec::new();
            if request.trigger == Trigger::Automatic {
                let (stale, keep): (Vec<_>, Vec<_>) = state
                    .jobs
                    .drain(..)
                    .partition(|j| j.request.trigger == Trigger::Automatic);
                state.jobs = keep.into();
                cancelled = stale;
            }
            state.jobs.push_back(QueuedJob {
                id,
                request,
                run_id,
                reply: tx,
            });
            (id, cancelled)
        };

        for job in cancelled {
            tracing::debug!("automatic resolution {} superseded by {id}", job.id);
            let _ = job.reply.send(JobResult::Cancelled);
            self.record(job.run_id, RunState::Cancelled, &RunCounts::default())
                .await;
        }

        JobHandle {
            id,
            run_id,
            receiver: rx,
        }
    }

    /// Run queued jobs in FIFO order until the queue is empty. Returns the
    /// number of jobs run; 0 if another caller is already draining.
    pub async fn run_pending(&self, pass: &dyn ResolutionPass) -> usize {
        {
            let mut state = self.lock();
            if state.resolving {
                return 0;
            }
            state.resolving = true;
        }

        let mut ran = 0;
        loop {
            let next = {
                let mut state = self.lock();
                let next = state.jobs.pop_front();
                if next.is_none() {
                    state.resolving = false;
                }
                next
            };
            let Some(job) = next else {
                break;
            };

            tracing::info!(
                "starting {} resolution {}{}",
                job.request.trigger.as_str(),
                job.id,
                if job.request.force { " (forced)" } else { "" }
            );
            if let (Some(db), Some(run_id)) = (&self.history, job.run_id) {
                if let Err(e) = db.set_state(run_id, RunState::Running).await {
                    tracing::warn!("failed to update resolution job: {e:#}");
                }
            }
            let outcome = pass.resolve(job.request.force).await;
            let state = if outcome.success {
                RunState::Completed
            } else {
                RunState::Failed
            };
            self.record(job.run_id, state, &counts(&outcome)).await;
            let _ = job.reply.send(JobResult::Finished(outcome));
            ran += 1;
        }
        ran
    }

    async fn record(&self, run_id: Option<RunId>, state: RunState, counts: &RunCounts) {
        if let (Some(db), Some(run_id)) = (&self.history, run_id) {
            if let Err(e) = db.finish_run(run_id, state, counts).await {
                tracing::warn!("failed to record resolution result: {e:#}");
            }
        }
    }
}

fn counts(outcome: &ResolutionOutcome) -> RunCounts {
    RunCounts {
        copied: outcome.copied.len() as i64,
        missing: outcome.missing.len() as i64,
        error: outcome.error.as_ref().map(|e| e.to_string()),
    }
}
