use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::domain::JobStatus;
use super::fanout::{FanoutDispatcher, FanoutReport};
use super::store::{JobStore, NotificationSink, StoreError, StudentDirectory};

const DEFAULT_TICK_TIMEOUT: Duration = Duration::from_secs(30);

/// Periodically compares scheduled publish times against the clock and moves
/// due postings from `PendingPublish` to `Open`, fanning each one out.
///
/// Any number of reconcilers may run against the same store: the conditional
/// status transition is the sole synchronization point, so a racing reconciler
/// that loses the compare-and-set simply skips the job.
pub struct LifecycleReconciler<S, D, N> {
    store: Arc<S>,
    dispatcher: FanoutDispatcher<D, N>,
    tick_timeout: Duration,
}

/// Summary of a single reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// Pending jobs whose publish time had arrived.
    pub due: usize,
    /// Jobs this reconciler transitioned and fanned out.
    pub published: usize,
    /// Due jobs claimed by a competing reconciler first.
    pub lost_races: usize,
    pub fanouts: Vec<FanoutReport>,
    /// Per-job store failures; the tick continues past them.
    pub errors: Vec<String>,
}

impl<S, D, N> LifecycleReconciler<S, D, N>
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: FanoutDispatcher<D, N>) -> Self {
        Self {
            store,
            dispatcher,
            tick_timeout: DEFAULT_TICK_TIMEOUT,
        }
    }

    pub fn with_tick_timeout(mut self, tick_timeout: Duration) -> Self {
        self.tick_timeout = tick_timeout;
        self
    }

    /// Run one reconciliation pass against the given clock reading. Errors on
    /// individual jobs are collected; only a failed pending-jobs query aborts
    /// the tick.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport, StoreError> {
        let pending = self.store.by_status(JobStatus::PendingPublish)?;

        let mut report = TickReport {
            due: 0,
            published: 0,
            lost_races: 0,
            fanouts: Vec::new(),
            errors: Vec::new(),
        };

        for job in pending {
            let due_at = match job.schedule.scheduled_publish_at {
                Some(at) => at,
                None => {
                    // Should be unreachable: creation rejects scheduled postings
                    // without a date. Skip rather than guess.
                    warn!(job = %job.id, "pending posting has no publish date");
                    continue;
                }
            };
            if due_at > now {
                continue;
            }
            report.due += 1;

            let claimed =
                match self
                    .store
                    .transition(&job.id, JobStatus::PendingPublish, JobStatus::Open)
                {
                    Ok(claimed) => claimed,
                    Err(err) => {
                        report.errors.push(format!("{}: {err}", job.id));
                        continue;
                    }
                };
            if !claimed {
                debug!(job = %job.id, "posting already claimed by another reconciler");
                report.lost_races += 1;
                continue;
            }

            if let Err(err) = self.store.mark_published(&job.id, now) {
                // Status already flipped; the posting is live even if the
                // publish timestamp write failed.
                report.errors.push(format!("{}: {err}", job.id));
            }

            // Re-read after the claim so fan-out sees any edits that landed
            // while the posting was pending, not the tick-start snapshot.
            let opened = match self.store.fetch(&job.id) {
                Ok(Some(stored)) => stored,
                Ok(None) => {
                    report.errors.push(format!("{}: missing after claim", job.id));
                    report.published += 1;
                    continue;
                }
                Err(err) => {
                    report.errors.push(format!("{}: {err}", job.id));
                    report.published += 1;
                    continue;
                }
            };

            match self.dispatcher.dispatch(&opened, now).await {
                Ok(fanout) => {
                    info!(
                        job = %opened.id,
                        eligible = fanout.eligible,
                        delivered = fanout.delivered,
                        failed = fanout.failures.len(),
                        "scheduled posting published"
                    );
                    report.fanouts.push(fanout);
                }
                Err(err) => report.errors.push(format!("{}: {err}", job.id)),
            }
            report.published += 1;
        }

        Ok(report)
    }

    /// Single owned background loop. A failed or timed-out tick is logged and
    /// retried on the next interval; this task never gives up.
    pub async fn run(self, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match tokio::time::timeout(self.tick_timeout, self.run_tick(Utc::now())).await {
                Ok(Ok(report)) => {
                    if report.published > 0 || !report.errors.is_empty() {
                        info!(
                            published = report.published,
                            lost_races = report.lost_races,
                            errors = report.errors.len(),
                            "reconciliation tick complete"
                        );
                    } else {
                        debug!("reconciliation tick found nothing due");
                    }
                }
                Ok(Err(err)) => warn!(error = %err, "reconciliation tick failed; will retry"),
                Err(_) => warn!("reconciliation tick timed out; will retry"),
            }
        }
    }
}
