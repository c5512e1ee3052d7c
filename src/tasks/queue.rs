//! In-process job queue. Jobs are fire-and-forget: no retries, no result
//! reporting beyond the log.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::store::Store;
use crate::tasks::{notify, outcome};
use crate::utils::email::MailTransport;

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    NotifyForUpdates,
    SendOutcome { score: f64, assignment_id: i64 },
}

#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl TaskQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, job: Job) {
        if let Err(e) = self.sender.send(job) {
            tracing::warn!(job = ?e.0, "job queue closed, dropping job");
        }
    }
}

/// Everything a job needs to run.
#[derive(Clone)]
pub struct TaskContext {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn MailTransport>,
    pub http: reqwest::Client,
    pub mail_from: String,
}

pub async fn run_job(ctx: &TaskContext, job: Job) {
    match job {
        Job::NotifyForUpdates => {
            if let Err(e) =
                notify::notify_for_updates(ctx.store.as_ref(), ctx.mailer.as_ref(), &ctx.mail_from)
                    .await
            {
                tracing::error!(error = %e, "notify_for_updates failed");
            }
        }
        Job::SendOutcome {
            score,
            assignment_id,
        } => {
            if let Err(e) =
                outcome::send_outcome(ctx.store.as_ref(), &ctx.http, score, assignment_id).await
            {
                tracing::error!(assignment_id, error = ?e, "send_outcome failed");
            }
        }
    }
}

/// Pulls jobs until every `TaskQueue` is dropped, running at most
/// `concurrency` of them at once.
pub fn spawn_worker(
    mut receiver: mpsc::UnboundedReceiver<Job>,
    ctx: TaskContext,
    concurrency: usize,
) -> JoinHandle<()> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let ctx = ctx.clone();
            tokio::spawn(async move {
                tracing::debug!(job = ?job, "running job");
                run_job(&ctx, job).await;
                drop(permit);
            });
        }
        tracing::info!("job queue closed, worker exiting");
    })
}

/// Enqueues the update sweep every `every`, starting after one period.
pub fn spawn_notify_schedule(queue: TaskQueue, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            queue.enqueue(Job::NotifyForUpdates);
        }
    })
}
