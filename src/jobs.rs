//! In-process background work.
//!
//! Jobs are pushed onto an unbounded channel and consumed by a single tokio task
//! started with `JobQueue::start`. Enqueueing never blocks a request.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Echoes a description of the request that queued it.
    Debug { request: String },
}

#[derive(Debug)]
struct Envelope {
    id: Uuid,
    job: Job,
}

#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl JobQueue {
    /// Spawns the worker on the current tokio runtime and returns a handle to it.
    pub fn start() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(receiver));
        Self { sender }
    }

    pub fn enqueue(&self, job: Job) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.sender
            .send(Envelope { id, job })
            .map_err(|_| AppError::InternalServerError("Job worker is not running".into()))?;
        log::debug!("queued job {}", id);
        Ok(id)
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = receiver.recv().await {
        execute(envelope.id, &envelope.job);
    }
    log::info!("job worker stopped");
}

fn execute(id: Uuid, job: &Job) {
    match job {
        Job::Debug { request } => log::info!("Request: {} (job {})", request, id),
    }
}
