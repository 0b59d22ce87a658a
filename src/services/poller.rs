use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::task::{OutputFormat, Task, TaskStatus};
use crate::services::client::{ApiError, ConvertBackend};
use crate::services::registry::TaskRegistry;
use crate::services::validation::{self, UploadError};

/// Keeps the task registry eventually consistent with backend state and
/// publishes one registry snapshot per completed tick.
///
/// Within a tick, per-task status reads run concurrently; they are idempotent
/// and order-independent, so a slow task never blocks the others. Ticks
/// themselves are serialized: a tick that outlives the interval delays the
/// next one instead of stacking. Every record is replaced atomically through
/// the registry, so a refresh resolving after `stop_polling` just writes the
/// freshest known state one final time.
pub struct StatusPoller<B> {
    backend: Arc<B>,
    registry: Arc<RwLock<TaskRegistry>>,
    max_upload_bytes: u64,
    snapshot_tx: watch::Sender<Vec<Task>>,
    poll_loop: Mutex<Option<PollLoop>>,
}

struct PollLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl<B: ConvertBackend + 'static> StatusPoller<B> {
    pub fn new(backend: B, max_upload_bytes: u64) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            backend: Arc::new(backend),
            registry: Arc::new(RwLock::new(TaskRegistry::new())),
            max_upload_bytes,
            snapshot_tx,
            poll_loop: Mutex::new(None),
        }
    }

    /// Receiver of per-tick registry snapshots, in insertion order. This is
    /// the boundary a renderer consumes; the poller itself never draws.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.snapshot_tx.subscribe()
    }

    /// Validate a file locally, send it for conversion and start tracking
    /// the returned task id as pending. Any failure is surfaced to the
    /// caller and leaves the registry untouched.
    pub async fn submit(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        format: OutputFormat,
    ) -> Result<Uuid, SubmissionError> {
        validation::validate_upload(filename, &bytes, self.max_upload_bytes)?;

        let task_id = self.backend.submit(filename, bytes, format).await?;

        self.registry.write().await.insert(Task::pending(task_id));

        metrics::counter!("conversion_tasks_submitted_total").increment(1);
        tracing::info!(task_id = %task_id, format = %format, "conversion task submitted");

        publish_snapshot(&self.registry, &self.snapshot_tx).await;
        Ok(task_id)
    }

    /// Refresh one task. A fetch failure is transient by design: log it,
    /// keep the last known record and let the next tick retry. A response
    /// for an id the registry does not track is discarded.
    pub async fn refresh(&self, task_id: Uuid) {
        refresh_task(self.backend.as_ref(), &self.registry, task_id).await;
    }

    /// One tick: refresh every task known at tick start concurrently, wait
    /// for all of them to settle, then publish a single snapshot, so
    /// subscribers see one atomic update per tick.
    pub async fn refresh_all(&self) {
        run_tick(self.backend.as_ref(), &self.registry, &self.snapshot_tx).await;
    }

    /// Begin the periodic refresh loop. Ignored when a loop is already live.
    pub fn start_polling(&self, interval: Duration) {
        let mut poll_loop = self.poll_loop.lock().expect("poll loop lock poisoned");
        if let Some(existing) = poll_loop.as_ref() {
            if !existing.handle.is_finished() {
                tracing::debug!("polling already active, ignoring start request");
                return;
            }
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let backend = Arc::clone(&self.backend);
        let registry = Arc::clone(&self.registry);
        let snapshot_tx = self.snapshot_tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_tick(backend.as_ref(), &registry, &snapshot_tx).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::debug!("polling loop exited");
        });

        *poll_loop = Some(PollLoop {
            shutdown: shutdown_tx,
            handle,
        });
        tracing::info!(interval_ms = interval.as_millis() as u64, "status polling started");
    }

    /// Suppress all future ticks. Safe to call at any time, including with a
    /// tick in flight: that tick finishes, may update the registry once more
    /// and publish a final snapshot, then the loop exits.
    pub fn stop_polling(&self) {
        let taken = self.poll_loop.lock().expect("poll loop lock poisoned").take();
        if let Some(poll_loop) = taken {
            let _ = poll_loop.shutdown.send(true);
            tracing::info!("status polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_loop
            .lock()
            .expect("poll loop lock poisoned")
            .as_ref()
            .is_some_and(|poll_loop| !poll_loop.handle.is_finished())
    }

    /// Current view of one task, if tracked.
    pub async fn task(&self, task_id: Uuid) -> Option<Task> {
        self.registry.read().await.get(&task_id).cloned()
    }

    /// Current view of every tracked task, in insertion order.
    pub async fn tasks(&self) -> Vec<Task> {
        self.registry.read().await.snapshot()
    }

    /// Fetch the converted model. Gated on the registry: the download only
    /// becomes available once a refresh has reported the task completed.
    pub async fn download(&self, task_id: Uuid) -> Result<Vec<u8>, DownloadError> {
        let status = self.registry.read().await.get(&task_id).map(|t| t.status);

        match status {
            None => Err(DownloadError::UnknownTask(task_id)),
            Some(status) if status != TaskStatus::Completed => {
                Err(DownloadError::NotReady { task_id, status })
            }
            Some(_) => Ok(self.backend.download(task_id).await?),
        }
    }
}

impl<B> Drop for StatusPoller<B> {
    fn drop(&mut self) {
        // Page-session semantics: dropping the poller ends the loop.
        if let Ok(poll_loop) = self.poll_loop.get_mut() {
            if let Some(poll_loop) = poll_loop.take() {
                let _ = poll_loop.shutdown.send(true);
            }
        }
    }
}

async fn refresh_task<B: ConvertBackend>(
    backend: &B,
    registry: &RwLock<TaskRegistry>,
    task_id: Uuid,
) {
    match backend.fetch_status(task_id).await {
        Ok(task) => {
            let replaced = registry.write().await.replace(task);
            if !replaced {
                tracing::debug!(task_id = %task_id, "discarding status for untracked task");
            }
        }
        Err(error) => {
            metrics::counter!("conversion_task_refresh_failures_total").increment(1);
            tracing::warn!(
                task_id = %task_id,
                error = %error,
                "status refresh failed, keeping last known state"
            );
        }
    }
}

async fn run_tick<B: ConvertBackend>(
    backend: &B,
    registry: &RwLock<TaskRegistry>,
    snapshot_tx: &watch::Sender<Vec<Task>>,
) {
    let ids = registry.read().await.ids();
    join_all(ids.into_iter().map(|id| refresh_task(backend, registry, id))).await;

    metrics::counter!("conversion_poll_ticks_total").increment(1);
    publish_snapshot(registry, snapshot_tx).await;
}

async fn publish_snapshot(
    registry: &RwLock<TaskRegistry>,
    snapshot_tx: &watch::Sender<Vec<Task>>,
) {
    let snapshot = registry.read().await.snapshot();
    snapshot_tx.send_replace(snapshot);
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] UploadError),

    #[error("conversion backend rejected the submission: {0}")]
    Backend(#[from] ApiError),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("task {0} is not tracked by this session")]
    UnknownTask(Uuid),

    #[error("task {task_id} is {status}, model not ready for download")]
    NotReady { task_id: Uuid, status: TaskStatus },

    #[error("download failed: {0}")]
    Backend(#[from] ApiError),
}
