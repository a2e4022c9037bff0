use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::app::Result;
use crate::archive;
use crate::domain::{FetchTask, ResourceMetadata};
use crate::fetcher::{BodyStream, FetchOutcome, Fetcher};
use crate::store::MetadataStore;

pub const DEFAULT_WORKERS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    Unchanged,
    Downloaded { path: PathBuf, bytes: u64 },
    Failed,
}

/// Counters for one run, or for the share of a run one worker handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub unchanged: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn record(&mut self, result: &TaskResult) {
        match result {
            TaskResult::Unchanged => self.unchanged += 1,
            TaskResult::Downloaded { .. } => self.downloaded += 1,
            TaskResult::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: RunReport) {
        self.unchanged += other.unchanged;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.downloaded + self.failed
    }

    pub fn had_failure(&self) -> bool {
        self.failed > 0
    }
}

/// Fixed set of workers draining a bounded task queue.
pub struct WorkerPool {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every task and return once all workers have drained the queue.
    ///
    /// Successful downloads are recorded in `store`; failures are logged and
    /// counted in the returned report without stopping other tasks.
    pub async fn run_all(
        &self,
        tasks: Vec<FetchTask>,
        store: Arc<MetadataStore>,
        date: NaiveDate,
    ) -> RunReport {
        let (sender, receiver) = mpsc::channel::<FetchTask>(self.workers);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(worker_loop(
                id,
                self.fetcher.clone(),
                receiver.clone(),
                store.clone(),
                date,
            ));
        }

        let mut report = RunReport::default();

        for task in tasks {
            if let Err(mpsc::error::SendError(task)) = sender.send(task).await {
                tracing::error!(url = %task.url, "No worker left to process task");
                report.failed += 1;
            }
        }
        drop(sender);

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => {
                    // the task it was holding is lost
                    tracing::error!("Worker join error: {}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

async fn worker_loop(
    id: usize,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    receiver: Arc<Mutex<mpsc::Receiver<FetchTask>>>,
    store: Arc<MetadataStore>,
    date: NaiveDate,
) -> RunReport {
    let mut report = RunReport::default();

    loop {
        let next = receiver.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        let result = process_task(fetcher.as_ref(), &store, &task, date).await;
        report.record(&result);
    }

    tracing::debug!(worker = id, handled = report.total(), "Worker finished");
    report
}

pub async fn process_task(
    fetcher: &(dyn Fetcher + Send + Sync),
    store: &MetadataStore,
    task: &FetchTask,
    date: NaiveDate,
) -> TaskResult {
    tracing::info!(url = %task.url, "Checking");

    let prior = store.get(&task.url);

    match fetcher.fetch(&task.url, &prior).await {
        FetchOutcome::Unchanged => {
            tracing::info!(url = %task.url, "Not modified");
            TaskResult::Unchanged
        }
        FetchOutcome::Fetched { body, metadata } => {
            match save(task, body, &metadata, date).await {
                Ok((path, bytes)) => {
                    store.set(&task.url, metadata);
                    tracing::info!(url = %task.url, path = %path.display(), bytes, "Downloaded");
                    TaskResult::Downloaded { path, bytes }
                }
                Err(e) => {
                    tracing::error!(url = %task.url, error = %e, "Error saving download");
                    TaskResult::Failed
                }
            }
        }
        FetchOutcome::Failed { cause } => {
            tracing::error!(url = %task.url, error = %cause, "Error fetching");
            TaskResult::Failed
        }
    }
}

async fn save(
    task: &FetchTask,
    body: BodyStream,
    metadata: &ResourceMetadata,
    date: NaiveDate,
) -> Result<(PathBuf, u64)> {
    let path = archive::archive_path(&task.directory, &task.url, date)?;
    let bytes = archive::write_atomically(
        &task.directory,
        &path,
        body,
        metadata.last_modified.as_deref(),
    )
    .await?;
    Ok((path, bytes))
}
