//! Job Tracker
//!
//! Accepts units of work, runs them on the Tokio worker pool and records
//! their outcome in two concurrent maps: job status and artifact location.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{ArtifactError, JobError};
use crate::jobs::{JobId, JobStatus};

// == Job Context ==
/// Handle given to a running unit of work.
#[derive(Debug, Clone)]
pub struct JobContext {
    id: JobId,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Token cancelled when the tracker shuts down.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sleeps for `duration`, returning `JobError::Cancelled` if the job is
    /// cancelled first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), JobError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(JobError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

// == Job Tracker ==
/// Tracks asynchronous jobs. Cheap to clone; clones share state.
///
/// Work is spawned directly onto the runtime, so the queue is unbounded and
/// every submission gets its own task.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    statuses: DashMap<JobId, JobStatus>,
    artifacts: DashMap<JobId, PathBuf>,
    shutdown: CancellationToken,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Submit ==
    /// Records a new job as `IN_PROGRESS`, spawns `work`, and returns its id
    /// without waiting.
    ///
    /// `work` runs at most once and is never retried. On `Ok(path)` the
    /// artifact path is stored and the job becomes `READY`; on any error,
    /// panic or cancellation it becomes `FAILED`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit<F, Fut>(&self, work: F) -> JobId
    where
        F: FnOnce(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<PathBuf, JobError>> + Send + 'static,
    {
        let id = JobId::new();
        self.inner.statuses.insert(id, JobStatus::InProgress);

        let ctx = JobContext {
            id,
            cancel: self.inner.shutdown.child_token(),
        };
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            // Run the work in its own task so a panic surfaces as a JoinError
            // here instead of taking the status update down with it.
            let outcome = match tokio::spawn(async move { work(ctx).await }).await {
                Ok(result) => result,
                Err(err) => Err(JobError::Panicked(err.to_string())),
            };
            inner.complete(id, outcome);
        });

        info!(job_id = %id, "Job submitted");
        id
    }

    // == Status ==
    /// Current status of `id`; `NOT_FOUND` for ids never submitted.
    pub fn status(&self, id: JobId) -> JobStatus {
        self.inner
            .statuses
            .get(&id)
            .map(|status| *status)
            .unwrap_or(JobStatus::NotFound)
    }

    // == Fetch Artifact ==
    /// Reads the artifact of a `READY` job.
    ///
    /// Never waits for the job to finish: any other status is reported as
    /// [`ArtifactError::NotReady`].
    pub async fn fetch_artifact(&self, id: JobId) -> Result<Vec<u8>, ArtifactError> {
        if self.status(id) != JobStatus::Ready {
            return Err(ArtifactError::NotReady(id));
        }

        let path = self
            .inner
            .artifacts
            .get(&id)
            .map(|path| path.clone())
            .ok_or(ArtifactError::NotReady(id))?;

        Ok(tokio::fs::read(&path).await?)
    }

    /// Location of a `READY` job's artifact.
    pub fn artifact_path(&self, id: JobId) -> Option<PathBuf> {
        self.inner.artifacts.get(&id).map(|path| path.clone())
    }

    /// Cancels every running job. Jobs that observe the signal end `FAILED`.
    pub fn shutdown(&self) {
        info!("Cancelling in-flight jobs");
        self.inner.shutdown.cancel();
    }

    /// Number of jobs ever submitted.
    pub fn len(&self) -> usize {
        self.inner.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.statuses.is_empty()
    }
}

impl TrackerInner {
    /// Records the single terminal transition of job `id`.
    fn complete(&self, id: JobId, outcome: Result<PathBuf, JobError>) {
        match outcome {
            Ok(path) => {
                // Path first, so a reader that sees READY always finds it.
                self.artifacts.insert(id, path.clone());
                self.statuses.insert(id, JobStatus::Ready);
                info!(job_id = %id, artifact = %path.display(), "Job ready");
            }
            Err(JobError::Cancelled) => {
                self.statuses.insert(id, JobStatus::Failed);
                warn!(job_id = %id, "Job cancelled");
            }
            Err(err @ JobError::NoSourceFiles { .. }) => {
                self.statuses.insert(id, JobStatus::Failed);
                warn!(job_id = %id, error = %err, "Job failed");
            }
            Err(err) => {
                self.statuses.insert(id, JobStatus::Failed);
                error!(job_id = %id, error = %err, "Job failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    async fn wait_terminal(tracker: &JobTracker, id: JobId) -> JobStatus {
        for _ in 0..200 {
            let status = tracker.status(id);
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let tracker = JobTracker::new();
        assert_eq!(tracker.status(JobId::new()), JobStatus::NotFound);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_submit_returns_before_work_finishes() {
        let tracker = JobTracker::new();
        let gate = CancellationToken::new();
        let release = gate.clone();

        let id = tracker.submit(move |_| async move {
            gate.cancelled().await;
            Err(JobError::Cancelled)
        });

        assert_eq!(tracker.status(id), JobStatus::InProgress);
        assert!(matches!(
            tracker.fetch_artifact(id).await,
            Err(ArtifactError::NotReady(_))
        ));

        release.cancel();
        assert_eq!(wait_terminal(&tracker, id).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_successful_job_exposes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.log");
        let tracker = JobTracker::new();

        let target = path.clone();
        let id = tracker.submit(move |_| async move {
            tokio::fs::write(&target, b"merged").await?;
            Ok(target)
        });

        assert_eq!(wait_terminal(&tracker, id).await, JobStatus::Ready);
        assert_eq!(tracker.artifact_path(id), Some(path));
        assert_eq!(tracker.fetch_artifact(id).await.unwrap(), b"merged");
    }

    #[tokio::test]
    async fn test_failed_job_has_no_artifact() {
        let tracker = JobTracker::new();

        let id = tracker.submit(|_| async {
            Err(JobError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")))
        });

        assert_eq!(wait_terminal(&tracker, id).await, JobStatus::Failed);
        assert!(tracker.artifact_path(id).is_none());
        assert!(matches!(
            tracker.fetch_artifact(id).await,
            Err(ArtifactError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_panicking_job_is_marked_failed() {
        let tracker = JobTracker::new();

        let id = tracker.submit(|_| async {
            if true {
                panic!("boom");
            }
            Ok(PathBuf::new())
        });

        assert_eq!(wait_terminal(&tracker, id).await, JobStatus::Failed);

        // The pool keeps serving later jobs
        let next = tracker.submit(|_| async { Err(JobError::Cancelled) });
        assert_eq!(wait_terminal(&tracker, next).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_sleeping_jobs() {
        let tracker = JobTracker::new();

        let id = tracker.submit(|ctx| async move {
            ctx.sleep(Duration::from_secs(3600)).await?;
            Ok(PathBuf::new())
        });

        tracker.shutdown();

        assert_eq!(wait_terminal(&tracker, id).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_fetch_artifact_reports_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-written.log");
        let tracker = JobTracker::new();

        let id = tracker.submit(move |_| async move { Ok(missing) });

        assert_eq!(wait_terminal(&tracker, id).await, JobStatus::Ready);
        assert!(matches!(
            tracker.fetch_artifact(id).await,
            Err(ArtifactError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_jobs_are_tracked_independently() {
        let tracker = JobTracker::new();

        let ids: Vec<_> = (0..10)
            .map(|i| {
                tracker.submit(move |ctx| async move {
                    ctx.sleep(Duration::from_millis(5 * i)).await?;
                    if i % 2 == 0 {
                        Ok(PathBuf::from(format!("job-{i}.log")))
                    } else {
                        Err(JobError::Cancelled)
                    }
                })
            })
            .collect();

        assert_eq!(tracker.len(), 10);
        for (i, id) in ids.into_iter().enumerate() {
            let expected = if i % 2 == 0 {
                JobStatus::Ready
            } else {
                JobStatus::Failed
            };
            assert_eq!(wait_terminal(&tracker, id).await, expected);
        }
    }
}
