//! Log Service
//!
//! Daily log files live in one directory and are named
//! `<prefix>-<yyyy-MM-dd>.log`. Period aggregation runs as a tracked job and
//! writes `log_period_<job id>.log` next to them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{AppError, JobError, Result};
use crate::jobs::{JobContext, JobId, JobStatus, JobTracker};
use crate::logs::DATE_FORMAT;

/// File name of the log written for `date`.
pub fn daily_log_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.log", prefix, date.format(DATE_FORMAT))
}

// == Log Service ==
#[derive(Debug, Clone)]
pub struct LogService {
    /// Directory holding daily logs and generated artifacts
    dir: PathBuf,
    /// Daily log file name prefix
    prefix: String,
    /// Throttle applied before each aggregation starts scanning
    delay: Duration,
    tracker: JobTracker,
}

impl LogService {
    /// Creates the service, creating the logs directory if needed.
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        delay: Duration,
        tracker: JobTracker,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| {
            AppError::Internal(format!(
                "failed to create logs directory {}: {}",
                dir.display(),
                err
            ))
        })?;

        Ok(Self {
            dir,
            prefix: prefix.into(),
            delay,
            tracker,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // == Generate For Period ==
    /// Starts merging the daily logs from `start` through `end` inclusive and
    /// returns the job id immediately.
    pub fn generate_for_period(&self, start: NaiveDate, end: NaiveDate) -> Result<JobId> {
        if start > end {
            return Err(AppError::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let dir = self.dir.clone();
        let prefix = self.prefix.clone();
        let delay = self.delay;

        let id = self
            .tracker
            .submit(move |ctx| aggregate_period(ctx, dir, prefix, delay, start, end));
        info!(job_id = %id, %start, %end, "Log aggregation requested");
        Ok(id)
    }

    pub fn status(&self, id: JobId) -> JobStatus {
        self.tracker.status(id)
    }

    /// Contents of a finished aggregation.
    pub async fn fetch(&self, id: JobId) -> Result<Vec<u8>> {
        Ok(self.tracker.fetch_artifact(id).await?)
    }

    // == Log For Date ==
    /// Lines of the combined `<prefix>-all.log` that start with `date`.
    pub async fn log_for_date(&self, date: NaiveDate) -> Result<String> {
        let path = self.dir.join(format!("{}-all.log", self.prefix));
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "combined log {} does not exist",
                    path.display()
                )));
            }
            Err(err) => {
                return Err(AppError::Internal(format!(
                    "failed to read {}: {}",
                    path.display(),
                    err
                )));
            }
        };

        let day = date.format(DATE_FORMAT).to_string();
        let filtered: String = contents
            .lines()
            .filter(|line| line.starts_with(&day))
            .flat_map(|line| [line, "\n"])
            .collect();

        if filtered.is_empty() {
            return Err(AppError::NotFound(format!("no log lines for {day}")));
        }
        Ok(filtered)
    }
}

/// Body of an aggregation job.
async fn aggregate_period(
    ctx: JobContext,
    dir: PathBuf,
    prefix: String,
    delay: Duration,
    start: NaiveDate,
    end: NaiveDate,
) -> std::result::Result<PathBuf, JobError> {
    if !delay.is_zero() {
        ctx.sleep(delay).await?;
    }

    let mut merged = String::new();
    for date in start.iter_days().take_while(|date| *date <= end) {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let name = daily_log_file_name(&prefix, date);
        let path = dir.join(&name);
        if !tokio::fs::try_exists(&path).await? {
            debug!(job_id = %ctx.id(), file = %name, "No log for day, skipping");
            continue;
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        merged.push_str(&format!("===== {name} =====\n"));
        merged.push_str(&contents);
        merged.push('\n');
    }

    if merged.is_empty() {
        return Err(JobError::NoSourceFiles {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let output = dir.join(format!("log_period_{}.log", ctx.id()));
    tokio::fs::write(&output, merged).await?;
    Ok(output)
}
