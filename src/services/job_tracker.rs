//! Job tracking for async batch replay.
//!
//! This module provides a simple in-memory job tracker that stores progress
//! logs for background tasks like dataset replay, plus a cooperative cancel
//! flag checked by the running batch between items.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::batch::CancelFlag;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Job status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Job metadata and logs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Result of the job (e.g., the batch report if finished)
    pub result: Option<serde_json::Value>,
    #[serde(skip, default)]
    cancel: CancelFlag,
}

/// In-memory job tracker.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobTracker {
    /// Create a new job tracker.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new job and return its ID.
    pub fn create_job(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            status: JobStatus::Running,
            logs: vec![],
            created_at: chrono::Utc::now(),
            completed_at: None,
            result: None,
            cancel: CancelFlag::new(),
        };
        self.jobs.write().insert(job_id.clone(), job);
        job_id
    }

    /// Add a log entry to a job.
    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Mark a job as completed with optional result.
    pub fn complete_job(&self, job_id: &str, result: Option<serde_json::Value>) {
        self.finish(job_id, JobStatus::Completed, result);
    }

    /// Mark a job as cancelled, keeping the partial result.
    pub fn mark_cancelled(&self, job_id: &str, result: Option<serde_json::Value>) {
        self.finish(job_id, JobStatus::Cancelled, result);
    }

    fn finish(&self, job_id: &str, status: JobStatus, result: Option<serde_json::Value>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = status;
            job.completed_at = Some(chrono::Utc::now());
            job.result = result;
        }
    }

    /// Mark a job as failed.
    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = JobStatus::Failed;
            job.completed_at = Some(chrono::Utc::now());
            job.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level: LogLevel::Error,
                message: error_message.into(),
            });
        }
    }

    /// Request cooperative cancellation of a running job.
    ///
    /// Returns true when the job exists and was still running. The batch
    /// notices the flag between items and finishes with a partial report.
    pub fn request_cancel(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(job_id) {
            Some(job) if job.status == JobStatus::Running => {
                job.cancel.cancel();
                job.logs.push(LogEntry {
                    timestamp: chrono::Utc::now(),
                    level: LogLevel::Warning,
                    message: "cancellation requested".to_string(),
                });
                true
            }
            _ => false,
        }
    }

    /// The cancel flag shared with the job's runner.
    pub fn cancel_flag(&self, job_id: &str) -> Option<CancelFlag> {
        self.jobs.read().get(job_id).map(|job| job.cancel.clone())
    }

    /// Get a job by ID.
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    /// Get all logs for a job.
    pub fn get_logs(&self, job_id: &str) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let tracker = JobTracker::new();
        let job_id = tracker.create_job();

        tracker.log(&job_id, LogLevel::Info, "starting");
        tracker.complete_job(&job_id, Some(serde_json::json!({"ingested": 3})));

        let job = tracker.get_job(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.logs.len(), 1);
        assert!(job.completed_at.is_some());
        assert_eq!(job.result.unwrap()["ingested"], 3);
    }

    #[test]
    fn test_cancel_only_running_jobs() {
        let tracker = JobTracker::new();
        let job_id = tracker.create_job();

        assert!(tracker.request_cancel(&job_id));
        assert!(tracker.cancel_flag(&job_id).unwrap().is_cancelled());

        tracker.mark_cancelled(&job_id, None);
        assert_eq!(tracker.get_job(&job_id).unwrap().status, JobStatus::Cancelled);

        // A finished job cannot be cancelled again.
        assert!(!tracker.request_cancel(&job_id));
        // Nor can a job that never existed.
        assert!(!tracker.request_cancel("nope"));
    }
}
