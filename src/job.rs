//! In-memory job registry.
//!
//! One record per accepted job, mutated only by its worker and read by
//! polling consumers. The store exposes `create`/`get`/`update` over a
//! single mutex; reads copy the record out, so pollers never hold the lock
//! while doing work. Records live for the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::output::{JobStatusView, JobSummary};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of one job. `status` is a human-readable progress string for a
/// polling UI, not a machine-parsable field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub status: String,
    pub done: bool,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JobSummary>,
}

impl JobRecord {
    fn new() -> Self {
        Self {
            status: "Preparing the job.".to_string(),
            done: false,
            error: None,
            summary: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<HashMap<String, JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh job and return its id.
    pub fn create(&self) -> JobId {
        let id = JobId::new();
        self.lock().insert(id.as_str().to_string(), JobRecord::new());
        id
    }

    /// Copy a record out; `None` for unknown ids.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.lock().get(id.as_str()).cloned()
    }

    /// Apply a mutation to a record, ignoring unknown ids.
    pub fn update(&self, id: &JobId, mutate: impl FnOnce(&mut JobRecord)) {
        if let Some(record) = self.lock().get_mut(id.as_str()) {
            mutate(record);
        }
    }

    pub fn set_status(&self, id: &JobId, status: impl Into<String>) {
        let status = status.into();
        info!(job = %id, "{status}");
        self.update(id, |record| record.status = status);
    }

    pub fn finish_success(&self, id: &JobId, summary: JobSummary) {
        self.update(id, |record| {
            record.status = "Completed.".to_string();
            record.done = true;
            record.error = None;
            record.summary = Some(summary);
        });
    }

    pub fn finish_error(&self, id: &JobId, error: impl Into<String>) {
        let error = error.into();
        self.update(id, |record| {
            record.status = "The job failed.".to_string();
            record.done = true;
            record.error = Some(error);
        });
    }

    /// The small view a polling client reads every few hundred ms. Unknown
    /// ids poll as terminal so clients do not spin forever.
    pub fn status_view(&self, id: &JobId) -> JobStatusView {
        match self.get(id) {
            Some(record) => JobStatusView {
                status: record.status,
                done: record.done,
                error: record.error,
            },
            None => JobStatusView {
                status: "job not found".to_string(),
                done: true,
                error: Some("job not found".to_string()),
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, JobRecord>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_initializes_pending_record() {
        let store = JobStore::new();
        let id = store.create();
        let record = store.get(&id).expect("record exists");

        assert!(!record.done);
        assert!(record.error.is_none());
        assert!(record.summary.is_none());
        assert!(!record.status.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let store = JobStore::new();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
    }

    #[test]
    fn update_mutates_only_the_named_job() {
        let store = JobStore::new();
        let a = store.create();
        let b = store.create();

        store.set_status(&a, "working");

        assert_eq!(store.get(&a).unwrap().status, "working");
        assert_ne!(store.get(&b).unwrap().status, "working");
    }

    #[test]
    fn finish_error_is_terminal_with_message() {
        let store = JobStore::new();
        let id = store.create();
        store.finish_error(&id, "browser could not start");

        let view = store.status_view(&id);
        assert!(view.done);
        assert_eq!(view.error.as_deref(), Some("browser could not start"));
    }

    #[test]
    fn unknown_job_polls_as_terminal() {
        let store = JobStore::new();
        let view = store.status_view(&JobId::new());
        assert!(view.done);
        assert!(view.error.is_some());
        assert_eq!(view.status, "job not found");
    }
}
