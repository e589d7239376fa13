// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry: one state document per job under `jobs/<provider>/<id>`.
//!
//! The registry also owns the sibling file conventions for a job: the
//! default output file, the inline-prompt audit file, and the exit marker
//! the background wrapper writes when the process finishes.

use errand_core::{Job, JobStatus, Provider, StatusFilter};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::{StateStore, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("job {id} is already {status}; status is final")]
    AlreadyTerminal { id: String, status: JobStatus },
    #[error("job record for {id} is malformed: {source}")]
    Malformed {
        id: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct JobRegistry {
    store: StateStore,
}

impl JobRegistry {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    fn mode_for(provider: &Provider, id: &str) -> String {
        format!("jobs/{}/{}", provider, id)
    }

    fn jobs_dir(&self, provider: &Provider) -> PathBuf {
        self.store.base_dir().join("jobs").join(provider.as_str())
    }

    /// Default output file for a job id.
    pub fn output_path(&self, provider: &Provider, id: &str) -> PathBuf {
        self.jobs_dir(provider).join(format!("{id}.out"))
    }

    /// Audit file an inline prompt is persisted to before spawning.
    pub fn prompt_path(&self, provider: &Provider, id: &str) -> PathBuf {
        self.jobs_dir(provider).join(format!("{id}.prompt"))
    }

    /// File the background wrapper writes the child's exit code to.
    pub fn exit_marker_path(&self, provider: &Provider, id: &str) -> PathBuf {
        self.jobs_dir(provider).join(format!("{id}.exit"))
    }

    /// Write a freshly created job record.
    pub fn create_job(&self, job: &Job) -> Result<(), RegistryError> {
        let mode = Self::mode_for(&job.provider, &job.id);
        self.store.write_unchecked(&mode, job_to_map(job)?, None)?;
        tracing::info!(job_id = %job.id, provider = %job.provider, "job record created");
        Ok(())
    }

    pub fn get_job(&self, provider: &Provider, id: &str) -> Result<Option<Job>, RegistryError> {
        let mode = Self::mode_for(provider, id);
        let Some(doc) = self.store.read_unchecked(&mode, None)? else {
            return Ok(None);
        };
        let job = serde_json::from_value(Value::Object(doc.payload))
            .map_err(|source| RegistryError::Malformed { id: id.to_string(), source })?;
        Ok(Some(job))
    }

    /// Locate a job by id alone, scanning every provider sub-tree.
    pub fn find_job(&self, id: &str) -> Result<Option<Job>, RegistryError> {
        for provider in self.known_providers()? {
            if let Some(job) = self.get_job(&provider, id)? {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Merge `patch` into the stored record (read-modify-write). Refuses to
    /// move a terminal status — terminal states are final. Not safe against
    /// concurrent updaters racing on the same id; by convention exactly one
    /// process owns a given job's transitions.
    pub fn update_job(
        &self,
        provider: &Provider,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Job, RegistryError> {
        let existing = self
            .get_job(provider, id)?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if existing.is_terminal() {
            let changes_status = patch
                .get("status")
                .is_some_and(|v| v != &Value::String(existing.status.to_string()));
            if changes_status {
                return Err(RegistryError::AlreadyTerminal {
                    id: id.to_string(),
                    status: existing.status,
                });
            }
        }
        let mut payload = job_to_map(&existing)?;
        for (key, value) in patch {
            payload.insert(key, value);
        }
        let job: Job = serde_json::from_value(Value::Object(payload.clone()))
            .map_err(|source| RegistryError::Malformed { id: id.to_string(), source })?;
        let mode = Self::mode_for(provider, id);
        self.store.write_unchecked(&mode, payload, None)?;
        tracing::debug!(job_id = id, status = %job.status, "job record updated");
        Ok(job)
    }

    /// Jobs for one provider (or every provider), newest first by creation
    /// time. `filter = None` matches everything.
    pub fn list_jobs(
        &self,
        provider: Option<&Provider>,
        filter: Option<StatusFilter>,
        limit: usize,
    ) -> Result<Vec<Job>, RegistryError> {
        let providers = match provider {
            Some(p) => vec![p.clone()],
            None => self.known_providers()?,
        };
        let mut jobs = Vec::new();
        for provider in &providers {
            jobs.extend(self.scan_provider(provider)?);
        }
        if let Some(filter) = filter {
            jobs.retain(|job| filter.matches(job.status));
        }
        jobs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        jobs.truncate(limit);
        Ok(jobs)
    }

    /// Read and consume the exit marker for a job, if the wrapper has
    /// written one. An unreadable marker is dropped with a warning so a
    /// poll loop does not chew on it forever.
    pub fn take_exit_marker(
        &self,
        provider: &Provider,
        id: &str,
    ) -> Result<Option<i32>, RegistryError> {
        let path = self.exit_marker_path(provider, id);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::from(e).into()),
        };
        let _ = fs::remove_file(&path);
        match content.trim().parse::<i32>() {
            Ok(code) => Ok(Some(code)),
            Err(_) => {
                tracing::warn!(job_id = id, content = %content.trim(), "dropping unreadable exit marker");
                Ok(None)
            }
        }
    }

    /// Remove a job record (not part of the caller surface; used by tests
    /// and future pruning).
    pub fn delete_job(&self, provider: &Provider, id: &str) -> Result<(), RegistryError> {
        let mode = Self::mode_for(provider, id);
        self.store.clear_unchecked(&mode, None)?;
        Ok(())
    }

    /// Providers that have a sub-tree on disk.
    fn known_providers(&self) -> Result<Vec<Provider>, RegistryError> {
        let jobs_root = self.store.base_dir().join("jobs");
        let entries = match fs::read_dir(&jobs_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::from(e).into()),
        };
        let mut providers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StoreError::from)?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(provider) = Provider::parse(name) {
                    providers.push(provider);
                }
            }
        }
        providers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(providers)
    }

    fn scan_provider(&self, provider: &Provider) -> Result<Vec<Job>, RegistryError> {
        let dir = self.jobs_dir(provider);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::from(e).into()),
        };
        let mut jobs = Vec::new();
        for entry in entries {
            let path = entry.map_err(StoreError::from)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.get_job(provider, id) {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable job record");
                }
            }
        }
        Ok(jobs)
    }
}

fn job_to_map(job: &Job) -> Result<Map<String, Value>, RegistryError> {
    let value = serde_json::to_value(job)
        .map_err(|source| RegistryError::Malformed { id: job.id.to_string(), source })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RegistryError::Malformed {
            id: job.id.to_string(),
            source: <serde_json::Error as serde::ser::Error>::custom(
                "job did not serialize to an object",
            ),
        }),
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
