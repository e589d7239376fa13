// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON document store, scoped globally or per session.
//!
//! One document per (mode, scope) key, stored as a single file. Every write
//! goes through a uniquely named temp file in the target directory followed
//! by a rename, so readers never observe a torn document. Same-key writers
//! are last-writer-wins; there is no cross-process locking.

use chrono::{DateTime, Utc};
use errand_core::{validate_mode, validate_session, Scope, ScopeError, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Metadata stamped by the store on every write. Never caller-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub written_at: DateTime<Utc>,
    pub writer: String,
}

/// A stored document: the caller payload plus the store's stamp.
#[derive(Debug, Clone)]
pub struct StateDocument {
    pub mode: String,
    pub payload: Map<String, Value>,
    pub meta: DocMeta,
}

/// Per-mode summary returned by [`StateStore::status`].
#[derive(Debug, Clone, Serialize)]
pub struct ModeStatus {
    pub mode: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_at: Option<DateTime<Utc>>,
}

/// On-disk shape: payload keys at the top level plus an injected `_meta`.
#[derive(Serialize, Deserialize)]
struct RawDoc {
    #[serde(rename = "_meta")]
    meta: DocMeta,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

/// JSON truthiness for the payload `active` field: `false`, `null`, `0`,
/// and `""` are falsy; everything else (including empty arrays/objects)
/// is truthy.
pub fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Scoped atomic JSON document store rooted at an explicit base directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    base_dir: PathBuf,
    writer: String,
}

impl StateStore {
    /// Create a store rooted at `base_dir`. Nothing is created on disk
    /// until the first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            writer: format!("pid:{}", std::process::id()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write (or overwrite) the document for `(mode, scope)`. Atomic:
    /// concurrent readers see either the previous document or this one.
    pub fn write(
        &self,
        mode: &str,
        payload: Map<String, Value>,
        session: Option<&SessionId>,
    ) -> Result<(), StoreError> {
        validate_mode(mode)?;
        self.write_unchecked(mode, payload, session)
    }

    /// Read the document for `(mode, scope)`. Absence is `Ok(None)`, not
    /// an error.
    pub fn read(
        &self,
        mode: &str,
        session: Option<&SessionId>,
    ) -> Result<Option<StateDocument>, StoreError> {
        validate_mode(mode)?;
        self.read_unchecked(mode, session)
    }

    /// Remove the document for `(mode, scope)`. Idempotent: clearing an
    /// absent document succeeds.
    pub fn clear(&self, mode: &str, session: Option<&SessionId>) -> Result<(), StoreError> {
        validate_mode(mode)?;
        let path = self.doc_path(mode, session)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(mode, scope = %Scope::from_session(session), "state document cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Mode names in the scope whose payload `active` field is truthy,
    /// sorted. Only top-level documents of the scope are scanned; the
    /// `jobs/` and `sessions/` sub-trees are separate namespaces.
    pub fn list_active(&self, session: Option<&SessionId>) -> Result<Vec<String>, StoreError> {
        let mut modes: Vec<String> = self
            .scan_scope(session)?
            .into_iter()
            .filter(|(_, doc)| doc.payload.get("active").is_some_and(value_is_truthy))
            .map(|(mode, _)| mode)
            .collect();
        modes.sort();
        Ok(modes)
    }

    /// Per-mode active/inactive summary. With a mode given, reports that
    /// single mode (absent means inactive); otherwise reports every known
    /// mode in the scope, sorted.
    pub fn status(
        &self,
        mode: Option<&str>,
        session: Option<&SessionId>,
    ) -> Result<Vec<ModeStatus>, StoreError> {
        if let Some(mode) = mode {
            let doc = self.read(mode, session)?;
            return Ok(vec![ModeStatus {
                mode: mode.to_string(),
                active: doc
                    .as_ref()
                    .and_then(|d| d.payload.get("active"))
                    .is_some_and(value_is_truthy),
                written_at: doc.map(|d| d.meta.written_at),
            }]);
        }
        let mut statuses: Vec<ModeStatus> = self
            .scan_scope(session)?
            .into_iter()
            .map(|(mode, doc)| ModeStatus {
                active: doc.payload.get("active").is_some_and(value_is_truthy),
                written_at: Some(doc.meta.written_at),
                mode,
            })
            .collect();
        statuses.sort_by(|a, b| a.mode.cmp(&b.mode));
        Ok(statuses)
    }

    /// Write without the reserved-prefix check. The registry writes into
    /// the `jobs/` sub-scope through this door.
    pub(crate) fn write_unchecked(
        &self,
        mode: &str,
        mut payload: Map<String, Value>,
        session: Option<&SessionId>,
    ) -> Result<(), StoreError> {
        let path = self.doc_path(mode, session)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let meta = DocMeta {
            written_at: Utc::now(),
            writer: self.writer.clone(),
        };
        // Caller-supplied _meta is discarded; the stamp is the store's.
        payload.remove("_meta");
        let raw = RawDoc { meta, payload };
        let bytes = serde_json::to_vec_pretty(&raw)?;
        atomic_write(&path, &bytes)?;
        tracing::debug!(mode, scope = %Scope::from_session(session), "state document written");
        Ok(())
    }

    pub(crate) fn read_unchecked(
        &self,
        mode: &str,
        session: Option<&SessionId>,
    ) -> Result<Option<StateDocument>, StoreError> {
        let path = self.doc_path(mode, session)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let raw: RawDoc = serde_json::from_slice(&bytes)?;
        Ok(Some(StateDocument {
            mode: mode.to_string(),
            payload: raw.payload,
            meta: raw.meta,
        }))
    }

    pub(crate) fn clear_unchecked(
        &self,
        mode: &str,
        session: Option<&SessionId>,
    ) -> Result<(), StoreError> {
        let path = self.doc_path(mode, session)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Directory a scope's documents live in.
    pub(crate) fn scope_dir(&self, session: Option<&SessionId>) -> Result<PathBuf, StoreError> {
        match session {
            None => Ok(self.base_dir.clone()),
            Some(sid) => {
                validate_session(sid)?;
                Ok(self.base_dir.join("sessions").join(sid.as_str()))
            }
        }
    }

    pub(crate) fn doc_path(
        &self,
        mode: &str,
        session: Option<&SessionId>,
    ) -> Result<PathBuf, StoreError> {
        Ok(self.scope_dir(session)?.join(format!("{mode}.json")))
    }

    /// Parse every top-level `.json` document in the scope directory.
    /// Unreadable files are skipped with a warning rather than failing the
    /// whole listing.
    fn scan_scope(
        &self,
        session: Option<&SessionId>,
    ) -> Result<Vec<(String, StateDocument)>, StoreError> {
        let dir = self.scope_dir(session)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut docs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(mode) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            match fs::read(&path)
                .map_err(StoreError::from)
                .and_then(|b| serde_json::from_slice::<RawDoc>(&b).map_err(StoreError::from))
            {
                Ok(raw) => docs.push((
                    mode.clone(),
                    StateDocument {
                        mode,
                        payload: raw.payload,
                        meta: raw.meta,
                    },
                )),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable state document");
                }
            }
        }
        Ok(docs)
    }
}

/// Write `bytes` to a uniquely named temp file next to `path`, then rename
/// into place. The temp file lives in the same directory so the rename
/// never crosses a filesystem boundary.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), io::Error> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.json");
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, nanoid::nanoid!(8)));
    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
