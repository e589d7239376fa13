// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope and mode identifiers for the state store.
//!
//! A document is addressed by `(mode, scope)`. Scope is a pure path-namespace
//! discriminator: a session-scoped document and a global document for the
//! same mode are independent and never merge.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Sub-scope directories the store manages itself. Caller modes must not
/// start with these, or a mode document would collide with the trees.
pub const RESERVED_SUBSCOPES: &[&str] = &["jobs", "sessions"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("invalid mode '{0}': segments must be non-empty [A-Za-z0-9_-]")]
    InvalidMode(String),
    #[error("mode '{0}' collides with the reserved '{1}/' sub-scope")]
    ReservedMode(String, &'static str),
    #[error("invalid session id '{0}': must be non-empty [A-Za-z0-9_-]")]
    InvalidSession(String),
}

/// Identifier for a caller session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a new SessionId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value of this SessionId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Namespace a document lives in: the global tree or one session's tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Session(SessionId),
}

impl Scope {
    pub fn from_session(session: Option<&SessionId>) -> Self {
        match session {
            Some(id) => Scope::Session(id.clone()),
            None => Scope::Global,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Session(id) => write!(f, "session:{}", id),
        }
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a caller-supplied mode identifier.
///
/// Modes are `/`-separated identifier segments; the first segment must not
/// name a reserved sub-scope.
pub fn validate_mode(mode: &str) -> Result<(), ScopeError> {
    if mode.is_empty() || !mode.split('/').all(valid_segment) {
        return Err(ScopeError::InvalidMode(mode.to_string()));
    }
    let first = mode.split('/').next().unwrap_or_default();
    for reserved in RESERVED_SUBSCOPES {
        if first == *reserved {
            return Err(ScopeError::ReservedMode(mode.to_string(), reserved));
        }
    }
    Ok(())
}

/// Validate a session id: a single identifier segment, no separators.
pub fn validate_session(session: &SessionId) -> Result<(), ScopeError> {
    if valid_segment(session.as_str()) {
        Ok(())
    } else {
        Err(ScopeError::InvalidSession(session.to_string()))
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
