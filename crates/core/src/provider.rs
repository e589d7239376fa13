// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider identifier for external assistant CLIs.
//!
//! Two providers are known today; anything else round-trips as
//! [`Provider::Other`] so new CLI families need no enum change to be
//! tracked, listed, and signaled.

use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

/// Which external CLI family a job invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    Codex,
    Gemini,
    /// A provider this build has no dedicated adapter for.
    Other(SmolStr),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider must not be empty")]
    Empty,
    #[error("invalid provider '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidName(String),
}

impl Provider {
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Codex => "codex",
            Provider::Gemini => "gemini",
            Provider::Other(name) => name,
        }
    }

    /// Parse a provider name. Unknown names are accepted as [`Provider::Other`]
    /// as long as they are safe to use as a path segment.
    pub fn parse(name: &str) -> Result<Self, ProviderError> {
        if name.is_empty() {
            return Err(ProviderError::Empty);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ProviderError::InvalidName(name.to_string()));
        }
        Ok(match name {
            "codex" => Provider::Codex,
            "gemini" => Provider::Gemini,
            other => Provider::Other(SmolStr::new(other)),
        })
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::parse(s)
    }
}

impl serde::Serialize for Provider {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Provider {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Provider::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
