/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::domain::BusType;
use std::path::PathBuf;
use thiserror::Error;

/// Domain-level errors that don't expose infrastructure details
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A vendor or device id was not 1-4 hex digits
    #[error("Invalid hardware id: {0:?}")]
    InvalidHardwareId(String),
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Device ids could not be enumerated
    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),
}

/// System-level errors for adapters (not exposed to domain)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SystemError {
    /// I/O operation failed
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SystemError {
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        SystemError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Convert system errors to domain errors (with context loss for abstraction)
impl From<SystemError> for DomainError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::Io { path, message } => DomainError::EnumerationFailed(format!(
                "I/O error on {}: {}",
                path.display(),
                message
            )),
            SystemError::Serialization(msg) => DomainError::InvalidConfiguration(msg),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Non-fatal problems raised while resolving ids
///
/// These never abort a resolution cycle. They are handed to a
/// [`DiagnosticsSink`](crate::ports::DiagnosticsSink) so the display layer
/// can tell the user why a bus type came back empty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Diagnostic {
    /// The ids database for a bus type could not be opened or read
    #[error("{bus} id database unavailable at {path}: {reason}")]
    SourceUnavailable {
        bus: BusType,
        path: PathBuf,
        reason: String,
    },
    /// The cache document could not be written
    #[error("Cache not writable at {path}: {reason}")]
    CacheUnwritable { path: PathBuf, reason: String },
}
