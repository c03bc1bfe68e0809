// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Harvest ingestion pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Harvest adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence backend errors (database unreachable, query failure, rejected write).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The message source asked us to back off for `wait` before the next request.
    #[error("rate limited by source, retry after {wait:?}")]
    RateLimited { wait: Duration },

    /// Recoverable source failure (network, timeout, 5xx, malformed payload).
    #[error("transient source error: {message}")]
    Transient {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The source rejected the request (unknown channel, unauthorized, bad request).
    #[error("fatal source error: {message}")]
    Fatal { message: String },

    /// The retry controller hit its configured attempt cap.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<HarvestError>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// How the retry controller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Sleep for the source-specified duration, then resume.
    RateLimit(Duration),
    /// Sleep for the fixed transient delay, then resume.
    Transient,
    /// The source rejected the request. Retried on the transient delay
    /// unless [`HarvestError::is_terminal`] says otherwise.
    Fatal,
}

impl HarvestError {
    /// Build a transient error from any source error.
    pub fn transient(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify this error for the retry controller.
    ///
    /// Storage failures that escape a run are treated as transient: the store
    /// may come back, and resuming recomputes the cursor from what was persisted.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimited { wait } => FailureClass::RateLimit(*wait),
            Self::Transient { .. } | Self::Storage { .. } | Self::Internal(_) => {
                FailureClass::Transient
            }
            Self::Config(_) | Self::Fatal { .. } | Self::RetriesExhausted { .. } => {
                FailureClass::Fatal
            }
        }
    }

    /// Errors no amount of waiting fixes: bad configuration, or a retry cap
    /// that has already run out.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::RetriesExhausted { .. })
    }
}
