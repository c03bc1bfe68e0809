// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit run context shared by every pipeline component.

use std::sync::Arc;

use harvest_config::HarvestConfig;
use harvest_config::model::{IngestConfig, RetryConfig};
use harvest_core::{MessageStore, SourceAdapter};

/// Source and store handles plus the settings that drive a run.
///
/// Built once by the caller and passed by reference; no component reaches
/// for global state.
#[derive(Clone)]
pub struct HarvestContext {
    pub source: Arc<dyn SourceAdapter>,
    pub store: Arc<dyn MessageStore>,
    pub ingest: IngestConfig,
    pub retry: RetryConfig,
}

impl HarvestContext {
    pub fn new(
        source: Arc<dyn SourceAdapter>,
        store: Arc<dyn MessageStore>,
        config: &HarvestConfig,
    ) -> Self {
        Self {
            source,
            store,
            ingest: config.ingest.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Replace the ingest settings.
    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    /// Replace the retry settings.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
