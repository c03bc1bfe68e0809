// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation reporter: the most mentioned domains across stored messages,
//! rendered as a markdown table and a text bar chart.

pub mod output;
pub mod render;

pub use output::{ReportPaths, write_report};

use chrono::{DateTime, Utc};
use harvest_core::{DomainCount, HarvestError, MessageStore};
use serde::Serialize;

/// A top-K snapshot of the domain aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Channel the run ingested; the counts themselves span every channel.
    pub channel: Option<String>,
    pub rows: Vec<DomainCount>,
}

/// Reads the aggregate from a store.
pub struct AggregationReporter<'a> {
    store: &'a dyn MessageStore,
}

impl<'a> AggregationReporter<'a> {
    pub fn new(store: &'a dyn MessageStore) -> Self {
        Self { store }
    }

    /// Domain mention counts, count descending then domain ascending.
    pub async fn top_domains(&self, k: usize) -> Result<Vec<DomainCount>, HarvestError> {
        self.store.top_domains(k).await
    }

    /// Snapshot the top `k` domains now.
    pub async fn build(&self, channel: Option<&str>, k: usize) -> Result<Report, HarvestError> {
        Ok(Report {
            generated_at: Utc::now(),
            channel: channel.map(str::to_string),
            rows: self.top_domains(k).await?,
        })
    }
}
