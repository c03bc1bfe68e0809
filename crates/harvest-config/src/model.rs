// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Harvest pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use harvest_core::CursorStrategy;
use serde::{Deserialize, Serialize};

/// Top-level Harvest configuration.
///
/// Every section is optional and defaults to the values the crawler has
/// always used (batches of 100, a 2 second pause between pages, a 5 second
/// transient back-off, a top-10 report).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub harvest: GeneralConfig,

    /// Message source gateway settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Batch fetch loop settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Retry controller settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Aggregate report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP message gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL of the gateway, e.g. `http://127.0.0.1:8081`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request. `None` sends no auth header.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("harvest").join("harvest.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("harvest.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Batch fetch loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Maximum number of items requested per page.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive non-empty pages, in milliseconds.
    #[serde(default = "default_page_pause_ms")]
    pub page_pause_ms: u64,

    /// Fetch and store reply sub-threads of posts that have replies.
    #[serde(default)]
    pub include_replies: bool,

    /// Maximum replies fetched per post.
    #[serde(default = "default_reply_limit")]
    pub reply_limit: usize,

    /// How many levels of replies-to-replies to follow.
    #[serde(default = "default_max_reply_depth")]
    pub max_reply_depth: u32,

    /// How the resume point is derived from stored messages.
    #[serde(default)]
    pub cursor_strategy: CursorStrategy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            page_pause_ms: default_page_pause_ms(),
            include_replies: false,
            reply_limit: default_reply_limit(),
            max_reply_depth: default_max_reply_depth(),
            cursor_strategy: CursorStrategy::default(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_page_pause_ms() -> u64 {
    2000
}

fn default_reply_limit() -> usize {
    100
}

fn default_max_reply_depth() -> u32 {
    1
}

/// Retry controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Fixed delay before resuming after a transient failure, in seconds.
    #[serde(default = "default_transient_delay_secs")]
    pub transient_delay_secs: u64,

    /// Give up after this many failed attempts. `None` retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            transient_delay_secs: default_transient_delay_secs(),
            max_attempts: None,
        }
    }
}

fn default_transient_delay_secs() -> u64 {
    5
}

/// Aggregate report configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Number of domains in the report.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Directory the report files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Markdown table file name.
    #[serde(default = "default_markdown_file")]
    pub markdown_file: String,

    /// Text bar chart file name.
    #[serde(default = "default_chart_file")]
    pub chart_file: String,

    /// Width of the longest bar, in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            output_dir: default_output_dir(),
            markdown_file: default_markdown_file(),
            chart_file: default_chart_file(),
            chart_width: default_chart_width(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_output_dir() -> String {
    "results".to_string()
}

fn default_markdown_file() -> String {
    "result.md".to_string()
}

fn default_chart_file() -> String {
    "chart.txt".to_string()
}

fn default_chart_width() -> usize {
    40
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_crawler_constants() {
        let config = HarvestConfig::default();
        assert_eq!(config.ingest.batch_size, 100);
        assert_eq!(config.ingest.page_pause_ms, 2000);
        assert!(!config.ingest.include_replies);
        assert_eq!(config.ingest.cursor_strategy, CursorStrategy::Timestamp);
        assert_eq!(config.retry.transient_delay_secs, 5);
        assert_eq!(config.retry.max_attempts, None);
        assert_eq!(config.report.top_k, 10);
        assert_eq!(config.report.markdown_file, "result.md");
        assert!(config.storage.database_path.ends_with("harvest.db"));
    }

    #[test]
    fn cursor_strategy_parses_from_json() {
        let ingest: IngestConfig =
            serde_json::from_str(r#"{"cursor_strategy": "max_source_id"}"#).unwrap();
        assert_eq!(ingest.cursor_strategy, CursorStrategy::MaxSourceId);
        assert_eq!(ingest.batch_size, 100);
    }
}
