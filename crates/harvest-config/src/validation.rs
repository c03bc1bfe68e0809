// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, URL schemes, and numeric ranges.

use crate::diagnostic::ConfigError;
use crate::model::HarvestConfig;

/// Upper bound on `ingest.batch_size`; sources cap page sizes well below this.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HarvestConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let base_url = config.source.base_url.trim();
    if base_url.is_empty() {
        fail("source.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "source.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.source.request_timeout_secs == 0 {
        fail("source.request_timeout_secs must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let batch_size = config.ingest.batch_size;
    if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
        fail(format!(
            "ingest.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
        ));
    }

    if config.ingest.include_replies && config.ingest.reply_limit == 0 {
        fail("ingest.reply_limit must be at least 1 when include_replies is set".to_string());
    }

    if config.retry.max_attempts == Some(0) {
        fail("retry.max_attempts must be at least 1 (omit it to retry forever)".to_string());
    }

    if config.report.top_k == 0 {
        fail("report.top_k must be at least 1".to_string());
    }

    if config.report.chart_width == 0 {
        fail("report.chart_width must be at least 1".to_string());
    }

    for (key, value) in [
        ("report.output_dir", &config.report.output_dir),
        ("report.markdown_file", &config.report.markdown_file),
        ("report.chart_file", &config.report.chart_file),
    ] {
        if value.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
