// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing report artifacts to disk.

use std::path::{Path, PathBuf};

use harvest_config::model::ReportConfig;
use harvest_core::HarvestError;
use tracing::info;

use crate::Report;

/// Where the artifacts of one report were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub chart: PathBuf,
}

/// Write the markdown table and the bar chart into `config.output_dir`,
/// creating the directory when missing. Existing files are replaced.
pub async fn write_report(
    report: &Report,
    config: &ReportConfig,
) -> Result<ReportPaths, HarvestError> {
    let dir = PathBuf::from(&config.output_dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| HarvestError::Internal(format!("cannot create {}: {e}", dir.display())))?;

    let paths = ReportPaths {
        markdown: dir.join(&config.markdown_file),
        chart: dir.join(&config.chart_file),
    };
    write(&paths.markdown, report.to_markdown()).await?;
    write(&paths.chart, report.to_bar_chart(config.chart_width)).await?;

    info!(
        markdown = %paths.markdown.display(),
        chart = %paths.chart.display(),
        rows = report.rows.len(),
        "report written"
    );
    Ok(paths)
}

async fn write(path: &Path, contents: String) -> Result<(), HarvestError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| HarvestError::Internal(format!("cannot write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use harvest_core::DomainCount;

    #[tokio::test]
    async fn writes_both_artifacts_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            output_dir: dir.path().join("results").to_string_lossy().to_string(),
            ..ReportConfig::default()
        };
        let report = Report {
            generated_at: Utc::now(),
            channel: None,
            rows: vec![DomainCount::new("example.com", 3)],
        };

        let paths = write_report(&report, &config).await.unwrap();

        assert!(paths.markdown.ends_with("result.md"));
        assert!(paths.chart.ends_with("chart.txt"));
        let md = std::fs::read_to_string(&paths.markdown).unwrap();
        assert!(md.contains("| example.com | 3 |"));
        let chart = std::fs::read_to_string(&paths.chart).unwrap();
        assert!(chart.contains("example.com"));
    }

    #[tokio::test]
    async fn rewriting_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            output_dir: dir.path().to_string_lossy().to_string(),
            ..ReportConfig::default()
        };
        let mut report = Report {
            generated_at: Utc::now(),
            channel: None,
            rows: vec![DomainCount::new("old.com", 1)],
        };
        write_report(&report, &config).await.unwrap();
        report.rows = vec![DomainCount::new("new.com", 2)];
        let paths = write_report(&report, &config).await.unwrap();

        let md = std::fs::read_to_string(paths.markdown).unwrap();
        assert!(md.contains("new.com"));
        assert!(!md.contains("old.com"));
    }
}
