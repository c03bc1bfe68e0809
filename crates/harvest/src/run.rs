// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One ingestion run: wire the adapters, harvest the channel, write the report.

use std::future::Future;
use std::sync::Arc;

use harvest_config::HarvestConfig;
use harvest_core::{HarvestError, HealthStatus, MessageStore, SourceAdapter};
use harvest_pipeline::{HarvestContext, RunSummary, harvest_channel};
use harvest_report::{AggregationReporter, Report, ReportPaths, write_report};
use harvest_source::HttpSource;
use harvest_storage::SqliteStore;
use tracing::{debug, info, warn};

/// How the ingestion phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The channel was walked until the source had nothing older to give.
    CaughtUp(RunSummary),
    /// A shutdown signal arrived first. Messages stored so far are kept and
    /// the next run resumes after them.
    Interrupted,
}

/// Everything the terminal summary needs.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub completion: Completion,
    pub report: Report,
    pub paths: ReportPaths,
}

impl RunOutcome {
    pub fn is_interrupted(&self) -> bool {
        self.completion == Completion::Interrupted
    }
}

/// Open the SQLite store and HTTP source named by `config`, run, and close
/// the store whatever the outcome.
pub async fn run(config: &HarvestConfig, channel: &str) -> Result<RunOutcome, HarvestError> {
    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    info!(path = %config.storage.database_path, "store opened");

    let outcome = match HttpSource::new(&config.source) {
        Ok(source) => {
            run_with(
                Arc::new(source),
                store.clone(),
                config,
                channel,
                crate::shutdown::signal(),
            )
            .await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close store cleanly");
    }
    outcome
}

/// Harvest `channel` until caught up or until `shutdown` resolves, then
/// report on whatever the store holds.
pub async fn run_with(
    source: Arc<dyn SourceAdapter>,
    store: Arc<dyn MessageStore>,
    config: &HarvestConfig,
    channel: &str,
    shutdown: impl Future<Output = ()>,
) -> Result<RunOutcome, HarvestError> {
    match source.health_check().await {
        Ok(HealthStatus::Healthy) => debug!(source = source.name(), "source healthy"),
        Ok(status) => warn!(source = source.name(), ?status, "source reports degraded health"),
        Err(e) => warn!(source = source.name(), error = %e, "source health check failed"),
    }

    let ctx = HarvestContext::new(source, store.clone(), config);
    let completion = tokio::select! {
        result = harvest_channel(&ctx, channel) => Completion::CaughtUp(result?),
        () = shutdown => {
            warn!(channel, "ingestion interrupted, reporting on stored messages");
            Completion::Interrupted
        }
    };

    let title = match &completion {
        Completion::CaughtUp(summary) => summary.channel.as_str(),
        Completion::Interrupted => channel,
    };
    let report = AggregationReporter::new(store.as_ref())
        .build(Some(title), config.report.top_k)
        .await?;
    let paths = write_report(&report, &config.report).await?;

    Ok(RunOutcome {
        completion,
        report,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use harvest_core::DomainCount;
    use harvest_test_utils::{MockSource, MockStore, TempStore, item};

    fn config(output_dir: &std::path::Path) -> HarvestConfig {
        let mut config = HarvestConfig::default();
        config.ingest.batch_size = 2;
        config.ingest.page_pause_ms = 0;
        config.report.output_dir = output_dir.to_string_lossy().to_string();
        config
    }

    async fn seeded_source() -> Arc<MockSource> {
        let source = Arc::new(MockSource::new("@news", "News"));
        source
            .push_items([
                item(1, "see https://example.com/a"),
                item(2, "mirror at example.com and https://test.com"),
                item(3, "nothing here"),
            ])
            .await;
        source
    }

    #[tokio::test]
    async fn caught_up_run_writes_report() {
        let out = tempfile::TempDir::new().unwrap();
        let temp = TempStore::new().await.unwrap();
        let source = seeded_source().await;

        let outcome = run_with(
            source,
            temp.store.clone(),
            &config(out.path()),
            "@news",
            std::future::pending(),
        )
        .await
        .unwrap();

        match &outcome.completion {
            Completion::CaughtUp(summary) => {
                assert_eq!(summary.channel, "News");
                assert_eq!(summary.stored, 3);
            }
            Completion::Interrupted => panic!("run should have caught up"),
        }
        assert_eq!(
            outcome.report.rows,
            vec![DomainCount::new("example.com", 2), DomainCount::new("test.com", 1)]
        );
        assert_eq!(outcome.report.channel.as_deref(), Some("News"));

        let markdown = std::fs::read_to_string(&outcome.paths.markdown).unwrap();
        assert!(markdown.contains("| example.com | 2 |"));
        assert!(outcome.paths.chart.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_keeps_stored_pages_and_still_reports() {
        let out = tempfile::TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        let source = seeded_source().await;
        let mut config = config(out.path());
        config.ingest.page_pause_ms = 2_000;

        let outcome = run_with(
            source,
            store.clone(),
            &config,
            "@news",
            tokio::time::sleep(Duration::from_secs(1)),
        )
        .await
        .unwrap();

        assert!(outcome.is_interrupted());
        // Only the newest page (ids 3 and 2) landed before the signal.
        assert_eq!(store.ids("News").await, vec![2, 3]);
        assert_eq!(
            outcome.report.rows,
            vec![DomainCount::new("example.com", 1), DomainCount::new("test.com", 1)]
        );
        assert_eq!(outcome.report.channel.as_deref(), Some("@news"));
    }

    #[tokio::test]
    async fn gateway_page_of_invalid_items_does_not_end_the_run() {
        use harvest_config::model::SourceConfig;
        use serde_json::json;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/news"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1001, "title": "News"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .and(query_param("max_id", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    {"id": 9, "date": "not a date"},
                    {"id": 8, "date": "not a date"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .and(query_param("max_id", "8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    {"id": 7, "text": "older post https://example.com/x", "date": "2024-05-01T10:00:07Z"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .and(query_param("max_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
            .mount(&server)
            .await;

        let out = tempfile::TempDir::new().unwrap();
        let temp = TempStore::new().await.unwrap();
        let source = HttpSource::new(&SourceConfig {
            base_url: server.uri(),
            api_token: None,
            request_timeout_secs: 5,
        })
        .unwrap();

        let outcome = run_with(
            Arc::new(source),
            temp.store.clone(),
            &config(out.path()),
            "news",
            std::future::pending(),
        )
        .await
        .unwrap();

        match &outcome.completion {
            Completion::CaughtUp(summary) => assert_eq!(summary.stored, 1),
            Completion::Interrupted => panic!("run should have caught up"),
        }
        assert!(temp.store.get_message("News", 7).await.unwrap().is_some());
        assert_eq!(outcome.report.rows, vec![DomainCount::new("example.com", 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_skip_the_report() {
        let out = tempfile::TempDir::new().unwrap();
        let store = Arc::new(MockStore::new());
        let source = Arc::new(MockSource::new("@news", "News"));
        let mut config = config(out.path());
        config.retry.max_attempts = Some(2);

        let err = run_with(source, store, &config, "@unknown", std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::RetriesExhausted { attempts: 2, .. }));
        assert!(!out.path().join("result.md").exists());
    }
}
