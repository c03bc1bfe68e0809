// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/JSON gateway source adapter for the Harvest ingestion pipeline.
//!
//! This crate implements [`SourceAdapter`] over a small gateway protocol:
//! channel resolution, bounded message pages, and reply sub-threads. Pages
//! are always handed to the pipeline newest-first.

pub mod client;
pub mod types;

use async_trait::async_trait;
use harvest_config::model::SourceConfig;
use harvest_core::{
    AdapterType, ChannelHandle, HarvestError, HealthStatus, MessageItem, PageOrder, PageRequest,
    PluginAdapter, SourceAdapter,
};
use tracing::{debug, info, warn};

use crate::client::GatewayClient;
use crate::types::{ChannelInfo, MessagesResponse, WireMessage};

/// Gateway-backed message source.
pub struct HttpSource {
    client: GatewayClient,
}

impl HttpSource {
    /// Creates a source from the `[source]` configuration section.
    pub fn new(config: &SourceConfig) -> Result<Self, HarvestError> {
        let client = GatewayClient::new(config)?;
        info!(base_url = %config.base_url, "HTTP gateway source initialized");
        Ok(Self { client })
    }

    async fn fetch_items(&self, url: reqwest::Url) -> Result<GatewayPage, HarvestError> {
        let response: MessagesResponse = self.client.get_json(url).await?;
        let order = response.order.unwrap_or(PageOrder::NewestFirst);
        let raw_len = response.messages.len();
        let raw_ids = response
            .messages
            .iter()
            .filter_map(|value| value.get("id").and_then(serde_json::Value::as_i64))
            .filter(|id| *id > 0)
            .collect();
        let mut items = decode_items(response.messages);
        if order == PageOrder::OldestFirst {
            items.reverse();
        }
        Ok(GatewayPage {
            items,
            raw_len,
            raw_ids,
            order,
        })
    }
}

/// A decoded page plus what the gateway actually sent.
struct GatewayPage {
    items: Vec<MessageItem>,
    raw_len: usize,
    /// Positive ids of every raw entry, valid or not.
    raw_ids: Vec<i64>,
    order: PageOrder,
}

/// Narrow `request` past the raw ids of a page that held nothing usable.
///
/// Returns `None` when the ids cannot move the bounds, e.g. when none of the
/// entries carried a positive id.
fn skip_past(request: PageRequest, order: PageOrder, raw_ids: &[i64]) -> Option<PageRequest> {
    match order {
        PageOrder::OldestFirst => raw_ids
            .iter()
            .copied()
            .max()
            .filter(|&id| id > request.min_id)
            .map(|min_id| PageRequest { min_id, ..request }),
        PageOrder::NewestFirst => raw_ids
            .iter()
            .copied()
            .min()
            .filter(|&id| request.max_id == 0 || id < request.max_id)
            .map(|max_id| PageRequest { max_id, ..request }),
    }
}

/// Decode and validate raw page entries, dropping the ones that fail.
fn decode_items(raw: Vec<serde_json::Value>) -> Vec<MessageItem> {
    raw.into_iter()
        .filter_map(|value| {
            let decoded = serde_json::from_value::<WireMessage>(value)
                .map_err(|e| HarvestError::transient("undecodable message", e))
                .and_then(|wire| MessageItem::from(wire).validate());
            match decoded {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "dropping invalid message from gateway");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl PluginAdapter for HttpSource {
    fn name(&self) -> &str {
        "http-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, HarvestError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HarvestError> {
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for HttpSource {
    fn page_order(&self) -> PageOrder {
        PageOrder::NewestFirst
    }

    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, HarvestError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(HarvestError::Fatal {
                message: "channel identifier is empty".into(),
            });
        }
        let info: ChannelInfo = self
            .client
            .get_json(self.client.url(&["channels", identifier], &[]))
            .await?;
        let handle = ChannelHandle::new(info.id.to_string(), info.title)?;
        debug!(identifier, id = %handle.id, title = %handle.title, "channel resolved");
        Ok(handle)
    }

    async fn fetch_page(
        &self,
        channel: &ChannelHandle,
        request: PageRequest,
    ) -> Result<Vec<MessageItem>, HarvestError> {
        let mut request = request;
        loop {
            let url = self.client.url(
                &["channels", &channel.id, "messages"],
                &[
                    ("min_id", request.min_id.to_string()),
                    ("max_id", request.max_id.to_string()),
                    ("limit", request.limit.to_string()),
                ],
            );
            let page = self.fetch_items(url).await?;
            // An empty result means the end of history, so a page whose
            // entries were all dropped must not be handed on as one.
            if page.raw_len == 0 || !page.items.is_empty() {
                return Ok(page.items);
            }
            match skip_past(request, page.order, &page.raw_ids) {
                Some(next) => {
                    warn!(
                        channel = %channel.title,
                        dropped = page.raw_len,
                        min_id = next.min_id,
                        max_id = next.max_id,
                        "page held no valid messages, skipping past it"
                    );
                    request = next;
                }
                None => {
                    return Err(HarvestError::Transient {
                        message: format!(
                            "page of {} entries for channel {} held no usable message id",
                            page.raw_len, channel.title
                        ),
                        source: None,
                    });
                }
            }
        }
    }

    async fn fetch_replies(
        &self,
        channel: &ChannelHandle,
        parent_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageItem>, HarvestError> {
        let parent = parent_id.to_string();
        let url = self.client.url(
            &["channels", &channel.id, "messages", &parent, "replies"],
            &[("limit", limit.to_string())],
        );
        Ok(self.fetch_items(url).await?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::FailureClass;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> HttpSource {
        HttpSource::new(&SourceConfig {
            base_url: server.uri(),
            api_token: None,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn channel() -> ChannelHandle {
        ChannelHandle::new("1001", "Rust News").unwrap()
    }

    #[tokio::test]
    async fn resolve_channel_returns_handle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/rustnews"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1001, "title": "Rust News"})),
            )
            .mount(&server)
            .await;

        let handle = source(&server).resolve_channel(" rustnews ").await.unwrap();
        assert_eq!(handle, channel());
    }

    #[tokio::test]
    async fn resolve_channel_rejects_empty_title_and_identifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x", "title": ""})))
            .mount(&server)
            .await;

        let src = source(&server);
        assert_eq!(src.resolve_channel("x").await.unwrap_err().class(), FailureClass::Fatal);
        assert_eq!(src.resolve_channel("  ").await.unwrap_err().class(), FailureClass::Fatal);
    }

    #[tokio::test]
    async fn fetch_page_sends_bounds_and_drops_invalid_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .and(query_param("min_id", "10"))
            .and(query_param("max_id", "0"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    {"id": 13, "text": "see https://example.com", "date": "2024-05-01T10:00:03Z", "reply_count": 2},
                    {"id": 0, "date": "2024-05-01T10:00:02Z"},
                    {"id": 12, "date": "not a date"},
                    {"id": 11, "date": "2024-05-01T10:00:01Z", "sender_id": 5}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = source(&server)
            .fetch_page(
                &channel(),
                PageRequest {
                    min_id: 10,
                    max_id: 0,
                    limit: 100,
                },
            )
            .await
            .unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![13, 11]);
        assert_eq!(items[0].reply_count, 2);
        assert_eq!(items[1].sender_id, Some(5));
    }

    #[tokio::test]
    async fn page_of_only_invalid_items_is_skipped_not_treated_as_the_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .and(query_param("max_id", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    {"id": 9, "date": "not a date"},
                    {"id": 0, "date": "2024-05-01T10:00:02Z"},
                    {"id": 8, "date": "not a date"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .and(query_param("max_id", "8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"id": 7, "date": "2024-05-01T10:00:01Z"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = source(&server)
            .fetch_page(
                &channel(),
                PageRequest {
                    min_id: 0,
                    max_id: 0,
                    limit: 3,
                },
            )
            .await
            .unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![7]);
    }

    #[tokio::test]
    async fn page_without_any_usable_id_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"id": 0, "date": "2024-05-01T10:00:02Z"}, {"text": "no id"}]
            })))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch_page(
                &channel(),
                PageRequest {
                    min_id: 0,
                    max_id: 0,
                    limit: 2,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.class(), FailureClass::Transient);
    }

    #[test]
    fn skip_past_moves_the_bound_in_page_order() {
        let request = PageRequest {
            min_id: 5,
            max_id: 0,
            limit: 10,
        };
        assert_eq!(
            skip_past(request, PageOrder::NewestFirst, &[40, 31]).map(|r| r.max_id),
            Some(31)
        );
        assert_eq!(
            skip_past(request, PageOrder::OldestFirst, &[6, 9]).map(|r| r.min_id),
            Some(9)
        );
        assert_eq!(skip_past(request, PageOrder::OldestFirst, &[3]), None);
        assert_eq!(skip_past(request, PageOrder::NewestFirst, &[]), None);

        let bounded = PageRequest { max_id: 20, ..request };
        assert_eq!(skip_past(bounded, PageOrder::NewestFirst, &[25]), None);
    }

    #[tokio::test]
    async fn oldest_first_pages_are_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "order": "oldest_first",
                "messages": [
                    {"id": 1, "date": "2024-05-01T10:00:01Z"},
                    {"id": 2, "date": "2024-05-01T10:00:02Z"}
                ]
            })))
            .mount(&server)
            .await;

        let items = source(&server)
            .fetch_page(
                &channel(),
                PageRequest {
                    min_id: 0,
                    max_id: 0,
                    limit: 2,
                },
            )
            .await
            .unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn fetch_replies_hits_thread_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/messages/13/replies"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"id": 900, "text": "nice", "date": "2024-05-01T11:00:00Z"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let replies = source(&server).fetch_replies(&channel(), 13, 50).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text.as_deref(), Some("nice"));
    }

    #[tokio::test]
    async fn rate_limit_surfaces_as_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch_page(
                &channel(),
                PageRequest {
                    min_id: 0,
                    max_id: 0,
                    limit: 10,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::RateLimited { wait } if wait.as_secs() == 3));
    }
}
