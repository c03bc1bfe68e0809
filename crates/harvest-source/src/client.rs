// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the message gateway.
//!
//! Provides [`GatewayClient`], which builds request URLs, attaches the bearer
//! token, and maps HTTP outcomes onto the rate-limit / transient / fatal error
//! classes the retry controller understands. It never retries on its own.

use std::time::Duration;

use harvest_config::model::SourceConfig;
use harvest_core::HarvestError;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::ErrorBody;

/// Wait used when a 429 response carries no usable hint.
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(1);

/// Thin JSON-over-HTTP client for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    /// Creates a client from source settings.
    pub fn new(config: &SourceConfig) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            HarvestError::Config(format!("invalid source.base_url `{}`: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(HarvestError::Config(format!(
                "source.base_url `{}` cannot be used as a base URL",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| HarvestError::Config(format!("invalid source.api_token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| HarvestError::Fatal {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, base_url })
    }

    /// Build `{base}/{segments...}?{query}`; segments are percent-encoded.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// GET `url` and decode a JSON body of type `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, HarvestError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_builder() {
                HarvestError::Fatal {
                    message: format!("invalid request to {url}: {e}"),
                }
            } else {
                HarvestError::transient(format!("request to {url} failed"), e)
            }
        })?;

        let status = response.status();
        debug!(%url, status = %status, "gateway response received");

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| HarvestError::transient(format!("malformed response from {url}"), e));
        }

        let header_wait = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_seconds);
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

        Err(classify_status(status, header_wait, parsed, &body))
    }
}

/// Map a non-success status onto the pipeline's error classes.
fn classify_status(
    status: StatusCode,
    header_wait: Option<Duration>,
    body: ErrorBody,
    raw_body: &str,
) -> HarvestError {
    let detail = body.error.unwrap_or_else(|| raw_body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        let wait = header_wait
            .or_else(|| body.retry_after.and_then(seconds_to_duration))
            .unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
        warn!(wait_secs = wait.as_secs_f64(), "gateway rate limit hit");
        return HarvestError::RateLimited { wait };
    }

    // 408 and 425 ask the client to try the same request again later.
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_EARLY
    {
        return HarvestError::Transient {
            message: format!("gateway returned {status}: {detail}"),
            source: None,
        };
    }

    HarvestError::Fatal {
        message: format!("gateway returned {status}: {detail}"),
    }
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    raw.trim().parse::<f64>().ok().and_then(seconds_to_duration)
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}
