use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use raidlog_domain::{DeliveryTransport, TransportResponse};

/// Shortest wait honored after a rate-limit response.
pub const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);
/// Longest wait honored; larger server values are capped to this.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

pub struct WebhookTransport {
    client: Client,
    url: String,
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>, request_timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds.max(3)))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DeliveryTransport for WebhookTransport {
    async fn post(&self, body: &Value) -> Result<TransportResponse> {
        let response = self.client.post(&self.url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(TransportResponse::Accepted);
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(TransportResponse::RateLimited {
                retry_after: retry_after(&headers, &text),
            });
        }
        Ok(TransportResponse::Rejected {
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Delay requested by a 429: the `Retry-After` header in seconds, else the JSON body's
/// `retry_after` in seconds, clamped to [`MIN_RETRY_AFTER`]..=[`MAX_RETRY_AFTER`].
pub fn retry_after(headers: &HeaderMap, body: &str) -> Duration {
    let from_header = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok());
    let from_body = || {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("retry_after").and_then(Value::as_f64))
    };
    let seconds = from_header.or_else(from_body).unwrap_or(0.0);
    if !seconds.is_finite() || seconds <= 0.0 {
        return MIN_RETRY_AFTER;
    }
    let capped = seconds.min(MAX_RETRY_AFTER.as_secs_f64());
    Duration::try_from_secs_f64(capped)
        .unwrap_or(MAX_RETRY_AFTER)
        .max(MIN_RETRY_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn header_wins_over_body() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("5"));
        assert_eq!(
            retry_after(&headers, r#"{"retry_after": 12.5}"#),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn body_and_floor_apply_without_header() {
        let headers = HeaderMap::new();
        assert_eq!(
            retry_after(&headers, r#"{"retry_after": 2.5, "global": false}"#),
            Duration::from_millis(2500)
        );
        assert_eq!(retry_after(&headers, r#"{"retry_after": 0.2}"#), MIN_RETRY_AFTER);
        assert_eq!(retry_after(&headers, "rate limited"), MIN_RETRY_AFTER);
    }

    #[test]
    fn oversized_values_are_capped() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("1e30"));
        assert_eq!(retry_after(&headers, ""), MAX_RETRY_AFTER);
        assert_eq!(
            retry_after(&HeaderMap::new(), r#"{"retry_after": 1e300}"#),
            MAX_RETRY_AFTER
        );
    }
}
