//! HTTP request execution shared by every endpoint
//!
//! Sends a signed request, logs it, maps transport failures and HTTP status
//! codes onto [`ApiError`], and retries transient failures with exponential
//! backoff. Request construction and signing stay with the caller.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{ApiError, Violation};
use crate::utils::log_sanitizer::truncate_for_log;

/// Component prefix of every log line emitted by the client.
const LOG_TARGET: &str = "myrasec";

/// Upper bound for a server supplied `Retry-After`.
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// HTTP helper functions
pub struct HttpUtils;

impl HttpUtils {
    /// Send a request and return status code plus response text.
    ///
    /// HTTP 429 maps to [`ApiError::RateLimited`], 502/503/504 to
    /// [`ApiError::NetworkError`]. Every other status is returned to the
    /// caller for [`check_status`](Self::check_status).
    pub async fn execute_request(
        request_builder: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<(u16, String), ApiError> {
        log::debug!("[{LOG_TARGET}] {method} {path}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                ApiError::NetworkError {
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{LOG_TARGET}] Response Status: {status_code}");

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{LOG_TARGET}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ApiError::RateLimited {
                retry_after,
                raw_message: Some(body),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{LOG_TARGET}] Server error (HTTP {status_code})");
            return Err(ApiError::NetworkError {
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkError {
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{LOG_TARGET}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Send a request, retrying transient failures.
    ///
    /// Only [`ApiError::is_retryable`] errors are retried. Backoff doubles
    /// from 100ms up to 10s; a `Retry-After` header wins when present.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        method: &str,
        path: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ApiError> {
        if max_retries == 0 {
            return Self::execute_request(request_builder, method, path).await;
        }

        let mut last_error = None;

        for attempt in 0..=max_retries {
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{LOG_TARGET}] Cannot clone request, disabling retry");
                return Self::execute_request(request_builder, method, path).await;
            };

            match Self::execute_request(req, method, path).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < max_retries && e.is_retryable() => {
                    let delay = retry_delay(&e, attempt);
                    log::warn!(
                        "[{}] {} {} failed (attempt {}/{}), retrying in {:.1}s: {}",
                        LOG_TARGET,
                        method,
                        path,
                        attempt + 1,
                        max_retries,
                        delay.as_secs_f32(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::NetworkError {
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }

    /// Map a non-success status or an `error: true` envelope to an error.
    pub fn check_status(status: u16, response_text: &str, path: &str) -> Result<(), ApiError> {
        let envelope = serde_json::from_str::<ErrorEnvelope>(response_text).ok();

        if let Some(envelope) = &envelope
            && envelope.error
            && !envelope.violation_list.is_empty()
        {
            return Err(ApiError::Violation {
                violations: envelope.violation_list.clone(),
            });
        }

        let raw_message = || {
            if response_text.is_empty() {
                None
            } else {
                Some(truncate_for_log(response_text))
            }
        };

        match status {
            200..=299 => match envelope {
                Some(ErrorEnvelope { error: true, .. }) => Err(ApiError::Unknown {
                    status: Some(status),
                    raw_message: truncate_for_log(response_text),
                }),
                _ => Ok(()),
            },
            401 | 403 => Err(ApiError::InvalidCredentials {
                raw_message: raw_message(),
            }),
            404 => Err(ApiError::NotFound {
                path: path.to_string(),
                raw_message: raw_message(),
            }),
            _ => Err(ApiError::Unknown {
                status: Some(status),
                raw_message: truncate_for_log(response_text),
            }),
        }
    }

    /// Parse a JSON response body.
    pub fn parse_json<T>(response_text: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{LOG_TARGET}] JSON parse failed: {e}");
            log::error!(
                "[{LOG_TARGET}] Raw response: {}",
                truncate_for_log(response_text)
            );
            ApiError::ParseError {
                detail: e.to_string(),
            }
        })
    }
}

/// Minimal view of the response envelope used for error detection.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    violation_list: Vec<Violation>,
}

fn retry_delay(error: &ApiError, attempt: u32) -> Duration {
    if let ApiError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms, 200ms, 400ms, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(10_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- check_status ----

    #[test]
    fn success_passes() {
        assert!(HttpUtils::check_status(200, r#"{"error":false,"list":[]}"#, "/domains").is_ok());
    }

    #[test]
    fn empty_success_body_passes() {
        assert!(HttpUtils::check_status(204, "", "/domains").is_ok());
    }

    #[test]
    fn violations_map_to_violation_error() {
        let body = r#"{"error":true,"violationList":[{"propertyPath":"ttl","message":"too small"}]}"#;
        let err = HttpUtils::check_status(400, body, "/domain/1/dns-records").unwrap_err();
        match err {
            ApiError::Violation { violations } => {
                assert_eq!(violations[0].property_path.as_deref(), Some("ttl"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn violations_in_ok_response_are_errors() {
        let body = r#"{"error":true,"violationList":[{"message":"duplicate"}]}"#;
        assert!(matches!(
            HttpUtils::check_status(200, body, "/tags"),
            Err(ApiError::Violation { .. })
        ));
    }

    #[test]
    fn auth_statuses_map_to_invalid_credentials() {
        assert!(matches!(
            HttpUtils::check_status(401, "", "/domains"),
            Err(ApiError::InvalidCredentials { raw_message: None })
        ));
        assert!(matches!(
            HttpUtils::check_status(403, "denied", "/domains"),
            Err(ApiError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn not_found_keeps_path() {
        match HttpUtils::check_status(404, "", "/tags/9") {
            Err(ApiError::NotFound { path, .. }) => assert_eq!(path, "/tags/9"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn other_status_is_unknown() {
        assert!(matches!(
            HttpUtils::check_status(500, "boom", "/domains"),
            Err(ApiError::Unknown {
                status: Some(500),
                ..
            })
        ));
    }

    // ---- backoff ----

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
    }

    #[test]
    fn backoff_capped_at_10s() {
        assert_eq!(backoff_delay(7), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn retry_after_is_capped() {
        let e = ApiError::RateLimited {
            retry_after: Some(120),
            raw_message: None,
        };
        assert_eq!(retry_delay(&e, 0), Duration::from_secs(30));
    }

    // ---- parse_json ----

    #[test]
    fn parse_json_invalid() {
        let result: Result<serde_json::Value, ApiError> = HttpUtils::parse_json("not json");
        assert!(matches!(result, Err(ApiError::ParseError { .. })));
    }
}
