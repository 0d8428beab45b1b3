use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor, GovernorError,
    GovernorLayer,
};

use crate::config::Config;

pub type AuthRateLimitLayer = GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware, Body>;

/// Per-IP limiter for the unauthenticated account endpoints.
///
/// Allows a burst of `RATE_LIMIT_IP_MAX_REQUESTS` and refills one request
/// every `window / max_requests`, so the sustained rate matches the
/// configured window. Needs `ConnectInfo<SocketAddr>` on the request.
pub fn create_auth_rate_limiter(config: &Config) -> anyhow::Result<AuthRateLimitLayer> {
    let burst_size = config.rate_limit_ip_max_requests.max(1);
    let governor_conf = GovernorConfigBuilder::default()
        .period(replenish_interval(
            burst_size,
            config.rate_limit_ip_window_seconds,
        ))
        .burst_size(burst_size)
        .key_extractor(PeerIpKeyExtractor)
        .use_headers()
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?;

    Ok(GovernorLayer::new(Arc::new(governor_conf)).error_handler(rate_limit_error_handler))
}

fn replenish_interval(burst_size: u32, window_seconds: u64) -> Duration {
    let window = Duration::from_secs(window_seconds.max(1));
    (window / burst_size.max(1)).max(Duration::from_millis(1))
}

fn rate_limit_error_handler(error: GovernorError) -> Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::warn!(wait_time, "Rate limit exceeded");
            let mut response = json_error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again later",
                "TOO_MANY_REQUESTS",
                Some(wait_time),
            );
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to determine client address",
            "INTERNAL_SERVER_ERROR",
            None,
        ),
        GovernorError::Other { code, msg, headers } => {
            let mut response = json_error_response(
                code,
                &msg.unwrap_or_else(|| "Rate limit error".to_string()),
                "RATE_LIMIT_ERROR",
                None,
            );
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
    }
}

/// Same `{error, code, details}` shape that `AppError` renders.
fn json_error_response(
    status: StatusCode,
    message: &str,
    code: &str,
    retry_after: Option<u64>,
) -> Response<Body> {
    let details = retry_after
        .map(|secs| serde_json::json!({ "retry_after": secs }))
        .unwrap_or(serde_json::Value::Null);
    let body = serde_json::json!({
        "error": message,
        "code": code,
        "details": details,
    });

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(retry_after) = retry_after {
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(retry_after));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn config_with(max_requests: &str, window_seconds: &str) -> Config {
        let max_requests = max_requests.to_string();
        let window_seconds = window_seconds.to_string();
        Config::from_lookup(move |key| match key {
            "RATE_LIMIT_IP_MAX_REQUESTS" => Some(max_requests.clone()),
            "RATE_LIMIT_IP_WINDOW_SECONDS" => Some(window_seconds.clone()),
            _ => None,
        })
        .expect("config")
    }

    #[test]
    fn limiter_builds_from_config() {
        assert!(create_auth_rate_limiter(&config_with("15", "900")).is_ok());
    }

    #[test]
    fn limiter_tolerates_zero_values() {
        assert!(create_auth_rate_limiter(&config_with("0", "0")).is_ok());
    }

    #[test]
    fn replenish_interval_spreads_window_over_burst() {
        assert_eq!(replenish_interval(15, 900), Duration::from_secs(60));
        assert_eq!(replenish_interval(0, 0), Duration::from_secs(1));
        assert_eq!(replenish_interval(5000, 1), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn too_many_requests_renders_app_error_shape() {
        let response = rate_limit_error_handler(GovernorError::TooManyRequests {
            wait_time: 5,
            headers: None,
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("retry-after").and_then(|v| v.to_str().ok()),
            Some("5")
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "TOO_MANY_REQUESTS");
        assert_eq!(json["details"]["retry_after"], 5);
    }

    #[test]
    fn missing_peer_address_is_internal_error() {
        let response = rate_limit_error_handler(GovernorError::UnableToExtractKey);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTENT_TYPE).is_some());
    }

    #[test]
    fn other_errors_keep_status_and_headers() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-custom", HeaderValue::from_static("value"));

        let response = rate_limit_error_handler(GovernorError::Other {
            code: StatusCode::BAD_REQUEST,
            msg: Some("error with headers".to_string()),
            headers: Some(headers),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("x-custom").is_some());
    }
}
