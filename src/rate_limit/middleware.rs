use crate::errors::AppError;
use crate::observability::MetricsRecorder;
use crate::rate_limit::limiter::{LimitKind, RateLimiters};
use crate::rate_limit::sliding_window::RateLimitDecision;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

/// Rate limiting for authenticated API routes
pub async fn rate_limit_middleware(
    State(limiters): State<RateLimiters>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&limiters, LimitKind::General, request, next).await
}

/// Auth-specific rate limiting middleware
pub async fn auth_rate_limit_middleware(
    State(limiters): State<RateLimiters>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&limiters, LimitKind::Auth, request, next).await
}

async fn enforce(limiters: &RateLimiters, kind: LimitKind, request: Request, next: Next) -> Response {
    let identifier = extract_identifier(&request);
    let decision = limiters.check(kind, &identifier);

    if let Some(retry_after) = decision.retry_after() {
        tracing::warn!(
            limiter = kind.as_str(),
            identifier = %identifier,
            limit = decision.limit,
            retry_after,
            "Rate limit exceeded"
        );
        MetricsRecorder::record_rate_limit_exceeded(kind.as_str());

        let reset = chrono::Utc::now().timestamp() + retry_after as i64;
        let mut response = AppError::RateLimited {
            limit: decision.limit,
            retry_after,
            reset,
        }
        .into_response();

        let headers = response.headers_mut();
        add_rate_limit_headers(headers, &decision);
        insert_header(headers, "x-ratelimit-reset", reset);
        return response;
    }

    let mut response = next.run(request).await;
    add_rate_limit_headers(response.headers_mut(), &decision);
    response
}

/// Derive the client identity: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer address.
fn extract_identifier(request: &Request) -> String {
    let headers = request.headers();

    if let Some(forwarded_for) = header_str(headers, "x-forwarded-for") {
        if let Some(ip) = forwarded_for.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    if let Some(real_ip) = header_str(headers, "x-real-ip") {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn add_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    // X-RateLimit-Limit: Maximum number of requests allowed in the window
    insert_header(headers, "x-ratelimit-limit", decision.limit);
    // X-RateLimit-Remaining: Number of requests remaining
    insert_header(headers, "x-ratelimit-remaining", decision.remaining);
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
