use crate::api::routes::AppState;
use crate::observability::MetricsRecorder;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

/// GET /health - Liveness with cache status
#[tracing::instrument(skip(state))]
pub async fn liveness(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health_checker.liveness().await)
}

/// GET /health/ready - Readiness probe
#[tracing::instrument(skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.health_checker.readiness().await;

    let code = if status.status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.limiters.report_visitors();
    MetricsRecorder::export().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{send, TestApp};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_without_cache() {
        let app = TestApp::new();
        let (status, body) = send(&app.router(), "GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "daily-notes-api");
        assert_eq!(body["cache"], "disabled");
    }

    #[tokio::test]
    async fn test_metrics_exposes_limiter_series() {
        let app = TestApp::new();
        let router = app.router();
        send(&router, "POST", "/api/v1/auth/login", None, None).await;

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("rate_limit_decisions_total"));
        assert!(text.contains("rate_limit_visitors"));
    }
}
