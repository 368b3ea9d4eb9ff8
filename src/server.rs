//! HTTP boundary: thin handlers over the decision engine.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::engine::{DecisionEngine, EmailSubmission, ScanError};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
}

pub fn create_router(engine: Arc<DecisionEngine>) -> Router {
    // The browser extension calls this API cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status))
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(AppState { engine })
}

pub async fn run(bind: &str, engine: Arc<DecisionEngine>) -> Result<()> {
    let app = create_router(engine);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    log::info!("API server listening on http://{bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info!("Shutdown signal received");
    }
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "MailWatch scam detector",
        "model_loaded": state.engine.model_loaded(),
    }))
}

async fn predict(
    State(state): State<AppState>,
    Json(submission): Json<EmailSubmission>,
) -> Response {
    match state.engine.scan(&submission) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = match self {
            ScanError::EmptyInput => StatusCode::BAD_REQUEST,
            ScanError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ScanError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::scorer::TextScorer;
    use crate::trust::{TrustEntry, TrustRegistry};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedScorer(f64);

    impl TextScorer for FixedScorer {
        fn score(&self, _text: &str) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    fn router(scorer: Option<Arc<dyn TextScorer>>) -> Router {
        let trust = TrustRegistry::new(vec![TrustEntry {
            domain: "google.com".to_string(),
            allowed_senders: vec![],
        }]);
        let engine = DecisionEngine::new(trust, scorer, Arc::new(MemoryAuditLog::new()));
        create_router(Arc::new(engine))
    }

    fn post_predict(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_reports_model_state() {
        let app = router(None);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["model_loaded"], false);
    }

    #[tokio::test]
    async fn test_predict_returns_scoring_result() {
        let app = router(Some(Arc::new(FixedScorer(0.9))));
        let response = app
            .oneshot(post_predict(json!({
                "sender": "a@evil.com",
                "subject": "You won",
                "body": "claim your prize"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["scam_probability"], 0.9);
        assert_eq!(json["label"], 1);
        assert_eq!(json["risk_level"], "High");
        assert_eq!(json["sender_domain"], "evil.com");
        assert_eq!(json["trusted_sender"], false);
    }

    #[tokio::test]
    async fn test_predict_applies_trust_override() {
        let app = router(Some(Arc::new(FixedScorer(0.9))));
        let response = app
            .oneshot(post_predict(json!({
                "sender": "no-reply@google.com",
                "subject": "Security alert",
                "body": "new sign-in"
            })))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["scam_probability"], 0.18);
        assert_eq!(json["label"], 0);
        assert_eq!(json["risk_level"], "Low");
        assert_eq!(json["trusted_sender"], true);
    }

    #[tokio::test]
    async fn test_empty_submission_is_bad_request() {
        let app = router(Some(Arc::new(FixedScorer(0.9))));
        let response = app.oneshot(post_predict(json!({}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Empty email text");
    }

    #[tokio::test]
    async fn test_missing_model_is_service_unavailable() {
        let app = router(None);
        let response = app
            .oneshot(post_predict(json!({ "subject": "hello" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Model not loaded");
    }
}
