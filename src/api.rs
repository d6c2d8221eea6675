//! REST API server for the credit-card assistant
//!
//! Exposes the orchestration loop over HTTP.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assistant::Assistant;
use crate::models::SessionId;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub input: Option<String>,
    /// UUID or any stable client key; omitted means the shared default session.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<Assistant>,
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(input) = req.input.filter(|i| !i.trim().is_empty()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "input must be a non-empty string".to_string(),
            }),
        ));
    };

    let session = match req.session_id.as_deref() {
        Some(key) if !key.trim().is_empty() => SessionId::from_client_key(key.trim()),
        _ => SessionId::default_session(),
    };

    info!(session_id = %session, chars = input.chars().count(), "Chat request");

    let reply = state.assistant.respond(session, &input).await;

    Ok(Json(ChatResponse {
        response: reply.text,
        session_id: session.to_string(),
    }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(assistant: Arc<Assistant>) -> Router {
    let state = ApiState { assistant };

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    assistant: Arc<Assistant>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(assistant);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SessionStore;
    use crate::model::{ModelResponse, ScriptedModel};
    use crate::tools::ToolRegistry;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router(responses: Vec<crate::Result<ModelResponse>>) -> (Router, Arc<Assistant>) {
        let assistant = Arc::new(Assistant::new(
            Arc::new(ScriptedModel::new(responses)),
            Arc::new(ToolRegistry::new()),
            Arc::new(SessionStore::default()),
            "SYSTEM",
        ));
        (create_router(assistant.clone()), assistant)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = router(vec![]);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_chat_round_trip_with_session() {
        let (app, assistant) = router(vec![Ok(ModelResponse::text("Hi! Which benefit do you want?"))]);
        let response = app
            .oneshot(post_json("/chat", serde_json::json!({"input": "hello", "session_id": "browser-tab-1"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"], "Hi! Which benefit do you want?");

        let session = SessionId::from_client_key("browser-tab-1");
        assert_eq!(json["session_id"], session.to_string());
        assert_eq!(assistant.sessions().transcript(session).len(), 2);
    }

    #[tokio::test]
    async fn test_chat_without_session_uses_default() {
        let (app, _) = router(vec![Ok(ModelResponse::text("ok"))]);
        let response = app
            .oneshot(post_json("/chat", serde_json::json!({"input": "hello"})))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["session_id"], SessionId::default_session().to_string());
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let (app, assistant) = router(vec![]);
        let response = app
            .oneshot(post_json("/chat", serde_json::json!({"input": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("non-empty"));
        assert_eq!(assistant.sessions().session_count(), 0);
    }
}
