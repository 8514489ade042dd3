//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/health` - Health check (public)
//! - `/api/session` - Identity carried by the bearer token
//! - `/api/ai/*` - Screenshot classification and analysis, persona chat
//! - `/api/images/compress` - Image downscaling and JPEG re-encoding
//!
//! Everything except the health check requires `Authorization: Bearer <jwt>`.
//! All failures leave the service as `{"error": "...", "status": "error"}`.

pub mod analysis;
pub mod extract;
pub mod health;
pub mod images;
pub mod session;

use axum::{
    extract::DefaultBodyLimit, http::StatusCode, middleware::from_fn_with_state, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use crate::middleware::{auth_middleware, cors_layer, handle_errors, panic_response};
use crate::models::AppState;
use crate::types::AppError;

/// Ten base64 screenshots plus JSON overhead.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Create the main application router
///
/// Layer order, outermost first: CORS, tracing, error envelope, panic
/// capture. Authentication runs per matched protected route.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let protected = Router::new()
        .merge(session::router(state.clone()))
        .merge(analysis::router(state.clone()))
        .merge(images::router(state.clone()))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::router(state.clone()))
        .merge(protected)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.config.mode, handle_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server))
}

async fn not_found() -> AppError {
    AppError::operational("Not found", StatusCode::NOT_FOUND)
}

async fn method_not_allowed() -> AppError {
    AppError::operational("Method not allowed", StatusCode::METHOD_NOT_ALLOWED)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AiConfig, AuthConfig, Config, DatabaseConfig, RuntimeMode, ServerConfig};
    use crate::db::{Database, PoolLifecycle};
    use crate::jwt::JwtKeys;
    use crate::llm::provider::testing::{gateway, ScriptedProvider};
    use crate::utils::image::fixtures::png;

    const SECRET: &str = "router-test-secret";

    fn state(mode: RuntimeMode, provider: Arc<ScriptedProvider>) -> AppState {
        let config = Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                // Nothing listens here; health checks fail fast.
                url: "postgres://postgres@127.0.0.1:1/postgres".to_string(),
                max_connections: 1,
                acquire_timeout: Duration::from_millis(200),
                monitor_interval: Duration::from_secs(30),
            },
            auth: AuthConfig {
                jwt_secret: SECRET.to_string(),
            },
            ai: AiConfig {
                provider: "gemini".to_string(),
                api_key: String::new(),
                base_url: "http://127.0.0.1:1".to_string(),
                default_model: "test-model".to_string(),
            },
            mode,
        };

        let lifecycle = Arc::new(PoolLifecycle::with_exit_hook(mode, Arc::new(|_: i32| {})));
        AppState {
            db: Database::connect_lazy(&config.database, lifecycle).unwrap(),
            ai: gateway(provider),
            jwt: Arc::new(JwtKeys::new(SECRET)),
            config: Arc::new(config),
        }
    }

    fn bearer() -> String {
        let token = JwtKeys::new(SECRET)
            .issue("u123", chrono::Duration::hours(1))
            .unwrap();
        format!("Bearer {}", token)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn app(mode: RuntimeMode, provider: Arc<ScriptedProvider>) -> Router {
        create_router(state(mode, provider))
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let (status, body) = send(
            app(RuntimeMode::Test, ScriptedProvider::replying("{}")),
            Request::get("/api/session").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "No token provided", "status": "error"}));
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let (status, body) = send(
            app(RuntimeMode::Production, ScriptedProvider::replying("{}")),
            Request::get("/api/session")
                .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Invalid token", "status": "error"}));
    }

    #[tokio::test]
    async fn test_session_returns_user_id() {
        let (status, body) = send(
            app(RuntimeMode::Test, ScriptedProvider::replying("{}")),
            Request::get("/api/session")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"userId": "u123"}));
    }

    #[tokio::test]
    async fn test_post_analysis_endpoint() {
        let provider = ScriptedProvider::replying(r#"{"tone": "playful", "themes": ["travel"]}"#);
        let (status, body) = send(
            app(RuntimeMode::Test, provider.clone()),
            post_json(
                "/api/ai/post",
                Some(&bearer()),
                json!({"post": {"text": "Lisbon sunsets hit different"}, "language": "pt"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "post");
        assert_eq!(body["result"]["tone"], "playful");
        assert_eq!(body["result"]["summary"], Value::Null);
        assert!(provider.last_call().prompt.contains("Portuguese"));
    }

    #[tokio::test]
    async fn test_classify_compresses_uploads() {
        let provider = ScriptedProvider::replying(r#"{"category": "avatar"}"#);
        let (status, body) = send(
            app(RuntimeMode::Test, provider.clone()),
            post_json(
                "/api/ai/classify",
                Some(&bearer()),
                json!({"images": [{"data": STANDARD.encode(png(1600, 900)), "mimeType": "image/png"}]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "profileClassification");
        assert_eq!(body["result"]["category"], "avatar");

        let call = provider.last_call();
        assert_eq!(call.images.len(), 1);
        assert_eq!(call.images[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_persona_reply_endpoint() {
        let (status, body) = send(
            app(RuntimeMode::Test, ScriptedProvider::replying("sounds fun!")),
            post_json(
                "/api/ai/persona-reply",
                Some(&bearer()),
                json!({"message": "Want to grab ramen?", "history": []}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"reply": "sounds fun!"}));
    }

    #[tokio::test]
    async fn test_validation_failure_is_operational() {
        let provider = ScriptedProvider::replying("{}");
        let (status, body) = send(
            app(RuntimeMode::Production, provider.clone()),
            post_json("/api/ai/persona-reply", Some(&bearer()), json!({"message": ""})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().starts_with("message:"));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ai_failure_is_masked_in_production() {
        let (status, body) = send(
            app(RuntimeMode::Production, ScriptedProvider::failing("quota for key sk-123 exceeded")),
            post_json("/api/ai/post", Some(&bearer()), json!({"post": {"text": "hi"}})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error", "status": "error"}));
    }

    #[tokio::test]
    async fn test_ai_failure_is_visible_in_development() {
        let (status, body) = send(
            app(RuntimeMode::Development, ScriptedProvider::failing("quota exceeded")),
            post_json("/api/ai/post", Some(&bearer()), json!({"post": {"text": "hi"}})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "quota exceeded");
    }

    #[tokio::test]
    async fn test_compress_endpoint() {
        let (status, body) = send(
            app(RuntimeMode::Test, ScriptedProvider::replying("{}")),
            post_json(
                "/api/images/compress",
                Some(&bearer()),
                json!({"image": {"data": STANDARD.encode(png(800, 400))}, "maxDimension": 200, "quality": 60}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mimeType"], "image/jpeg");
        let jpeg = STANDARD.decode(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(body["size"], jpeg.len());
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_envelope() {
        let (status, body) = send(
            app(RuntimeMode::Production, ScriptedProvider::replying("{}")),
            Request::get("/api/nope").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found", "status": "error"}));
    }

    #[tokio::test]
    async fn test_wrong_method_uses_error_envelope() {
        let (status, body) = send(
            app(RuntimeMode::Production, ScriptedProvider::replying("{}")),
            Request::get("/api/ai/post")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed", "status": "error"}));

        let (status, body) = send(
            app(RuntimeMode::Production, ScriptedProvider::replying("{}")),
            Request::delete("/api/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let (status, body) = send(
            app(RuntimeMode::Development, ScriptedProvider::replying("{}")),
            Request::get("/api/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], "disconnected");
        assert_eq!(body["status"], "degraded");
    }
}
