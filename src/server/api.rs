use axum::{
    extract::{ Request, State },
    http::{ HeaderMap, StatusCode },
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use governor::{ clock::DefaultClock, state::{ InMemoryState, NotKeyed }, Quota, RateLimiter };
use log::{ error, warn };
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::timeout::TimeoutLayer;

use crate::agent::{ QueryMode, SathiAgent };
use crate::error::AgentError;
use crate::models::api::{ DirectoryRequest, DirectoryResponse, ErrorBody, QueryRequest, QueryResponse };

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const API_KEY_HEADER: &str = "X-API-Key";

type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AppState {
    agent: Arc<SathiAgent>,
    api_key: Option<String>,
    limiter: Arc<GlobalLimiter>,
}

impl AppState {
    pub fn new(agent: Arc<SathiAgent>, api_key: Option<String>, rate_limit_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(rate_limit_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            agent,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let api = Router::new()
        .route("/chat", post(chat_handler))
        .route("/health/query", post(health_query_handler))
        .route("/health/nearby", post(health_nearby_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(api)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(cors)
        .with_state(state)
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AgentError::Validation(_) => StatusCode::BAD_REQUEST,
            AgentError::AiUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::Transcription(_) | AgentError::TranscriptionTimeout { .. } =>
                StatusCode::BAD_GATEWAY,
            AgentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("request_failed status={} error={:?}", status.as_u16(), self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.limiter.check().is_err() {
        warn!("Global request rate limit exceeded for {}", request.uri().path());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody { error: "Too many requests".into() }),
        ).into_response();
    }
    next.run(request).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(required) = &state.api_key {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(required.as_str()) {
            warn!("{}: bad or missing API key", request.uri().path());
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody { error: "Unauthorized".into() }),
            ).into_response();
        }
    }
    next.run(request).await
}

fn user_id(headers: &HeaderMap) -> Result<String, AgentError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AgentError::validation("X-User-Id header is required"))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>
) -> Result<Json<QueryResponse>, AgentError> {
    let user_id = user_id(&headers)?;
    let response = state.agent.handle_query(&user_id, request, QueryMode::General).await?;
    Ok(Json(response))
}

async fn health_query_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>
) -> Result<Json<QueryResponse>, AgentError> {
    let user_id = user_id(&headers)?;
    let response = state.agent.handle_query(&user_id, request, QueryMode::Health).await?;
    Ok(Json(response))
}

async fn health_nearby_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DirectoryRequest>
) -> Result<Json<DirectoryResponse>, AgentError> {
    user_id(&headers)?;
    let response = state.agent.directory_facilities(&request.pincode).await?;
    Ok(Json(response))
}
