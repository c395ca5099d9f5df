//! HTTP routes and handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use feedguard_classifiers::moderate_images;
use feedguard_core::{ImageModerationReport, ModerationRequest, ModerationVerdict, PromptVerdict, TopicTagResult};
use feedguard_topics::DEFAULT_MAX_TOPICS;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tokio::sync::SemaphorePermit;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/moderate", post(moderate_prompt))
        .route("/moderate-post", post(moderate_post))
        .route("/tag-topics-smart", post(tag_topics_smart))
        .route("/moderate-images", post(moderate_image_paths))
        .fallback(fallback)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct PostRequest {
    text: String,
    #[serde(default)]
    source_links: Vec<String>,
    #[serde(default = "default_allow_mild_profanity")]
    allow_mild_profanity: bool,
}

fn default_allow_mild_profanity() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TagRequest {
    text: String,
    #[serde(default)]
    existing_topics: Vec<String>,
    #[serde(default = "default_max_topics")]
    max_topics: usize,
}

fn default_max_topics() -> usize {
    DEFAULT_MAX_TOPICS
}

#[derive(Debug, Deserialize)]
struct ImagesRequest {
    image_paths: Vec<String>,
    #[serde(default)]
    threshold: Option<f32>,
}

/// SAFE/UNSAFE gate for image-generation prompts
async fn moderate_prompt(
    State(state): State<AppState>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<PromptVerdict>, AppError> {
    let _permit = acquire(&state).await?;
    let started = Instant::now();

    let verdict = state.moderator.is_prompt_safe(&req.prompt).await;

    record_latency("moderate", started);
    info!(
        request_id = %Uuid::new_v4(),
        classification = %verdict.classification,
        fallback = verdict.fallback_used,
        "Prompt moderated"
    );
    Ok(Json(verdict))
}

/// Full post moderation: text plus links
async fn moderate_post(
    State(state): State<AppState>,
    Json(req): Json<PostRequest>,
) -> Result<Json<ModerationVerdict>, AppError> {
    let _permit = acquire(&state).await?;
    let started = Instant::now();

    let request = ModerationRequest::new(req.text, &req.source_links, req.allow_mild_profanity);
    let verdict = state.moderator.moderate_post(&request).await;

    record_latency("moderate_post", started);
    info!(
        request_id = %Uuid::new_v4(),
        safe = verdict.safe,
        labels = verdict.labels.len(),
        fallback = verdict.fallback_used,
        "Post moderated"
    );
    Ok(Json(verdict))
}

async fn tag_topics_smart(
    State(state): State<AppState>,
    Json(req): Json<TagRequest>,
) -> Result<Json<TopicTagResult>, AppError> {
    let _permit = acquire(&state).await?;
    let started = Instant::now();

    let result = state
        .tagger
        .tag_topics(&req.text, &req.existing_topics, req.max_topics)
        .await?;

    record_latency("tag_topics", started);
    debug!(selected = ?result.selected, new = ?result.new, "Topics tagged");
    Ok(Json(result))
}

async fn moderate_image_paths(
    State(state): State<AppState>,
    Json(req): Json<ImagesRequest>,
) -> Result<Json<ImageModerationReport>, AppError> {
    let _permit = acquire(&state).await?;
    let started = Instant::now();

    let threshold = req.threshold.unwrap_or(state.settings.image_threshold);
    let report = moderate_images(state.image_scorer.as_deref(), &req.image_paths, threshold).await;

    record_latency("moderate_images", started);
    Ok(Json(report))
}

async fn fallback() -> Response {
    AppError::NotFound.into_response()
}

async fn acquire(state: &AppState) -> Result<SemaphorePermit<'_>, AppError> {
    state
        .limiter
        .acquire()
        .await
        .map_err(|_| AppError::Unavailable("request limiter closed".to_string()))
}

fn record_latency(route: &'static str, started: Instant) {
    metrics::histogram!("feedguard_request_latency_us", "route" => route)
        .record(started.elapsed().as_micros() as f64);
}

/// Error handling
#[derive(Debug)]
enum AppError {
    NotFound,
    TopicMinting(String),
    Unavailable(String),
    Internal(String),
}

impl From<feedguard_core::Error> for AppError {
    fn from(err: feedguard_core::Error) -> Self {
        match err {
            feedguard_core::Error::TopicMinting(msg) => AppError::TopicMinting(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::TopicMinting(msg) => {
                error!("Topic minting failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("new-topic minting failed: {}", msg))
            }
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
