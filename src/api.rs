//! HTTP routing: HTML pages, JSON API and input validation.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::{AppResult, ValidationError};
use crate::history::CommentRecord;
use crate::rewrite::{RewriteEngine, RewriteResult};
use crate::sentiment::{self, SentimentResult};
use crate::session::{session_layer, FlashLevel, Session, SessionStore};
use crate::views::Views;

/// How many comments the index page lists.
const RECENT_LIMIT: usize = 10;

pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    pub engine: RewriteEngine,
    pub views: Views,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let engine = RewriteEngine::from_config(&config).context("failed to build rewrite engine")?;
        let views = Views::new().context("failed to compile templates")?;
        let sessions = Arc::new(SessionStore::new(config.session_ttl));

        Ok(Self {
            config,
            sessions,
            engine,
            views,
        })
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[schema(example = "This is terrible and useless")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    pub text: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: SentimentResult,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<CommentRecord>,
}

/// A stored comment next to its suggested rewrite.
#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    pub original: CommentRecord,
    pub improvement: RewriteResult,
    pub improved_analysis: SentimentResult,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub success: bool,
    pub data: Review,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "sentiment-analysis-tool")]
    pub service: String,
    pub ai_enabled: bool,
}

/// Trims the input and enforces the non-empty and length rules.
pub fn validate_text(raw: Option<&str>, max_chars: usize) -> Result<&str, ValidationError> {
    let text = raw.ok_or(ValidationError::Missing)?.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    if text.chars().count() > max_chars {
        return Err(ValidationError::TooLong { max: max_chars });
    }
    Ok(text)
}

async fn build_review(engine: &RewriteEngine, original: CommentRecord) -> Review {
    let improvement = engine.improve(&original.text).await;
    let improved_analysis = sentiment::score(&improvement.improved_text);
    Review {
        original,
        improvement,
        improved_analysis,
    }
}

fn redirect_with_flash(session: &Session, level: FlashLevel, message: String) -> Response {
    session.lock().flash(level, message);
    Redirect::to("/").into_response()
}

// ============================================================================
// HTML pages
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>, session: Session) -> AppResult<Html<String>> {
    let (flashes, history) = {
        let mut data = session.lock();
        (data.take_flashes(), data.history.recent(RECENT_LIMIT))
    };

    state.views.render(
        "index",
        &json!({
            "flashes": flashes,
            "history": history,
            "max_chars": state.config.max_text_chars,
        }),
    )
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<AnalyzeForm>,
) -> AppResult<Response> {
    let text = match validate_text(form.text.as_deref(), state.config.max_text_chars) {
        Ok(text) => text.to_string(),
        Err(e) => return Ok(redirect_with_flash(&session, FlashLevel::Error, e.flash_message())),
    };

    let analysis = sentiment::score(&text);
    let comment_id = session.lock().history.append(text.clone(), analysis.clone());

    tracing::info!(
        "📝 Comment {} analyzed: {} ({:.3})",
        comment_id,
        analysis.label,
        analysis.polarity
    );

    let page = state.views.render(
        "result",
        &json!({
            "text": text,
            "analysis": analysis,
            "comment_id": comment_id,
        }),
    )?;
    Ok(page.into_response())
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    let lookup = session.lock().history.get(id).cloned();
    let original = match lookup {
        Ok(record) => record,
        Err(_) => {
            return Ok(redirect_with_flash(
                &session,
                FlashLevel::Error,
                "Comment not found.".to_string(),
            ))
        }
    };

    let review = build_review(&state.engine, original).await;
    Ok(state.views.render("review", &review)?.into_response())
}

pub async fn history_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Html<String>> {
    let (flashes, history) = {
        let mut data = session.lock();
        (data.take_flashes(), data.history.list().to_vec())
    };

    state.views.render(
        "history",
        &json!({ "flashes": flashes, "history": history }),
    )
}

pub async fn clear_history(session: Session) -> Response {
    {
        let mut data = session.lock();
        data.history.clear();
        data.flash(FlashLevel::Success, "Comment history cleared successfully.");
    }
    tracing::info!("🧹 History cleared for session {}", session.id());
    Redirect::to("/").into_response()
}

// ============================================================================
// JSON API
// ============================================================================

/// Score a piece of text without storing it.
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Sentiment computed", body = AnalyzeResponse),
        (status = 400, description = "Missing, empty or over-length text", body = crate::error::ErrorResponse)
    ),
    tag = "sentiment"
)]
pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let text = match payload {
        Ok(Json(request)) => request.text,
        Err(rejection) => {
            tracing::debug!("Rejected analyze payload: {}", rejection);
            None
        }
    };

    let text = validate_text(text.as_deref(), state.config.max_text_chars)?;
    Ok(Json(AnalyzeResponse {
        success: true,
        data: sentiment::score(text),
    }))
}

/// Comments analyzed in the current session, oldest first.
#[utoipa::path(
    get,
    path = "/api/history",
    responses((status = 200, description = "Session history", body = HistoryResponse)),
    tag = "history"
)]
pub async fn api_history(session: Session) -> Json<HistoryResponse> {
    let data = session.lock().history.list().to_vec();
    Json(HistoryResponse {
        success: true,
        data,
    })
}

/// Suggest a gentler rewrite of a stored comment.
#[utoipa::path(
    get,
    path = "/api/review/{id}",
    params(("id" = u64, Path, description = "Comment id within the session")),
    responses(
        (status = 200, description = "Rewrite suggestion", body = ReviewResponse),
        (status = 404, description = "Unknown comment id", body = crate::error::ErrorResponse)
    ),
    tag = "history"
)]
pub async fn api_review(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<u64>,
) -> AppResult<Json<ReviewResponse>> {
    let original = session.lock().history.get(id).cloned()?;
    let review = build_review(&state.engine, original).await;
    Ok(Json(ReviewResponse {
        success: true,
        data: review,
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: "sentiment-analysis-tool".to_string(),
        ai_enabled: state.engine.has_primary(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let session_routes = Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .route("/review/:id", get(review))
        .route("/history", get(history_page))
        .route("/clear_history", post(clear_history))
        .route("/api/history", get(api_history))
        .route("/api/review/:id", get(api_review))
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_layer,
        ));

    Router::new()
        .merge(session_routes)
        .route("/api/analyze", post(api_analyze))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
