pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod rewrite;
pub mod rules;
pub mod sentiment;
pub mod session;
pub mod views;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::api_analyze,
        api::api_history,
        api::api_review,
        api::health
    ),
    components(
        schemas(
            api::AnalyzeRequest,
            api::AnalyzeResponse,
            api::HistoryResponse,
            api::Review,
            api::ReviewResponse,
            api::HealthResponse,
            error::ErrorResponse,
            history::CommentRecord,
            sentiment::SentimentResult,
            sentiment::SentimentLabel,
            sentiment::ConfidenceLevel,
            rewrite::RewriteResult,
            rewrite::RewriteMethod,
            rewrite::Change
        )
    ),
    tags(
        (name = "sentiment", description = "Sentiment Scoring API"),
        (name = "history", description = "Session Comment History API"),
        (name = "system", description = "Service Health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_json_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/analyze", "/api/history", "/api/review/{id}", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_openapi_error_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("SentimentResult"));
    }
}
