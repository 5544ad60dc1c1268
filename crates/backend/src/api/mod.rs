use crate::api::{
    article::{create_article, create_study, get_article, list_articles, list_studies},
    comment::{comment_events, create_comment, delete_comment, vote_comment},
    dashboard::{dashboard_comments, dashboard_logs},
    logs::log_interaction_handler,
};
use anyhow::anyhow;
use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    response::IntoResponse,
    routing::{get, post},
};
use http::{StatusCode, header::AUTHORIZATION};
use threadlab_database::{error::BackendResult, impls::ThreadlabContext};

mod article;
mod comment;
mod dashboard;
mod logs;

pub fn api_routes() -> Router<ThreadlabContext> {
    Router::new()
        .route("/article", get(get_article).post(create_article))
        .route("/article/list", get(list_articles))
        .route("/study", post(create_study))
        .route("/study/list", get(list_studies))
        .route("/comment", post(create_comment).delete(delete_comment))
        .route("/comment/vote", post(vote_comment))
        .route("/comment/events", get(comment_events))
        .route("/log", post(log_interaction_handler))
        .route("/dashboard/comments", get(dashboard_comments))
        .route("/dashboard/logs", get(dashboard_logs))
}

pub(crate) fn validate_not_empty(text: &str) -> BackendResult<()> {
    if text.trim().is_empty() {
        return Err(anyhow!("Empty text submitted").into());
    }
    Ok(())
}

/// Present if the request carries the configured admin token as bearer auth.
pub struct AdminExt;

impl FromRequestParts<ThreadlabContext> for AdminExt {
    type Rejection = NotAdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &ThreadlabContext,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));
        match (&context.conf.setup.admin_token, token) {
            (Some(expected), Some(token)) if !expected.is_empty() && expected == token => {
                Ok(AdminExt)
            }
            _ => Err(NotAdminError),
        }
    }
}

pub struct NotAdminError;

impl IntoResponse for NotAdminError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::FORBIDDEN, "Admin access required").into_response()
    }
}

#[test]
fn test_validate_not_empty() {
    assert!(validate_not_empty("Great read").is_ok());
    assert!(validate_not_empty(" \n ").is_err());
}
