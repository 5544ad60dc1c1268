use super::validate_not_empty;
use crate::interactions::{LogEntry, RequestMeta, log_interaction};
use axum::{Json, extract::State};
use axum_macros::debug_handler;
use log::debug;
use threadlab_api_client::dashboard::LogInteractionParams;
use threadlab_database::{
    common::SuccessResponse,
    error::BackendResult,
    impls::ThreadlabContext,
    utils::empty_to_none,
};

/// Record a reader action reported by the article page.
#[debug_handler]
pub(super) async fn log_interaction_handler(
    mut meta: RequestMeta,
    State(context): State<ThreadlabContext>,
    Json(mut params): Json<LogInteractionParams>,
) -> BackendResult<Json<SuccessResponse>> {
    validate_not_empty(&params.action)?;
    empty_to_none(&mut params.response_id);
    let article = match params.article_id.map(|id| context.store.read_article(id)) {
        Some(Ok(article)) => Some(article),
        Some(Err(e)) => {
            debug!("Logging interaction without article details: {e}");
            None
        }
        None => None,
    };
    if params.url.is_some() {
        meta.url = params.url;
    }
    let entry = LogEntry {
        action: params.action.trim(),
        article: article.as_ref(),
        article_id: params.article_id,
        response_id: params.response_id,
        details: params.details,
    };
    log_interaction(&context, &meta, entry);
    Ok(Json(SuccessResponse::default()))
}
