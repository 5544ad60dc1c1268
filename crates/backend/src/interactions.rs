use crate::server::middleware::BrowserId;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use http::header::REFERER;
use log::warn;
use std::{convert::Infallible, net::SocketAddr};
use threadlab_database::{
    common::{
        article::Article,
        interaction::{InteractionAction, InteractionForm},
        newtypes::ArticleId,
    },
    impls::ThreadlabContext,
    utils::generate_browser_id,
};

/// Who sent a request, as far as interaction logs are concerned.
#[derive(Clone, Debug)]
pub struct RequestMeta {
    pub browser_id: String,
    pub ip_address: Option<String>,
    pub url: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let browser_id = parts
            .extensions
            .get::<BrowserId>()
            .map(|b| b.0.clone())
            .unwrap_or_else(generate_browser_id);
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(|h| h.trim().to_string());
        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|c| c.0.ip().to_string())
        });
        let url = parts
            .headers
            .get(REFERER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        Ok(RequestMeta {
            browser_id,
            ip_address,
            url,
        })
    }
}

pub(crate) struct LogEntry<'a> {
    pub action: &'a str,
    pub article: Option<&'a Article>,
    pub article_id: Option<ArticleId>,
    pub response_id: Option<String>,
    pub details: serde_json::Value,
}

impl<'a> LogEntry<'a> {
    pub fn new(action: InteractionAction, article: &'a Article) -> Self {
        LogEntry {
            action: action.as_str(),
            article: Some(article),
            article_id: Some(article.id),
            response_id: None,
            details: serde_json::Value::Null,
        }
    }
}

/// Record a reader action. Failures are logged and otherwise ignored, they must never affect
/// the reader.
pub(crate) fn log_interaction(context: &ThreadlabContext, meta: &RequestMeta, entry: LogEntry) {
    let study = entry
        .article
        .and_then(|a| a.study_id)
        .and_then(|id| match context.store.read_study(id) {
            Ok(study) => Some(study),
            Err(e) => {
                warn!("Failed to read study {} for interaction log: {e}", id.0);
                None
            }
        });
    let form = InteractionForm {
        user_id: meta.browser_id.clone(),
        response_id: entry.response_id,
        study_id: study.as_ref().map(|s| s.id),
        study_name: study.map(|s| s.name),
        article_id: entry.article.map(|a| a.id).or(entry.article_id),
        article_title: entry.article.map(|a| a.title.clone()),
        action: entry.action.to_string(),
        details: entry.details,
        url: meta.url.clone(),
        ip_address: meta.ip_address.clone(),
    };
    if let Err(e) = context.store.log_interaction(form) {
        warn!("Failed to log interaction {}: {e}", entry.action);
    }
}
