use super::{AdminExt, validate_not_empty};
use crate::{
    flags::CookieFlags,
    interactions::{LogEntry, RequestMeta, log_interaction},
};
use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::cookie::CookieJar;
use axum_macros::debug_handler;
use threadlab_api_client::article::{
    CreateArticleParams,
    CreateStudyParams,
    GetArticleParams,
    ListArticlesParams,
};
use threadlab_database::{
    common::{
        article::{Article, ArticleForm, ArticleView, Study, StudyForm},
        interaction::InteractionAction,
    },
    error::BackendResult,
    impls::{ThreadlabContext, tree::build_comment_tree},
    utils::empty_to_none,
};
use threadlab_discussion::voting::show_own_seed_votes;

/// Article with the live comment tree. Seed comments are part of the article, unless it
/// disables them, and include the votes of this browser.
#[debug_handler]
pub(super) async fn get_article(
    meta: RequestMeta,
    jar: CookieJar,
    State(context): State<ThreadlabContext>,
    Query(mut params): Query<GetArticleParams>,
) -> BackendResult<Json<ArticleView>> {
    let article = context.store.read_article(params.id)?;
    let comments = build_comment_tree(&*context.store, article.id)?;
    empty_to_none(&mut params.response_id);
    let mut entry = LogEntry::new(InteractionAction::ViewArticle, &article);
    entry.response_id = params.response_id;
    log_interaction(&context, &meta, entry);

    let mut view = ArticleView::for_reader(article, comments);
    let flags = CookieFlags::new(jar, context.conf.options.secure_cookies);
    show_own_seed_votes(&flags, view.article.id, &mut view.article.default_comments);
    Ok(Json(view))
}

#[debug_handler]
pub(super) async fn list_articles(
    State(context): State<ThreadlabContext>,
    Query(params): Query<ListArticlesParams>,
) -> BackendResult<Json<Vec<Article>>> {
    Ok(Json(context.store.list_articles(params.study_id)?))
}

#[debug_handler]
pub(super) async fn create_article(
    _admin: AdminExt,
    State(context): State<ThreadlabContext>,
    Json(params): Json<CreateArticleParams>,
) -> BackendResult<Json<Article>> {
    validate_not_empty(&params.title)?;
    if let Some(study_id) = params.study_id {
        context.store.read_study(study_id)?;
    }
    let form = ArticleForm {
        title: params.title.trim().to_string(),
        author: params.author,
        text: params.text,
        study_id: params.study_id,
        show_default_comments: params.show_default_comments,
        default_comments: params.default_comments,
    };
    Ok(Json(context.store.create_article(form)?))
}

#[debug_handler]
pub(super) async fn create_study(
    _admin: AdminExt,
    State(context): State<ThreadlabContext>,
    Json(params): Json<CreateStudyParams>,
) -> BackendResult<Json<Study>> {
    validate_not_empty(&params.name)?;
    let form = StudyForm {
        name: params.name.trim().to_string(),
        description: params.description,
    };
    Ok(Json(context.store.create_study(form)?))
}

#[debug_handler]
pub(super) async fn list_studies(
    State(context): State<ThreadlabContext>,
) -> BackendResult<Json<Vec<Study>>> {
    Ok(Json(context.store.list_studies()?))
}
