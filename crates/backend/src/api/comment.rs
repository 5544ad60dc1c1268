use super::{AdminExt, validate_not_empty};
use crate::{
    flags::{CookieFlags, StoreVoteSink},
    interactions::{LogEntry, RequestMeta, log_interaction},
};
use anyhow::anyhow;
use axum::{
    Json,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use axum_extra::extract::cookie::CookieJar;
use axum_macros::debug_handler;
use futures::Stream;
use log::warn;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use threadlab_api_client::comment::{
    CreateCommentParams,
    DeleteCommentParams,
    DeleteCommentResponse,
    VoteParams,
};
use threadlab_database::{
    common::{
        MAX_COMMENT_DEPTH,
        comment::{Comment, CommentInsertForm},
        event::{CommentEvent, CommentEventKind},
        interaction::InteractionAction,
        newtypes::ArticleId,
    },
    error::{BackendResult, NotFoundError},
    impls::ThreadlabContext,
    utils::empty_to_none,
};
use threadlab_discussion::{
    mutate,
    voting::{
        FlagKind,
        VoteCounts,
        VoteFlags,
        VoteOutcome,
        VoteTarget,
        apply_vote,
        current_state,
    },
};
use tokio::sync::broadcast;
use tokio_stream::{
    StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};

/// Post a top-level comment, reply or sub-reply. The browser gets a flag for the new
/// comment.
#[debug_handler]
pub(super) async fn create_comment(
    meta: RequestMeta,
    jar: CookieJar,
    State(context): State<ThreadlabContext>,
    Json(mut params): Json<CreateCommentParams>,
) -> BackendResult<(CookieJar, Json<Comment>)> {
    validate_not_empty(&params.content)?;
    let depth = params.ancestor_ids.len();
    if depth > MAX_COMMENT_DEPTH {
        return Err(anyhow!("Max comment depth reached").into());
    }
    empty_to_none(&mut params.name);
    empty_to_none(&mut params.response_id);
    let article = context.store.read_article(params.article_id)?;

    let form = CommentInsertForm {
        article_id: article.id,
        content: params.content,
        name: params.name,
        ancestor_ids: params.ancestor_ids,
        response_id: params.response_id.clone(),
    };
    let id = context.store.save(form)?;
    let comment = Comment::from_row(context.store.read(article.id, &id)?);

    let mut flags = CookieFlags::new(jar, context.conf.options.secure_cookies);
    flags.set(FlagKind::posted_at_depth(depth), article.id, &id);

    let mut entry = LogEntry::new(InteractionAction::post_at_depth(depth), &article);
    entry.response_id = params.response_id;
    entry.details = json!({
        "commentId": comment.id,
        "parentId": comment.parent_id,
        "grandParentId": comment.grand_parent_id,
        "content": comment.content,
        "name": comment.name,
    });
    log_interaction(&context, &meta, entry);
    context.notify(CommentEvent {
        article_id: article.id,
        comment_id: id,
        kind: CommentEventKind::Created,
    });

    Ok((flags.into_jar(), Json(comment)))
}

/// Delete a live comment with all its replies.
#[debug_handler]
pub(super) async fn delete_comment(
    _admin: AdminExt,
    meta: RequestMeta,
    State(context): State<ThreadlabContext>,
    Json(params): Json<DeleteCommentParams>,
) -> BackendResult<Json<DeleteCommentResponse>> {
    if params.comment_id.is_seed() {
        return Err(anyhow!("Default comments cant be deleted").into());
    }
    let article = context.store.read_article(params.article_id)?;
    let deleted = context.store.delete(
        article.id,
        &params.comment_id,
        params.parent_id.as_ref(),
        params.grand_parent_id.as_ref(),
    )?;
    if deleted > 0 {
        let mut entry = LogEntry::new(InteractionAction::DeleteComment, &article);
        entry.details = json!({ "commentId": params.comment_id, "deleted": deleted });
        log_interaction(&context, &meta, entry);
        context.notify(CommentEvent {
            article_id: article.id,
            comment_id: params.comment_id,
            kind: CommentEventKind::Deleted,
        });
    }
    Ok(Json(DeleteCommentResponse { deleted }))
}

/// Move the vote of this browser on a comment to the requested state. Failed counter updates
/// are logged and reported in the outcome, the vote flags change regardless.
#[debug_handler]
pub(super) async fn vote_comment(
    meta: RequestMeta,
    jar: CookieJar,
    State(context): State<ThreadlabContext>,
    Json(mut params): Json<VoteParams>,
) -> BackendResult<(CookieJar, Json<VoteOutcome>)> {
    let article = context.store.read_article(params.article_id)?;
    let mut flags = CookieFlags::new(jar, context.conf.options.secure_cookies);
    let counts = if params.comment_id.is_seed() {
        let own = current_state(&flags, article.id, &params.comment_id);
        mutate::find(&article.default_comments, &params.comment_id)
            .map(|c| VoteCounts::from(c).with_own_vote(own))
            .ok_or_else(|| NotFoundError(format!("default comment {}", params.comment_id)))?
    } else {
        let row = context.store.read(article.id, &params.comment_id)?;
        VoteCounts {
            upvotes: row.upvotes,
            downvotes: row.downvotes,
        }
    };

    let target = VoteTarget {
        article_id: article.id,
        comment_id: params.comment_id,
        ancestor_ids: params.ancestor_ids,
    };
    let sink = StoreVoteSink(&*context.store);
    let outcome = apply_vote(&mut flags, &sink, &target, counts, params.vote);

    if outcome.previous != outcome.state {
        empty_to_none(&mut params.response_id);
        let mut entry = LogEntry::new(InteractionAction::Vote, &article);
        entry.response_id = params.response_id;
        entry.details = json!({
            "commentId": target.comment_id,
            "isDefault": target.comment_id.is_seed(),
            "previous": outcome.previous,
            "vote": outcome.state,
        });
        log_interaction(&context, &meta, entry);
        context.notify(CommentEvent {
            article_id: article.id,
            comment_id: target.comment_id,
            kind: CommentEventKind::Voted,
        });
    }
    Ok((flags.into_jar(), Json(outcome)))
}

#[derive(Deserialize, Debug, Default)]
pub(super) struct EventParams {
    /// Only send events of this article
    article_id: Option<ArticleId>,
}

/// Server-sent events whenever comments are created, deleted or voted on, so that open
/// discussion views know when to refresh.
pub(super) async fn comment_events(
    State(context): State<ThreadlabContext>,
    Query(params): Query<EventParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = article_events(context.events.subscribe(), params.article_id).filter_map(|e| {
        match Event::default().event("comment").json_data(&e) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                warn!("Failed to serialize comment event: {err}");
                None
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn article_events(
    receiver: broadcast::Receiver<CommentEvent>,
    article_id: Option<ArticleId>,
) -> impl Stream<Item = CommentEvent> {
    BroadcastStream::new(receiver).filter_map(move |res| match res {
        Ok(event) if article_id.is_none_or(|a| a == event.article_id) => Some(event),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            warn!("Comment event subscriber lagged behind, missed {n} events");
            None
        }
    })
}
