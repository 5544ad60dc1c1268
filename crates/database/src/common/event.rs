use super::newtypes::{ArticleId, CommentId};
use serde::{Deserialize, Serialize};

/// Published whenever the discussion of an article changes, so that every open view can
/// refresh itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CommentEvent {
    pub article_id: ArticleId,
    pub comment_id: CommentId,
    pub kind: CommentEventKind,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentEventKind {
    Created,
    Deleted,
    Voted,
}
