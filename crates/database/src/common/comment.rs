use super::{
    ANONYMOUS_NAME,
    newtypes::{ArticleId, CommentId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
#[cfg(feature = "postgres")]
use {
    crate::schema::comment,
    diesel::{Identifiable, Queryable, Selectable},
};

/// A stored live comment. Nesting is expressed through `parent_id` and `grand_parent_id`,
/// use [crate::impls::tree::build_comment_tree] to get the nested [Comment] form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(Queryable, Selectable, Identifiable))]
#[cfg_attr(feature = "postgres", diesel(table_name = comment, check_for_backend(diesel::pg::Pg)))]
pub struct DbComment {
    pub id: CommentId,
    pub article_id: ArticleId,
    pub parent_id: Option<CommentId>,
    pub grand_parent_id: Option<CommentId>,
    pub depth: i32,
    pub content: String,
    pub name: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub response_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment together with its nested replies. This is the shape used for display, for the
/// seed comments stored on an article, and for export.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Empty for seed comments which get a generated id
    #[serde(default)]
    pub id: CommentId,
    pub content: String,
    #[serde(default = "anonymous")]
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub upvotes: i32,
    #[serde(default)]
    pub downvotes: i32,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    #[serde(default)]
    pub grand_parent_id: Option<CommentId>,
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

fn anonymous() -> String {
    ANONYMOUS_NAME.to_string()
}

impl Comment {
    /// Build a node without replies from a stored row.
    pub fn from_row(row: DbComment) -> Self {
        Comment {
            id: row.id,
            content: row.content,
            name: row.name,
            created_at: row.created_at,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            parent_id: row.parent_id,
            grand_parent_id: row.grand_parent_id,
            response_id: row.response_id,
            replies: vec![],
        }
    }

    pub fn is_seed(&self) -> bool {
        self.id.is_seed()
    }

    pub fn votes_mut(&mut self, polarity: Polarity) -> &mut i32 {
        match polarity {
            Polarity::Upvotes => &mut self.upvotes,
            Polarity::Downvotes => &mut self.downvotes,
        }
    }
}

/// Use the display name if it has any content, otherwise [ANONYMOUS_NAME].
pub fn display_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => ANONYMOUS_NAME.to_string(),
    }
}

/// Which vote counter of a comment is addressed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Upvotes,
    Downvotes,
}

impl Display for Polarity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Upvotes => f.write_str("upvotes"),
            Polarity::Downvotes => f.write_str("downvotes"),
        }
    }
}

/// Input for [crate::impls::CommentStore::save].
#[derive(Clone, Debug, PartialEq)]
pub struct CommentInsertForm {
    pub article_id: ArticleId,
    pub content: String,
    pub name: Option<String>,
    /// Ids from the top-level ancestor down to the direct parent. Empty for a top-level
    /// comment.
    pub ancestor_ids: Vec<CommentId>,
    pub response_id: Option<String>,
}

#[test]
fn test_display_name() {
    assert_eq!("Alice", display_name(Some(" Alice ")));
    assert_eq!(ANONYMOUS_NAME, display_name(Some("  ")));
    assert_eq!(ANONYMOUS_NAME, display_name(None));
}
