use super::{
    MAX_COMMENT_DEPTH,
    comment::{Comment, display_name},
    newtypes::{ArticleId, CommentId, StudyId},
};
use crate::error::BackendResult;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
#[cfg(feature = "postgres")]
use {
    crate::schema::study,
    diesel::{Identifiable, Queryable, Selectable},
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub text: String,
    pub study_id: Option<StudyId>,
    /// Whether readers see the seed comments next to the live ones.
    pub show_default_comments: bool,
    /// Researcher-authored seed threads. Fixed after creation, votes on them are never
    /// persisted.
    pub default_comments: Vec<Comment>,
    pub published: DateTime<Utc>,
}

/// Article with everything needed to render its discussion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArticleView {
    pub article: Article,
    /// Live comment tree, built from stored comments.
    pub comments: Vec<Comment>,
}

impl ArticleView {
    /// The view shown to readers. Seed comments are left out if the article disables them.
    pub fn for_reader(mut article: Article, comments: Vec<Comment>) -> Self {
        if !article.show_default_comments {
            article.default_comments.clear();
        }
        ArticleView { article, comments }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(Queryable, Selectable, Identifiable))]
#[cfg_attr(feature = "postgres", diesel(table_name = study, check_for_backend(diesel::pg::Pg)))]
pub struct Study {
    pub id: StudyId,
    pub name: String,
    pub description: String,
    pub published: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArticleForm {
    pub title: String,
    pub author: String,
    pub text: String,
    pub study_id: Option<StudyId>,
    pub show_default_comments: bool,
    pub default_comments: Vec<Comment>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudyForm {
    pub name: String,
    pub description: String,
}

/// Lowercase the title and join alphanumeric runs with `-`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Prepare researcher-authored seed threads for storage. Missing ids are replaced with
/// generated seed ids, names default to anonymous and parent annotations are rewritten from
/// the nesting. Ids which lack the seed prefix, duplicate ids and threads deeper than
/// [MAX_COMMENT_DEPTH] are rejected.
pub fn normalize_default_comments(comments: Vec<Comment>) -> BackendResult<Vec<Comment>> {
    let mut ids = SeedIds::default();
    ids.reserve(&comments);
    normalize_level(comments, None, None, 0, &mut ids)
}

/// Seed ids in use. Generated ids skip every id given explicitly anywhere in the input, no
/// matter where it appears.
#[derive(Default)]
struct SeedIds {
    explicit: HashSet<CommentId>,
    seen: HashSet<CommentId>,
    next_index: usize,
}

impl SeedIds {
    fn reserve(&mut self, comments: &[Comment]) {
        for comment in comments {
            if !comment.id.0.is_empty() {
                self.explicit.insert(comment.id.clone());
            }
            self.reserve(&comment.replies);
        }
    }

    fn generate(&mut self) -> CommentId {
        loop {
            let id = CommentId::seed(self.next_index);
            self.next_index += 1;
            if !self.explicit.contains(&id) && !self.seen.contains(&id) {
                return id;
            }
        }
    }
}

fn normalize_level(
    comments: Vec<Comment>,
    parent: Option<&CommentId>,
    grand_parent: Option<&CommentId>,
    depth: usize,
    ids: &mut SeedIds,
) -> BackendResult<Vec<Comment>> {
    if depth > MAX_COMMENT_DEPTH && !comments.is_empty() {
        return Err(anyhow!("Default comments are nested deeper than allowed").into());
    }
    let mut normalized = Vec::with_capacity(comments.len());
    for mut comment in comments {
        if comment.id.0.is_empty() {
            comment.id = ids.generate();
        }
        if !comment.id.is_seed() {
            return Err(anyhow!("Default comment id {} lacks the seed prefix", comment.id).into());
        }
        if !ids.seen.insert(comment.id.clone()) {
            return Err(anyhow!("Duplicate default comment id {}", comment.id).into());
        }
        comment.name = display_name(Some(&comment.name));
        comment.upvotes = comment.upvotes.max(0);
        comment.downvotes = comment.downvotes.max(0);
        comment.parent_id = parent.cloned();
        comment.grand_parent_id = grand_parent.cloned();
        let replies = std::mem::take(&mut comment.replies);
        // The parent of this comment becomes the grand parent of its replies.
        let id = comment.id.clone();
        comment.replies = normalize_level(replies, Some(&id), parent, depth + 1, ids)?;
        normalized.push(comment);
    }
    Ok(normalized)
}
