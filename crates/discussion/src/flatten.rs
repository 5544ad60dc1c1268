//! Turns comment trees into flat rows for the research dashboard, where they are searched,
//! sorted and exported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use threadlab_database::common::{
    article::{Article, ArticleView},
    comment::Comment,
    newtypes::{ArticleId, CommentId},
};

/// One comment with the context of its article and position in the thread.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatComment {
    pub article_id: ArticleId,
    pub article_title: String,
    pub article_slug: String,
    pub article_author: String,
    pub id: CommentId,
    pub content: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub parent_id: Option<CommentId>,
    pub grand_parent_id: Option<CommentId>,
    pub response_id: Option<String>,
    pub depth: usize,
    pub is_default: bool,
    /// Number of direct replies, not of all descendants
    pub reply_count: usize,
}

/// Depth-first, parents before their replies, siblings in the given order.
pub fn flatten(comments: &[Comment], article: &Article) -> Vec<FlatComment> {
    let mut rows = vec![];
    flatten_level(comments, article, None, None, 0, &mut rows);
    rows
}

fn flatten_level(
    comments: &[Comment],
    article: &Article,
    parent_id: Option<&CommentId>,
    grand_parent_id: Option<&CommentId>,
    depth: usize,
    rows: &mut Vec<FlatComment>,
) {
    for comment in comments {
        rows.push(FlatComment {
            article_id: article.id,
            article_title: article.title.clone(),
            article_slug: article.slug.clone(),
            article_author: article.author.clone(),
            id: comment.id.clone(),
            content: comment.content.clone(),
            name: comment.name.clone(),
            created_at: comment.created_at,
            upvotes: comment.upvotes,
            downvotes: comment.downvotes,
            parent_id: parent_id.cloned(),
            grand_parent_id: grand_parent_id.cloned(),
            response_id: comment.response_id.clone(),
            depth,
            is_default: comment.is_seed(),
            reply_count: comment.replies.len(),
        });
        flatten_level(
            &comment.replies,
            article,
            Some(&comment.id),
            parent_id,
            depth + 1,
            rows,
        );
    }
}

/// Rows of all given articles. With `show_default` the seed comments of each article come
/// first, followed by its live comments.
pub fn flatten_articles(views: &[ArticleView], show_default: bool) -> Vec<FlatComment> {
    views
        .iter()
        .flat_map(|view| {
            let mut rows = vec![];
            if show_default {
                rows.extend(flatten(&view.article.default_comments, &view.article));
            }
            rows.extend(flatten(&view.comments, &view.article));
            rows
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Upvotes,
    Downvotes,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Stable sort, rows with equal keys keep their traversal order.
pub fn sort_rows(rows: &mut [FlatComment], key: SortKey, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ord = match key {
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Upvotes => a.upvotes.cmp(&b.upvotes),
            SortKey::Downvotes => a.downvotes.cmp(&b.downvotes),
        };
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentOrigin {
    Default,
    Live,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RowFilter {
    /// Case-insensitive match on content, author name or article title
    pub search: Option<String>,
    pub article_id: Option<ArticleId>,
    pub origin: Option<CommentOrigin>,
}

impl RowFilter {
    pub fn matches(&self, row: &FlatComment) -> bool {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let text_match = search.is_none_or(|s| {
            [&row.content, &row.name, &row.article_title]
                .iter()
                .any(|field| field.to_lowercase().contains(&s))
        });
        let origin_match = self.origin.is_none_or(|o| match o {
            CommentOrigin::Default => row.is_default,
            CommentOrigin::Live => !row.is_default,
        });
        text_match && origin_match && self.article_id.is_none_or(|a| row.article_id == a)
    }
}

pub fn filter_rows(rows: Vec<FlatComment>, filter: &RowFilter) -> Vec<FlatComment> {
    rows.into_iter().filter(|r| filter.matches(r)).collect()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub total: usize,
    pub top_level: usize,
    pub replies: usize,
    pub sub_replies: usize,
    pub default_comments: usize,
    pub live_comments: usize,
    pub upvotes: i64,
    pub downvotes: i64,
    pub articles: Vec<ArticleCount>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCount {
    pub article_id: ArticleId,
    pub article_title: String,
    pub comments: usize,
}

pub fn summarize(rows: &[FlatComment]) -> CommentSummary {
    let mut summary = CommentSummary {
        total: rows.len(),
        ..Default::default()
    };
    let mut articles: BTreeMap<i32, ArticleCount> = BTreeMap::new();
    for row in rows {
        match row.depth {
            0 => summary.top_level += 1,
            1 => summary.replies += 1,
            _ => summary.sub_replies += 1,
        }
        if row.is_default {
            summary.default_comments += 1;
        } else {
            summary.live_comments += 1;
        }
        summary.upvotes += i64::from(row.upvotes);
        summary.downvotes += i64::from(row.downvotes);
        articles
            .entry(row.article_id.0)
            .or_insert_with(|| ArticleCount {
                article_id: row.article_id,
                article_title: row.article_title.clone(),
                comments: 0,
            })
            .comments += 1;
    }
    summary.articles = articles.into_values().collect();
    summary
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mutate::count_nodes,
        test_utils::{article, comment, sample_tree},
    };
    use pretty_assertions::assert_eq;

    fn ids(rows: &[FlatComment]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_flatten_preorder_with_direct_reply_count() {
        let tree = sample_tree();
        let rows = flatten(&tree, &article(1, "Budget"));
        assert_eq!(count_nodes(&tree), rows.len());
        assert_eq!(vec!["a", "b", "c", "d", "e"], ids(&rows));
        let counts: Vec<_> = rows.iter().map(|r| r.reply_count).collect();
        // a has two direct replies and three descendants
        assert_eq!(vec![2, 1, 0, 0, 0], counts);
        let depths: Vec<_> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(vec![0, 1, 2, 1, 0], depths);

        let c = &rows[2];
        assert_eq!(Some("b"), c.parent_id.as_ref().map(CommentId::as_str));
        assert_eq!(Some("a"), c.grand_parent_id.as_ref().map(CommentId::as_str));
        assert_eq!("Budget", c.article_title);
        assert!(!c.is_default);
    }

    #[test]
    fn test_flatten_articles_seed_first() {
        let mut first = article(1, "Budget");
        first.default_comments = vec![comment("default_0", 0, vec![comment("default_1", 0, vec![])])];
        let views = vec![
            ArticleView {
                article: first,
                comments: vec![comment("live", 7, vec![])],
            },
            ArticleView {
                article: article(2, "Transit"),
                comments: sample_tree(),
            },
        ];
        let rows = flatten_articles(&views, true);
        assert_eq!(
            vec!["default_0", "default_1", "live", "a", "b", "c", "d", "e"],
            ids(&rows)
        );
        assert!(rows[0].is_default);

        let rows = flatten_articles(&views, false);
        assert_eq!(vec!["live", "a", "b", "c", "d", "e"], ids(&rows));
    }

    #[test]
    fn test_sort_rows_stable() {
        let mut tree = sample_tree();
        tree[0].replies[0].upvotes = 5;
        tree[1].upvotes = 2;
        let mut rows = flatten(&tree, &article(1, "Budget"));
        sort_rows(&mut rows, SortKey::Upvotes, SortOrder::Descending);
        assert_eq!(vec!["b", "e", "a", "c", "d"], ids(&rows));
        sort_rows(&mut rows, SortKey::Date, SortOrder::Ascending);
        assert_eq!(vec!["a", "b", "c", "d", "e"], ids(&rows));
        sort_rows(&mut rows, SortKey::Downvotes, SortOrder::Ascending);
        assert_eq!(vec!["a", "b", "c", "d", "e"], ids(&rows));
    }

    #[test]
    fn test_filter_and_summarize() {
        let mut seeded = article(2, "Transit plans");
        seeded.default_comments = vec![comment("default_0", 0, vec![])];
        let views = vec![
            ArticleView {
                article: article(1, "Budget"),
                comments: sample_tree(),
            },
            ArticleView {
                comments: vec![],
                article: seeded,
            },
        ];
        let rows = flatten_articles(&views, true);

        let filter = RowFilter {
            search: Some("TRANSIT".to_string()),
            ..Default::default()
        };
        assert_eq!(vec!["default_0"], ids(&filter_rows(rows.clone(), &filter)));

        let filter = RowFilter {
            search: Some("content of c".to_string()),
            article_id: Some(ArticleId(1)),
            origin: Some(CommentOrigin::Live),
        };
        assert_eq!(vec!["c"], ids(&filter_rows(rows.clone(), &filter)));

        let filter = RowFilter {
            origin: Some(CommentOrigin::Default),
            article_id: Some(ArticleId(1)),
            ..Default::default()
        };
        assert!(filter_rows(rows.clone(), &filter).is_empty());

        let summary = summarize(&rows);
        assert_eq!(6, summary.total);
        assert_eq!(3, summary.top_level);
        assert_eq!(2, summary.replies);
        assert_eq!(1, summary.sub_replies);
        assert_eq!(1, summary.default_comments);
        assert_eq!(5, summary.live_comments);
        assert_eq!(
            vec![(ArticleId(1), 5), (ArticleId(2), 1)],
            summary
                .articles
                .iter()
                .map(|a| (a.article_id, a.comments))
                .collect::<Vec<_>>()
        );
    }
}
