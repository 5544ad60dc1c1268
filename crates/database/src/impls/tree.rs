use super::CommentStore;
use crate::{
    common::{
        MAX_COMMENT_DEPTH,
        comment::{Comment, DbComment},
        newtypes::{ArticleId, CommentId},
    },
    error::BackendResult,
};
use log::warn;
use std::collections::HashMap;

/// Fetch all live comments of an article and assemble them into a tree.
pub fn build_comment_tree<S>(store: &S, article_id: ArticleId) -> BackendResult<Vec<Comment>>
where
    S: CommentStore + ?Sized,
{
    let rows = store.list_for_article(article_id)?;
    Ok(assemble_tree(rows))
}

/// Assemble stored rows into nested comments. Siblings are ordered by creation time, parent
/// annotations are rewritten from the actual nesting.
///
/// Rows which cannot be placed (missing parent, inconsistent depth, below the depth limit)
/// are logged and left out. Their branch shows up as having no replies instead of failing
/// the whole tree.
pub fn assemble_tree(rows: Vec<DbComment>) -> Vec<Comment> {
    let total = rows.len();
    let mut children: HashMap<Option<CommentId>, Vec<DbComment>> = HashMap::new();
    for row in rows {
        children.entry(row.parent_id.clone()).or_default().push(row);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let mut placed = 0;
    let roots = children.remove(&None).unwrap_or_default();
    let tree = roots
        .into_iter()
        .filter_map(|row| attach(row, None, None, 0, &mut children, &mut placed))
        .collect();

    if placed != total {
        let orphans: Vec<String> = children
            .values()
            .flatten()
            .map(|c| c.id.to_string())
            .collect();
        warn!(
            "Dropped {} comments which could not be placed in the tree: {}",
            total - placed,
            orphans.join(", ")
        );
    }
    tree
}

fn attach(
    row: DbComment,
    parent_id: Option<&CommentId>,
    grand_parent_id: Option<&CommentId>,
    depth: usize,
    children: &mut HashMap<Option<CommentId>, Vec<DbComment>>,
    placed: &mut usize,
) -> Option<Comment> {
    if row.depth != depth as i32 {
        warn!(
            "Comment {} has stored depth {} but sits at depth {depth}",
            row.id, row.depth
        );
        return None;
    }
    *placed += 1;
    let mut node = Comment::from_row(row);
    node.parent_id = parent_id.cloned();
    node.grand_parent_id = grand_parent_id.cloned();

    let replies = children.remove(&Some(node.id.clone())).unwrap_or_default();
    if depth == MAX_COMMENT_DEPTH {
        if !replies.is_empty() {
            warn!(
                "Comment {} has {} replies below the depth limit",
                node.id,
                replies.len()
            );
            // keep them around so they are included in the orphan report
            children.insert(Some(node.id.clone()), replies);
        }
        return Some(node);
    }
    let id = node.id.clone();
    // The parent of this node is the top-level ancestor of its replies
    node.replies = replies
        .into_iter()
        .filter_map(|r| attach(r, Some(&id), parent_id, depth + 1, children, placed))
        .collect();
    Some(node)
}
