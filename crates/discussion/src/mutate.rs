//! Local edits of a comment tree which is already displayed, so that a new reply, a removed
//! comment or a vote shows up without fetching the whole discussion again. The input tree is
//! never modified, every function returns a new tree.

use log::debug;
use threadlab_database::common::{
    comment::{Comment, Polarity},
    newtypes::CommentId,
};

/// Append `reply` to the replies of the comment with `target_id`. Parent annotations of the
/// reply are set from its new position. If the target doesnt exist, or the reply id is
/// already part of the tree, the tree is returned unchanged.
pub fn add_reply(tree: &[Comment], target_id: &CommentId, mut reply: Comment) -> Vec<Comment> {
    let mut tree = tree.to_vec();
    if find(&tree, &reply.id).is_some() {
        debug!("Comment {} is already part of the tree", reply.id);
        return tree;
    }
    match find_mut(&mut tree, target_id) {
        Some(target) => {
            reply.parent_id = Some(target.id.clone());
            reply.grand_parent_id = target.parent_id.clone();
            target.replies.push(reply);
        }
        None => debug!("Reply target {target_id} not found"),
    }
    tree
}

/// Remove the comment with `id` together with its replies, wherever it is located.
pub fn remove_by_id(tree: &[Comment], id: &CommentId) -> Vec<Comment> {
    let mut tree = tree.to_vec();
    remove_in(&mut tree, id);
    tree
}

fn remove_in(list: &mut Vec<Comment>, id: &CommentId) {
    list.retain(|c| &c.id != id);
    for c in list {
        remove_in(&mut c.replies, id);
    }
}

/// Change the displayed vote counter of one comment. Counters dont go below zero.
pub fn adjust_votes(
    tree: &[Comment],
    id: &CommentId,
    polarity: Polarity,
    delta: i32,
) -> Vec<Comment> {
    let mut tree = tree.to_vec();
    if let Some(comment) = find_mut(&mut tree, id) {
        let votes = comment.votes_mut(polarity);
        *votes = (*votes + delta).max(0);
    }
    tree
}

/// Depth-first search by id.
pub fn find<'a>(tree: &'a [Comment], id: &CommentId) -> Option<&'a Comment> {
    for comment in tree {
        if &comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut<'a>(tree: &'a mut [Comment], id: &CommentId) -> Option<&'a mut Comment> {
    for comment in tree {
        if &comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Number of comments in the tree, replies included.
pub fn count_nodes(tree: &[Comment]) -> usize {
    tree.iter().map(|c| 1 + count_nodes(&c.replies)).sum()
}

/// Ids from the top-level comment down to the parent of `id`, which is the path needed to
/// reply to or vote on a nested comment. `None` if the comment is not in the tree.
pub fn ancestor_ids(tree: &[Comment], id: &CommentId) -> Option<Vec<CommentId>> {
    for comment in tree {
        if &comment.id == id {
            return Some(vec![]);
        }
        if let Some(mut path) = ancestor_ids(&comment.replies, id) {
            path.insert(0, comment.id.clone());
            return Some(path);
        }
    }
    None
}
