pub mod article;
pub mod comment;
pub mod event;
pub mod interaction;
pub mod newtypes;

use serde::{Deserialize, Serialize};

/// Ids of researcher-authored seed comments start with this prefix. Live comments never do.
pub const SEED_COMMENT_PREFIX: &str = "default_";

/// Shown when a comment was submitted without a display name.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Depth of the deepest allowed comment: top-level is 0, reply 1, sub-reply 2.
pub const MAX_COMMENT_DEPTH: usize = 2;

/// Cookie holding the random id which identifies a browser in interaction logs.
pub static BROWSER_ID_COOKIE: &str = "threadlab_uid";

#[derive(Deserialize, Serialize, Debug)]
pub struct SuccessResponse {
    success: bool,
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self { success: true }
    }
}
