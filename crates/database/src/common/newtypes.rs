use super::SEED_COMMENT_PREFIX;
#[cfg(feature = "postgres")]
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(DieselNewType))]
pub struct ArticleId(pub i32);

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(DieselNewType))]
pub struct StudyId(pub i32);

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(DieselNewType))]
pub struct InteractionId(pub i32);

/// Comments are addressed by strings so that researcher-authored seed comments can carry a
/// readable id with the reserved [SEED_COMMENT_PREFIX].
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(DieselNewType))]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn generate() -> Self {
        CommentId(Uuid::new_v4().to_string())
    }

    pub fn seed(index: usize) -> Self {
        CommentId(format!("{SEED_COMMENT_PREFIX}{index}"))
    }

    pub fn is_seed(&self) -> bool {
        self.0.starts_with(SEED_COMMENT_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CommentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommentId {
    fn from(value: &str) -> Self {
        CommentId(value.to_string())
    }
}

impl Display for ArticleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn test_seed_prefix() {
    assert!(CommentId::seed(3).is_seed());
    assert_eq!("default_3", CommentId::seed(3).as_str());
    assert!(!CommentId::generate().is_seed());
}
