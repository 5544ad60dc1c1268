//! Vote and comment flags of a browser, kept in cookies named like `upvotes_3_default_0`.

use crate::server::middleware::build_cookie;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use threadlab_database::{
    common::{comment::Polarity, newtypes::ArticleId, newtypes::CommentId},
    error::BackendResult,
    impls::Store,
};
use threadlab_discussion::voting::{FlagKind, VoteFlags, VoteSink, VoteTarget};

const FLAG_VALUE: &str = "true";

/// Flags read from the request cookies. Changes are collected in the jar, which needs to be
/// returned with the response.
pub struct CookieFlags {
    jar: CookieJar,
    secure: bool,
}

impl CookieFlags {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl VoteFlags for CookieFlags {
    fn is_set(&self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) -> bool {
        self.jar
            .get(&kind.flag_name(article_id, comment_id))
            .is_some_and(|c| c.value() == FLAG_VALUE)
    }

    fn set(&mut self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) {
        let cookie = build_cookie(
            kind.flag_name(article_id, comment_id),
            FLAG_VALUE.to_string(),
            self.secure,
        );
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn clear(&mut self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) {
        // path has to match the one used when setting
        let cookie = Cookie::build(kind.flag_name(article_id, comment_id)).path("/");
        self.jar = std::mem::take(&mut self.jar).remove(cookie);
    }
}

/// Persists vote changes as counter updates in the store.
pub struct StoreVoteSink<'a>(pub &'a dyn Store);

impl VoteSink for StoreVoteSink<'_> {
    fn persist(&self, target: &VoteTarget, polarity: Polarity, delta: i32) -> BackendResult<()> {
        self.0.update_votes(
            target.article_id,
            &target.comment_id,
            polarity,
            delta,
            &target.ancestor_ids,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use threadlab_discussion::voting::current_state;
    use threadlab_discussion::voting::VoteState;

    #[test]
    fn test_cookie_flags() {
        let id = CommentId::from("abc");
        let jar = CookieJar::new().add(Cookie::new("upvotes_1_abc", "true"));
        let mut flags = CookieFlags::new(jar, false);
        assert_eq!(VoteState::Upvoted, current_state(&flags, ArticleId(1), &id));
        assert!(!flags.is_set(FlagKind::Upvotes, ArticleId(2), &id));

        flags.clear(FlagKind::Upvotes, ArticleId(1), &id);
        flags.set(FlagKind::Downvotes, ArticleId(1), &id);
        assert_eq!(VoteState::Downvoted, current_state(&flags, ArticleId(1), &id));

        let jar = flags.into_jar();
        assert!(jar.get("upvotes_1_abc").is_none());
        assert_eq!(Some("true"), jar.get("downvotes_1_abc").map(|c| c.value()));
    }
}
