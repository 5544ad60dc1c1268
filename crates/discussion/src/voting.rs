//! Per-browser vote state. Each browser remembers with flags whether it up- or downvoted a
//! comment, and every state change is persisted as a counter increment. The two writes of a
//! vote switch are independent, a failure in between leaves the stored counters off by one.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use threadlab_database::{
    common::{
        comment::{Comment, Polarity},
        newtypes::{ArticleId, CommentId},
    },
    error::BackendResult,
};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    #[default]
    Neutral,
    Upvoted,
    Downvoted,
}

impl VoteState {
    fn polarity(self) -> Option<Polarity> {
        match self {
            VoteState::Neutral => None,
            VoteState::Upvoted => Some(Polarity::Upvotes),
            VoteState::Downvoted => Some(Polarity::Downvotes),
        }
    }
}

/// Things a browser remembers per comment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FlagKind {
    #[serde(rename = "comment")]
    Comment,
    #[serde(rename = "reply")]
    Reply,
    #[serde(rename = "subReply")]
    SubReply,
    #[serde(rename = "upvotes")]
    Upvotes,
    #[serde(rename = "downvotes")]
    Downvotes,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Comment => "comment",
            FlagKind::Reply => "reply",
            FlagKind::SubReply => "subReply",
            FlagKind::Upvotes => "upvotes",
            FlagKind::Downvotes => "downvotes",
        }
    }

    /// Flag which marks that a comment was posted at this depth.
    pub fn posted_at_depth(depth: usize) -> Self {
        match depth {
            0 => FlagKind::Comment,
            1 => FlagKind::Reply,
            _ => FlagKind::SubReply,
        }
    }

    /// Name under which the flag is stored, eg `upvotes_3_default_0`.
    pub fn flag_name(&self, article_id: ArticleId, comment_id: &CommentId) -> String {
        format!("{}_{article_id}_{comment_id}", self.as_str())
    }
}

impl From<Polarity> for FlagKind {
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Upvotes => FlagKind::Upvotes,
            Polarity::Downvotes => FlagKind::Downvotes,
        }
    }
}

/// Storage for the flags of one browser.
pub trait VoteFlags {
    fn is_set(&self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) -> bool;

    fn set(&mut self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId);

    fn clear(&mut self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryFlags(HashSet<String>);

impl VoteFlags for MemoryFlags {
    fn is_set(&self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) -> bool {
        self.0.contains(&kind.flag_name(article_id, comment_id))
    }

    fn set(&mut self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) {
        self.0.insert(kind.flag_name(article_id, comment_id));
    }

    fn clear(&mut self, kind: FlagKind, article_id: ArticleId, comment_id: &CommentId) {
        self.0.remove(&kind.flag_name(article_id, comment_id));
    }
}

/// Where vote counter changes are persisted.
pub trait VoteSink {
    fn persist(&self, target: &VoteTarget, polarity: Polarity, delta: i32) -> BackendResult<()>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VoteTarget {
    pub article_id: ArticleId,
    pub comment_id: CommentId,
    /// Path from the top-level comment down to the parent
    #[serde(default)]
    pub ancestor_ids: Vec<CommentId>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteCounts {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl VoteCounts {
    fn adjust(&mut self, polarity: Polarity, delta: i32) {
        let votes = match polarity {
            Polarity::Upvotes => &mut self.upvotes,
            Polarity::Downvotes => &mut self.downvotes,
        };
        *votes = (*votes + delta).max(0);
    }

    /// Seed counters never include votes, add the one this browser has cast.
    pub fn with_own_vote(mut self, state: VoteState) -> Self {
        if let Some(polarity) = state.polarity() {
            self.adjust(polarity, 1);
        }
        self
    }
}

impl From<&Comment> for VoteCounts {
    fn from(comment: &Comment) -> Self {
        VoteCounts {
            upvotes: comment.upvotes,
            downvotes: comment.downvotes,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub previous: VoteState,
    pub state: VoteState,
    /// Counters to display after the change
    pub counts: VoteCounts,
    /// Number of counter changes written to storage
    pub persisted: usize,
    /// Number of counter changes which failed to persist. They are not retried.
    pub failed: usize,
}

pub fn current_state<F: VoteFlags + ?Sized>(
    flags: &F,
    article_id: ArticleId,
    comment_id: &CommentId,
) -> VoteState {
    if flags.is_set(FlagKind::Upvotes, article_id, comment_id) {
        VoteState::Upvoted
    } else if flags.is_set(FlagKind::Downvotes, article_id, comment_id) {
        VoteState::Downvoted
    } else {
        VoteState::Neutral
    }
}

/// Move the vote of one browser on `target` to `requested`. An active vote of the other
/// polarity is withdrawn first. Counters of seed comments only change for display.
pub fn apply_vote<F, S>(
    flags: &mut F,
    sink: &S,
    target: &VoteTarget,
    counts: VoteCounts,
    requested: VoteState,
) -> VoteOutcome
where
    F: VoteFlags + ?Sized,
    S: VoteSink + ?Sized,
{
    let previous = current_state(flags, target.article_id, &target.comment_id);
    let mut outcome = VoteOutcome {
        previous,
        state: requested,
        counts,
        ..Default::default()
    };
    if previous == requested {
        return outcome;
    }
    if let Some(old) = previous.polarity() {
        flags.clear(old.into(), target.article_id, &target.comment_id);
        outcome.counts.adjust(old, -1);
        persist(sink, target, old, -1, &mut outcome);
    }
    if let Some(new) = requested.polarity() {
        flags.set(new.into(), target.article_id, &target.comment_id);
        outcome.counts.adjust(new, 1);
        persist(sink, target, new, 1, &mut outcome);
    }
    outcome
}

/// Seed counters are stored without any reader votes, so the votes this browser cast on them
/// are added for display. Live comments already carry all persisted votes.
pub fn show_own_seed_votes<F: VoteFlags + ?Sized>(
    flags: &F,
    article_id: ArticleId,
    comments: &mut [Comment],
) {
    for comment in comments {
        if comment.is_seed() {
            let own = current_state(flags, article_id, &comment.id);
            let counts = VoteCounts::from(&*comment).with_own_vote(own);
            comment.upvotes = counts.upvotes;
            comment.downvotes = counts.downvotes;
        }
        show_own_seed_votes(flags, article_id, &mut comment.replies);
    }
}

fn persist<S: VoteSink + ?Sized>(
    sink: &S,
    target: &VoteTarget,
    polarity: Polarity,
    delta: i32,
    outcome: &mut VoteOutcome,
) {
    if target.comment_id.is_seed() {
        debug!("Vote on default comment {} not persisted", target.comment_id);
        return;
    }
    match sink.persist(target, polarity, delta) {
        Ok(()) => outcome.persisted += 1,
        Err(e) => {
            warn!(
                "Failed to persist {delta} {polarity} for comment {}: {e}",
                target.comment_id
            );
            outcome.failed += 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        writes: RefCell<Vec<(CommentId, Polarity, i32)>>,
        fail: bool,
    }

    impl VoteSink for RecordingSink {
        fn persist(&self, target: &VoteTarget, polarity: Polarity, delta: i32) -> BackendResult<()> {
            if self.fail {
                return Err(anyhow!("store unavailable").into());
            }
            self.writes
                .borrow_mut()
                .push((target.comment_id.clone(), polarity, delta));
            Ok(())
        }
    }

    fn target(id: &str) -> VoteTarget {
        VoteTarget {
            article_id: ArticleId(1),
            comment_id: CommentId::from(id),
            ancestor_ids: vec![],
        }
    }

    #[test]
    fn test_round_trip_is_net_zero() {
        let mut flags = MemoryFlags::default();
        let sink = RecordingSink::default();
        let target = target("live");
        let start = VoteCounts {
            upvotes: 4,
            downvotes: 2,
        };

        let up = apply_vote(&mut flags, &sink, &target, start, VoteState::Upvoted);
        assert_eq!(VoteState::Neutral, up.previous);
        assert_eq!(VoteCounts { upvotes: 5, downvotes: 2 }, up.counts);
        assert_eq!(VoteState::Upvoted, current_state(&flags, ArticleId(1), &target.comment_id));

        let down = apply_vote(&mut flags, &sink, &target, up.counts, VoteState::Downvoted);
        assert_eq!(VoteCounts { upvotes: 4, downvotes: 3 }, down.counts);
        assert_eq!(2, down.persisted);
        assert!(!flags.is_set(FlagKind::Upvotes, ArticleId(1), &target.comment_id));
        assert!(flags.is_set(FlagKind::Downvotes, ArticleId(1), &target.comment_id));

        let neutral = apply_vote(&mut flags, &sink, &target, down.counts, VoteState::Neutral);
        assert_eq!(start, neutral.counts);
        assert_eq!(VoteState::Neutral, current_state(&flags, ArticleId(1), &target.comment_id));

        let id = target.comment_id.clone();
        assert_eq!(
            vec![
                (id.clone(), Polarity::Upvotes, 1),
                (id.clone(), Polarity::Upvotes, -1),
                (id.clone(), Polarity::Downvotes, 1),
                (id, Polarity::Downvotes, -1),
            ],
            sink.writes.into_inner()
        );
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut flags = MemoryFlags::default();
        let sink = RecordingSink::default();
        let counts = VoteCounts::default();
        let outcome = apply_vote(&mut flags, &sink, &target("x"), counts, VoteState::Neutral);
        assert_eq!(counts, outcome.counts);
        assert_eq!(0, outcome.persisted);
        assert!(sink.writes.borrow().is_empty());
    }

    #[test]
    fn test_seed_votes_never_persisted() {
        let mut flags = MemoryFlags::default();
        let sink = RecordingSink::default();
        let target = target("default_0");
        let mut counts = VoteCounts::default();
        for state in [
            VoteState::Upvoted,
            VoteState::Downvoted,
            VoteState::Upvoted,
            VoteState::Neutral,
            VoteState::Downvoted,
        ] {
            counts = apply_vote(&mut flags, &sink, &target, counts, state).counts;
        }
        assert_eq!(VoteCounts { upvotes: 0, downvotes: 1 }, counts);
        assert!(sink.writes.borrow().is_empty());
        // the browser still remembers the vote
        assert!(flags.is_set(FlagKind::Downvotes, ArticleId(1), &target.comment_id));
    }

    #[test]
    fn test_with_own_vote() {
        let counts = VoteCounts {
            upvotes: 2,
            downvotes: 1,
        };
        assert_eq!(counts, counts.with_own_vote(VoteState::Neutral));
        assert_eq!(
            VoteCounts { upvotes: 2, downvotes: 2 },
            counts.with_own_vote(VoteState::Downvoted)
        );
    }

    #[test]
    fn test_show_own_seed_votes() {
        let seed = |id: &str, replies| Comment {
            id: CommentId::from(id),
            content: String::new(),
            name: String::new(),
            created_at: chrono::Utc::now(),
            upvotes: 2,
            downvotes: 1,
            parent_id: None,
            grand_parent_id: None,
            response_id: None,
            replies,
        };
        let mut flags = MemoryFlags::default();
        let sink = RecordingSink::default();
        let mut comments = vec![seed("default_0", vec![seed("default_1", vec![])])];
        for (id, state) in [("default_0", VoteState::Upvoted), ("default_1", VoteState::Downvoted)] {
            let counts = VoteCounts::from(&comments[0]);
            apply_vote(&mut flags, &sink, &target(id), counts, state);
        }

        show_own_seed_votes(&flags, ArticleId(1), &mut comments);
        assert_eq!(VoteCounts { upvotes: 3, downvotes: 1 }, VoteCounts::from(&comments[0]));
        assert_eq!(
            VoteCounts { upvotes: 2, downvotes: 2 },
            VoteCounts::from(&comments[0].replies[0])
        );

        // other articles are unaffected
        let mut other = vec![seed("default_0", vec![])];
        show_own_seed_votes(&flags, ArticleId(2), &mut other);
        assert_eq!(VoteCounts { upvotes: 2, downvotes: 1 }, VoteCounts::from(&other[0]));
    }

    #[test]
    fn test_failed_persist_keeps_display() {
        let mut flags = MemoryFlags::default();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let outcome = apply_vote(
            &mut flags,
            &sink,
            &target("live"),
            VoteCounts::default(),
            VoteState::Upvoted,
        );
        assert_eq!(1, outcome.counts.upvotes);
        assert_eq!(1, outcome.failed);
        assert_eq!(0, outcome.persisted);
        assert_eq!(VoteState::Upvoted, outcome.state);
    }

    #[test]
    fn test_flag_names() {
        let id = CommentId::from("default_0");
        assert_eq!("upvotes_3_default_0", FlagKind::Upvotes.flag_name(ArticleId(3), &id));
        assert_eq!("subReply_3_default_0", FlagKind::posted_at_depth(2).flag_name(ArticleId(3), &id));
    }
}
