use crate::{
    common::{
        MAX_COMMENT_DEPTH,
        article::{Article, ArticleForm, Study, StudyForm},
        comment::{CommentInsertForm, DbComment, Polarity},
        event::CommentEvent,
        interaction::{Interaction, InteractionForm, InteractionQuery},
        newtypes::{ArticleId, CommentId, StudyId},
    },
    config::{StoreBackend, ThreadlabConfig},
    error::{BackendResult, NotFoundError},
};
use anyhow::anyhow;
use log::debug;
use std::sync::Arc;
use tokio::sync::broadcast;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod tree;

/// Maps comment operations onto storage. Comments are kept as an adjacency list, each row
/// knows its parent and (for sub-replies) its top-level ancestor.
pub trait CommentStore: Send + Sync {
    /// Store a new comment below the given ancestors and return its id. The creation time is
    /// assigned by the store.
    fn save(&self, form: CommentInsertForm) -> BackendResult<CommentId>;

    /// Delete the comment and all of its replies, deepest first. Returns the number of
    /// removed comments, which is zero if the comment did not exist.
    fn delete(
        &self,
        article_id: ArticleId,
        comment_id: &CommentId,
        parent_id: Option<&CommentId>,
        grand_parent_id: Option<&CommentId>,
    ) -> BackendResult<usize>;

    /// Add `delta` to one vote counter, never going below zero. Seed comments are ignored and
    /// `false` is returned.
    fn update_votes(
        &self,
        article_id: ArticleId,
        comment_id: &CommentId,
        polarity: Polarity,
        delta: i32,
        ancestor_ids: &[CommentId],
    ) -> BackendResult<bool>;

    fn read(&self, article_id: ArticleId, comment_id: &CommentId) -> BackendResult<DbComment>;

    fn list_for_article(&self, article_id: ArticleId) -> BackendResult<Vec<DbComment>>;
}

pub trait ArticleStore: Send + Sync {
    fn create_article(&self, form: ArticleForm) -> BackendResult<Article>;

    fn read_article(&self, id: ArticleId) -> BackendResult<Article>;

    fn list_articles(&self, study_id: Option<StudyId>) -> BackendResult<Vec<Article>>;

    fn create_study(&self, form: StudyForm) -> BackendResult<Study>;

    fn read_study(&self, id: StudyId) -> BackendResult<Study>;

    fn list_studies(&self) -> BackendResult<Vec<Study>>;
}

pub trait InteractionStore: Send + Sync {
    fn log_interaction(&self, form: InteractionForm) -> BackendResult<Interaction>;

    fn list_interactions(&self, query: &InteractionQuery) -> BackendResult<Vec<Interaction>>;
}

pub trait Store: CommentStore + ArticleStore + InteractionStore {}

impl<T: CommentStore + ArticleStore + InteractionStore> Store for T {}

#[derive(Clone)]
pub struct ThreadlabContext {
    pub store: Arc<dyn Store>,
    pub conf: ThreadlabConfig,
    pub events: broadcast::Sender<CommentEvent>,
}

impl ThreadlabContext {
    pub fn init(config: ThreadlabConfig) -> BackendResult<Self> {
        let store: Arc<dyn Store> = match config.database.backend {
            #[cfg(feature = "postgres")]
            StoreBackend::Postgres => {
                let database_url = std::env::var("DATABASE_URL")
                    .unwrap_or(config.database.connection_url.clone());
                Arc::new(postgres::PgStore::connect(
                    &database_url,
                    config.database.pool_size,
                )?)
            }
            #[cfg(not(feature = "postgres"))]
            StoreBackend::Postgres => {
                return Err(anyhow!(
                    "Postgres backend configured, but built without the postgres feature"
                )
                .into());
            }
            StoreBackend::Memory => Arc::new(memory::MemoryStore::default()),
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: ThreadlabConfig, store: Arc<dyn Store>) -> Self {
        let (events, _) = broadcast::channel(config.options.event_capacity.max(1));
        ThreadlabContext {
            store,
            conf: config,
            events,
        }
    }

    /// Tell all subscribed views that a discussion changed. Nobody listening is fine.
    pub fn notify(&self, event: CommentEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for comment event");
        }
    }
}

/// Where a new comment goes in the tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placement {
    pub depth: i32,
    pub parent_id: Option<CommentId>,
    pub grand_parent_id: Option<CommentId>,
}

/// Check the ancestor path of a new comment. `read` returns the stored row for an id, or
/// `None` if it doesnt exist.
pub(crate) fn resolve_placement<F>(
    article_id: ArticleId,
    ancestor_ids: &[CommentId],
    mut read: F,
) -> BackendResult<Placement>
where
    F: FnMut(&CommentId) -> BackendResult<Option<DbComment>>,
{
    if ancestor_ids.len() > MAX_COMMENT_DEPTH {
        return Err(anyhow!("Max comment depth reached").into());
    }
    if ancestor_ids.iter().any(CommentId::is_seed) {
        return Err(anyhow!("Cant reply to default comments").into());
    }
    let Some(parent_id) = ancestor_ids.last() else {
        return Ok(Placement {
            depth: 0,
            parent_id: None,
            grand_parent_id: None,
        });
    };
    let parent =
        read(parent_id)?.ok_or_else(|| NotFoundError(format!("parent comment {parent_id}")))?;
    if parent.article_id != article_id {
        return Err(anyhow!("Invalid article_id/parent_id combination").into());
    }
    let depth = ancestor_ids.len() as i32;
    let grand_parent_id = if ancestor_ids.len() == 2 {
        Some(ancestor_ids[0].clone())
    } else {
        None
    };
    if parent.depth + 1 != depth || parent.parent_id != grand_parent_id {
        return Err(anyhow!("Ancestor path does not match stored comments").into());
    }
    Ok(Placement {
        depth,
        parent_id: Some(parent_id.clone()),
        grand_parent_id,
    })
}

/// Check that optional path hints given by the caller agree with the stored row.
pub(crate) fn check_path(
    row: &DbComment,
    parent_id: Option<&CommentId>,
    grand_parent_id: Option<&CommentId>,
) -> BackendResult<()> {
    if parent_id.is_some_and(|p| row.parent_id.as_ref() != Some(p))
        || grand_parent_id.is_some_and(|g| row.grand_parent_id.as_ref() != Some(g))
    {
        return Err(anyhow!("Comment {} is not at the given path", row.id).into());
    }
    Ok(())
}

/// Same as [check_path] for an ancestor list ordered from the top-level comment down.
pub(crate) fn check_ancestors(row: &DbComment, ancestor_ids: &[CommentId]) -> BackendResult<()> {
    match ancestor_ids {
        [] => Ok(()),
        [parent] => check_path(row, Some(parent), None),
        [grand_parent, parent] => check_path(row, Some(parent), Some(grand_parent)),
        _ => Err(anyhow!("Max comment depth reached").into()),
    }
}
