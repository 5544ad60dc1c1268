use super::{
    ArticleStore,
    CommentStore,
    InteractionStore,
    check_ancestors,
    check_path,
    resolve_placement,
};
use crate::{
    common::{
        article::{Article, ArticleForm, Study, StudyForm, normalize_default_comments, slugify},
        comment::{CommentInsertForm, DbComment, Polarity, display_name},
        interaction::{Interaction, InteractionForm, InteractionQuery},
        newtypes::{ArticleId, CommentId, InteractionId, StudyId},
    },
    error::{BackendResult, NotFoundError},
};
use chrono::Utc;
use log::debug;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Keeps everything in process memory. Used for development and tests, data is lost when
/// the process exits.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    articles: BTreeMap<i32, Article>,
    studies: BTreeMap<i32, Study>,
    /// Insertion order of comments is kept in `comment_order`.
    comments: BTreeMap<CommentId, DbComment>,
    comment_order: Vec<CommentId>,
    interactions: Vec<Interaction>,
}

impl Tables {
    fn next_id<T>(map: &BTreeMap<i32, T>) -> i32 {
        map.keys().next_back().map(|id| id + 1).unwrap_or(1)
    }

    fn comment_in_article(&self, article_id: ArticleId, id: &CommentId) -> Option<&DbComment> {
        self.comments.get(id).filter(|c| c.article_id == article_id)
    }
}

impl CommentStore for MemoryStore {
    fn save(&self, form: CommentInsertForm) -> BackendResult<CommentId> {
        let mut tables = self.tables.write();
        if !tables.articles.contains_key(&form.article_id.0) {
            return Err(NotFoundError(format!("article {}", form.article_id)).into());
        }
        let placement = resolve_placement(form.article_id, &form.ancestor_ids, |id| {
            Ok(tables.comments.get(id).cloned())
        })?;
        let id = CommentId::generate();
        let row = DbComment {
            id: id.clone(),
            article_id: form.article_id,
            parent_id: placement.parent_id,
            grand_parent_id: placement.grand_parent_id,
            depth: placement.depth,
            content: form.content,
            name: display_name(form.name.as_deref()),
            upvotes: 0,
            downvotes: 0,
            response_id: form.response_id,
            created_at: Utc::now(),
        };
        tables.comments.insert(id.clone(), row);
        tables.comment_order.push(id.clone());
        Ok(id)
    }

    fn delete(
        &self,
        article_id: ArticleId,
        comment_id: &CommentId,
        parent_id: Option<&CommentId>,
        grand_parent_id: Option<&CommentId>,
    ) -> BackendResult<usize> {
        let mut tables = self.tables.write();
        let Some(row) = tables.comment_in_article(article_id, comment_id) else {
            debug!("Comment {comment_id} already deleted");
            return Ok(0);
        };
        check_path(row, parent_id, grand_parent_id)?;

        // Collect descendants, deepest first so that no reply is left without its parent
        let mut doomed: Vec<&DbComment> = tables
            .comments
            .values()
            .filter(|c| {
                c.parent_id.as_ref() == Some(comment_id)
                    || c.grand_parent_id.as_ref() == Some(comment_id)
            })
            .collect();
        doomed.sort_by(|a, b| b.depth.cmp(&a.depth));
        let mut doomed: Vec<CommentId> = doomed.into_iter().map(|c| c.id.clone()).collect();
        doomed.push(comment_id.clone());

        for id in &doomed {
            tables.comments.remove(id);
        }
        tables.comment_order.retain(|id| !doomed.contains(id));
        Ok(doomed.len())
    }

    fn update_votes(
        &self,
        article_id: ArticleId,
        comment_id: &CommentId,
        polarity: Polarity,
        delta: i32,
        ancestor_ids: &[CommentId],
    ) -> BackendResult<bool> {
        if comment_id.is_seed() {
            debug!("Not persisting {polarity} on default comment {comment_id}");
            return Ok(false);
        }
        let mut tables = self.tables.write();
        let row = tables
            .comments
            .get_mut(comment_id)
            .filter(|c| c.article_id == article_id)
            .ok_or_else(|| NotFoundError(format!("comment {comment_id}")))?;
        check_ancestors(row, ancestor_ids)?;
        let counter = match polarity {
            Polarity::Upvotes => &mut row.upvotes,
            Polarity::Downvotes => &mut row.downvotes,
        };
        *counter = (*counter + delta).max(0);
        Ok(true)
    }

    fn read(&self, article_id: ArticleId, comment_id: &CommentId) -> BackendResult<DbComment> {
        let tables = self.tables.read();
        Ok(tables
            .comment_in_article(article_id, comment_id)
            .cloned()
            .ok_or_else(|| NotFoundError(format!("comment {comment_id}")))?)
    }

    fn list_for_article(&self, article_id: ArticleId) -> BackendResult<Vec<DbComment>> {
        let tables = self.tables.read();
        Ok(tables
            .comment_order
            .iter()
            .filter_map(|id| tables.comment_in_article(article_id, id))
            .cloned()
            .collect())
    }
}

impl ArticleStore for MemoryStore {
    fn create_article(&self, form: ArticleForm) -> BackendResult<Article> {
        let default_comments = normalize_default_comments(form.default_comments)?;
        let mut tables = self.tables.write();
        if let Some(study_id) = form.study_id {
            if !tables.studies.contains_key(&study_id.0) {
                return Err(NotFoundError(format!("study {}", study_id.0)).into());
            }
        }
        let id = Tables::next_id(&tables.articles);
        let article = Article {
            id: ArticleId(id),
            slug: slugify(&form.title),
            title: form.title,
            author: form.author,
            text: form.text,
            study_id: form.study_id,
            show_default_comments: form.show_default_comments,
            default_comments,
            published: Utc::now(),
        };
        tables.articles.insert(id, article.clone());
        Ok(article)
    }

    fn read_article(&self, id: ArticleId) -> BackendResult<Article> {
        Ok(self
            .tables
            .read()
            .articles
            .get(&id.0)
            .cloned()
            .ok_or_else(|| NotFoundError(format!("article {id}")))?)
    }

    fn list_articles(&self, study_id: Option<StudyId>) -> BackendResult<Vec<Article>> {
        Ok(self
            .tables
            .read()
            .articles
            .values()
            .filter(|a| study_id.is_none() || a.study_id == study_id)
            .cloned()
            .collect())
    }

    fn create_study(&self, form: StudyForm) -> BackendResult<Study> {
        let mut tables = self.tables.write();
        let id = Tables::next_id(&tables.studies);
        let study = Study {
            id: StudyId(id),
            name: form.name,
            description: form.description,
            published: Utc::now(),
        };
        tables.studies.insert(id, study.clone());
        Ok(study)
    }

    fn read_study(&self, id: StudyId) -> BackendResult<Study> {
        Ok(self
            .tables
            .read()
            .studies
            .get(&id.0)
            .cloned()
            .ok_or_else(|| NotFoundError(format!("study {}", id.0)))?)
    }

    fn list_studies(&self) -> BackendResult<Vec<Study>> {
        Ok(self.tables.read().studies.values().cloned().collect())
    }
}

impl InteractionStore for MemoryStore {
    fn log_interaction(&self, form: InteractionForm) -> BackendResult<Interaction> {
        let mut tables = self.tables.write();
        let interaction = Interaction {
            id: InteractionId(tables.interactions.len() as i32 + 1),
            user_id: form.user_id,
            response_id: form.response_id,
            study_id: form.study_id,
            study_name: form.study_name,
            article_id: form.article_id,
            article_title: form.article_title,
            action: form.action,
            details: form.details,
            url: form.url,
            ip_address: form.ip_address,
            timestamp: Utc::now(),
        };
        tables.interactions.push(interaction.clone());
        Ok(interaction)
    }

    fn list_interactions(&self, query: &InteractionQuery) -> BackendResult<Vec<Interaction>> {
        Ok(self
            .tables
            .read()
            .interactions
            .iter()
            .filter(|i| query.matches(i))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::ANONYMOUS_NAME;
    use pretty_assertions::assert_eq;

    fn store_with_article() -> BackendResult<(MemoryStore, ArticleId)> {
        let store = MemoryStore::default();
        let article = store.create_article(ArticleForm {
            title: "Local election results".to_string(),
            author: "Newsroom".to_string(),
            text: "Turnout was high.".to_string(),
            study_id: None,
            show_default_comments: true,
            default_comments: vec![],
        })?;
        Ok((store, article.id))
    }

    fn form(article_id: ArticleId, content: &str, ancestor_ids: Vec<CommentId>) -> CommentInsertForm {
        CommentInsertForm {
            article_id,
            content: content.to_string(),
            name: None,
            ancestor_ids,
            response_id: None,
        }
    }

    #[test]
    fn test_save_nested() -> BackendResult<()> {
        let (store, article_id) = store_with_article()?;
        let top = store.save(form(article_id, "Great read", vec![]))?;
        let reply = store.save(form(article_id, "Agreed", vec![top.clone()]))?;
        let sub = store.save(form(article_id, "Same", vec![top.clone(), reply.clone()]))?;

        let sub = store.read(article_id, &sub)?;
        assert_eq!(2, sub.depth);
        assert_eq!(Some(reply.clone()), sub.parent_id);
        assert_eq!(Some(top.clone()), sub.grand_parent_id);
        assert_eq!(ANONYMOUS_NAME, sub.name);
        assert_eq!(3, store.list_for_article(article_id)?.len());

        // fourth level is not allowed
        let too_deep = store.save(form(article_id, "x", vec![top.clone(), reply, sub.id]));
        assert!(too_deep.is_err());
        // ancestor path must match the stored chain
        let other = store.save(form(article_id, "Other", vec![]))?;
        let wrong_path = store.save(form(article_id, "x", vec![other, top]));
        assert!(wrong_path.is_err());
        Ok(())
    }

    #[test]
    fn test_save_rejects_unknown_parent() -> BackendResult<()> {
        let (store, article_id) = store_with_article()?;
        let res = store.save(form(article_id, "x", vec![CommentId::from("missing")]));
        assert!(res.is_err_and(|e| e.is_not_found()));
        let res = store.save(form(article_id, "x", vec![CommentId::seed(0)]));
        assert!(res.is_err());
        let res = store.save(form(ArticleId(99), "x", vec![]));
        assert!(res.is_err());
        Ok(())
    }

    #[test]
    fn test_delete_cascades() -> BackendResult<()> {
        let (store, article_id) = store_with_article()?;
        let top = store.save(form(article_id, "Great read", vec![]))?;
        let reply = store.save(form(article_id, "Agreed", vec![top.clone()]))?;
        store.save(form(article_id, "Same", vec![top.clone(), reply.clone()]))?;
        let other = store.save(form(article_id, "Unrelated", vec![]))?;

        assert_eq!(3, store.delete(article_id, &top, None, None)?);
        let remaining = store.list_for_article(article_id)?;
        assert_eq!(1, remaining.len());
        assert_eq!(other, remaining[0].id);
        assert_eq!(0, store.delete(article_id, &top, None, None)?);
        Ok(())
    }

    #[test]
    fn test_delete_checks_path() -> BackendResult<()> {
        let (store, article_id) = store_with_article()?;
        let top = store.save(form(article_id, "Great read", vec![]))?;
        let reply = store.save(form(article_id, "Agreed", vec![top.clone()]))?;
        let res = store.delete(article_id, &reply, Some(&reply), None);
        assert!(res.is_err());
        assert_eq!(1, store.delete(article_id, &reply, Some(&top), None)?);
        Ok(())
    }

    #[test]
    fn test_update_votes() -> BackendResult<()> {
        let (store, article_id) = store_with_article()?;
        let top = store.save(form(article_id, "Great read", vec![]))?;
        assert!(store.update_votes(article_id, &top, Polarity::Upvotes, 1, &[])?);
        assert!(store.update_votes(article_id, &top, Polarity::Downvotes, -1, &[])?);
        let row = store.read(article_id, &top)?;
        assert_eq!(1, row.upvotes);
        assert_eq!(0, row.downvotes);

        assert!(!store.update_votes(article_id, &CommentId::seed(1), Polarity::Upvotes, 1, &[])?);
        Ok(())
    }

    #[test]
    fn test_interactions_filter() -> BackendResult<()> {
        let (store, article_id) = store_with_article()?;
        for action in ["view_article", "vote", "vote"] {
            store.log_interaction(InteractionForm {
                user_id: "browser".to_string(),
                response_id: None,
                study_id: None,
                study_name: None,
                article_id: Some(article_id),
                article_title: None,
                action: action.to_string(),
                details: serde_json::Value::Null,
                url: None,
                ip_address: None,
            })?;
        }
        let query = InteractionQuery {
            action: Some("vote".to_string()),
            ..Default::default()
        };
        assert_eq!(2, store.list_interactions(&query)?.len());
        assert_eq!(3, store.list_interactions(&InteractionQuery::default())?.len());
        Ok(())
    }
}
