use super::PgStore;
use crate::{
    common::{
        article::{Article, ArticleForm, Study, StudyForm, normalize_default_comments, slugify},
        newtypes::{ArticleId, StudyId},
    },
    error::BackendResult,
    impls::ArticleStore,
    schema::{article, study},
};
use chrono::{DateTime, Utc};
use diesel::{
    ExpressionMethods,
    Insertable,
    QueryDsl,
    Queryable,
    RunQueryDsl,
    Selectable,
    SelectableHelper,
    insert_into,
};
use std::ops::DerefMut;

/// Article row as stored, seed comments are kept as json.
#[derive(Queryable, Selectable)]
#[diesel(table_name = article, check_for_backend(diesel::pg::Pg))]
struct DbArticle {
    id: ArticleId,
    title: String,
    slug: String,
    author: String,
    text: String,
    study_id: Option<StudyId>,
    show_default_comments: bool,
    default_comments: serde_json::Value,
    published: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = article, check_for_backend(diesel::pg::Pg))]
struct DbArticleForm {
    title: String,
    slug: String,
    author: String,
    text: String,
    study_id: Option<StudyId>,
    show_default_comments: bool,
    default_comments: serde_json::Value,
}

#[derive(Insertable)]
#[diesel(table_name = study, check_for_backend(diesel::pg::Pg))]
struct DbStudyForm {
    name: String,
    description: String,
}

impl TryFrom<DbArticle> for Article {
    type Error = serde_json::Error;

    fn try_from(row: DbArticle) -> Result<Self, Self::Error> {
        Ok(Article {
            id: row.id,
            title: row.title,
            slug: row.slug,
            author: row.author,
            text: row.text,
            study_id: row.study_id,
            show_default_comments: row.show_default_comments,
            default_comments: serde_json::from_value(row.default_comments)?,
            published: row.published,
        })
    }
}

impl ArticleStore for PgStore {
    fn create_article(&self, form: ArticleForm) -> BackendResult<Article> {
        let default_comments = normalize_default_comments(form.default_comments)?;
        let form = DbArticleForm {
            slug: slugify(&form.title),
            title: form.title,
            author: form.author,
            text: form.text,
            study_id: form.study_id,
            show_default_comments: form.show_default_comments,
            default_comments: serde_json::to_value(default_comments)?,
        };
        let mut conn = self.conn()?;
        let row: DbArticle = insert_into(article::table)
            .values(form)
            .returning(DbArticle::as_returning())
            .get_result(conn.deref_mut())?;
        Ok(row.try_into()?)
    }

    fn read_article(&self, id: ArticleId) -> BackendResult<Article> {
        let mut conn = self.conn()?;
        let row: DbArticle = article::table
            .find(id)
            .select(DbArticle::as_select())
            .get_result(conn.deref_mut())?;
        Ok(row.try_into()?)
    }

    fn list_articles(&self, study_id: Option<StudyId>) -> BackendResult<Vec<Article>> {
        let mut conn = self.conn()?;
        let mut query = article::table
            .select(DbArticle::as_select())
            .order_by(article::id.asc())
            .into_boxed();
        if let Some(study_id) = study_id {
            query = query.filter(article::study_id.eq(study_id));
        }
        let rows: Vec<DbArticle> = query.get_results(conn.deref_mut())?;
        Ok(rows
            .into_iter()
            .map(Article::try_from)
            .collect::<Result<_, _>>()?)
    }

    fn create_study(&self, form: StudyForm) -> BackendResult<Study> {
        let mut conn = self.conn()?;
        let form = DbStudyForm {
            name: form.name,
            description: form.description,
        };
        Ok(insert_into(study::table)
            .values(form)
            .returning(Study::as_returning())
            .get_result(conn.deref_mut())?)
    }

    fn read_study(&self, id: StudyId) -> BackendResult<Study> {
        let mut conn = self.conn()?;
        Ok(study::table
            .find(id)
            .select(Study::as_select())
            .get_result(conn.deref_mut())?)
    }

    fn list_studies(&self) -> BackendResult<Vec<Study>> {
        let mut conn = self.conn()?;
        Ok(study::table
            .order_by(study::id.asc())
            .select(Study::as_select())
            .get_results(conn.deref_mut())?)
    }
}
