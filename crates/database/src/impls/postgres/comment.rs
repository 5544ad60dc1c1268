use super::PgStore;
use crate::{
    common::{
        comment::{CommentInsertForm, DbComment, Polarity, display_name},
        newtypes::{ArticleId, CommentId},
    },
    error::{BackendResult, NotFoundError},
    impls::{CommentStore, check_ancestors, check_path, resolve_placement},
    schema::{article, comment},
};
use diesel::{
    Connection,
    ExpressionMethods,
    Insertable,
    OptionalExtension,
    QueryDsl,
    RunQueryDsl,
    SelectableHelper,
    dsl::{delete, exists, insert_into, select, update},
    pg::PgConnection,
};
use log::debug;
use std::ops::DerefMut;

#[derive(Insertable, Debug)]
#[diesel(table_name = comment, check_for_backend(diesel::pg::Pg))]
struct DbCommentInsertForm {
    id: CommentId,
    article_id: ArticleId,
    parent_id: Option<CommentId>,
    grand_parent_id: Option<CommentId>,
    depth: i32,
    content: String,
    name: String,
    response_id: Option<String>,
}

fn read_row(
    conn: &mut PgConnection,
    article_id: ArticleId,
    comment_id: &CommentId,
) -> BackendResult<Option<DbComment>> {
    Ok(comment::table
        .find(comment_id)
        .filter(comment::article_id.eq(article_id))
        .select(DbComment::as_select())
        .first(conn)
        .optional()?)
}

impl CommentStore for PgStore {
    fn save(&self, form: CommentInsertForm) -> BackendResult<CommentId> {
        let mut conn = self.conn()?;
        let conn = conn.deref_mut();
        let article_exists: bool =
            select(exists(article::table.find(form.article_id))).get_result(conn)?;
        if !article_exists {
            return Err(NotFoundError(format!("article {}", form.article_id)).into());
        }
        let placement = resolve_placement(form.article_id, &form.ancestor_ids, |id| {
            Ok(comment::table
                .find(id)
                .select(DbComment::as_select())
                .first(&mut *conn)
                .optional()?)
        })?;
        let insert = DbCommentInsertForm {
            id: CommentId::generate(),
            article_id: form.article_id,
            parent_id: placement.parent_id,
            grand_parent_id: placement.grand_parent_id,
            depth: placement.depth,
            content: form.content,
            name: display_name(form.name.as_deref()),
            response_id: form.response_id,
        };
        // created_at is filled in by the database
        Ok(insert_into(comment::table)
            .values(insert)
            .returning(comment::id)
            .get_result(conn)?)
    }

    fn delete(
        &self,
        article_id: ArticleId,
        comment_id: &CommentId,
        parent_id: Option<&CommentId>,
        grand_parent_id: Option<&CommentId>,
    ) -> BackendResult<usize> {
        let mut conn = self.conn()?;
        conn.deref_mut().transaction(|conn| {
            let Some(row) = read_row(conn, article_id, comment_id)? else {
                debug!("Comment {comment_id} already deleted");
                return Ok(0);
            };
            check_path(&row, parent_id, grand_parent_id)?;

            // Sub-replies first, then replies, so no row is left without its parent
            let sub_replies = delete(
                comment::table
                    .filter(comment::grand_parent_id.eq(comment_id))
                    .filter(comment::depth.eq(2)),
            )
            .execute(conn)?;
            let replies = delete(comment::table.filter(comment::parent_id.eq(comment_id)))
                .execute(conn)?;
            let this = delete(comment::table.find(comment_id)).execute(conn)?;
            Ok(sub_replies + replies + this)
        })
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
        let mut conn = self.conn()?;
        let conn = conn.deref_mut();
        let row = read_row(conn, article_id, comment_id)?
            .ok_or_else(|| NotFoundError(format!("comment {comment_id}")))?;
        check_ancestors(&row, ancestor_ids)?;
        let target = comment::table.find(comment_id);
        // Single statement increment so concurrent votes are not lost
        match polarity {
            Polarity::Upvotes => update(target)
                .set(comment::upvotes.eq(greatest(comment::upvotes + delta, 0)))
                .execute(conn)?,
            Polarity::Downvotes => update(target)
                .set(comment::downvotes.eq(greatest(comment::downvotes + delta, 0)))
                .execute(conn)?,
        };
        Ok(true)
    }

    fn read(&self, article_id: ArticleId, comment_id: &CommentId) -> BackendResult<DbComment> {
        let mut conn = self.conn()?;
        Ok(read_row(conn.deref_mut(), article_id, comment_id)?
            .ok_or_else(|| NotFoundError(format!("comment {comment_id}")))?)
    }

    fn list_for_article(&self, article_id: ArticleId) -> BackendResult<Vec<DbComment>> {
        let mut conn = self.conn()?;
        Ok(comment::table
            .filter(comment::article_id.eq(article_id))
            .order_by((comment::created_at.asc(), comment::id.asc()))
            .select(DbComment::as_select())
            .get_results(conn.deref_mut())?)
    }
}

diesel::define_sql_function!(fn greatest(a: diesel::sql_types::Integer, b: diesel::sql_types::Integer) -> diesel::sql_types::Integer);
