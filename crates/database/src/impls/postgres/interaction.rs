use super::PgStore;
use crate::{
    common::interaction::{Interaction, InteractionForm, InteractionQuery},
    error::BackendResult,
    impls::InteractionStore,
    schema::interaction,
};
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper, insert_into};
use std::ops::DerefMut;

impl InteractionStore for PgStore {
    fn log_interaction(&self, form: InteractionForm) -> BackendResult<Interaction> {
        let mut conn = self.conn()?;
        Ok(insert_into(interaction::table)
            .values(form)
            .returning(Interaction::as_returning())
            .get_result(conn.deref_mut())?)
    }

    fn list_interactions(&self, query: &InteractionQuery) -> BackendResult<Vec<Interaction>> {
        let mut conn = self.conn()?;
        let mut sql = interaction::table
            .select(Interaction::as_select())
            .order_by(interaction::timestamp.asc())
            .into_boxed();
        if let Some(study_id) = query.study_id {
            sql = sql.filter(interaction::study_id.eq(study_id));
        }
        if let Some(article_id) = query.article_id {
            sql = sql.filter(interaction::article_id.eq(article_id));
        }
        if let Some(action) = &query.action {
            sql = sql.filter(interaction::action.eq(action));
        }
        if let Some(from) = query.from {
            sql = sql.filter(interaction::timestamp.ge(from));
        }
        if let Some(to) = query.to {
            sql = sql.filter(interaction::timestamp.le(to));
        }
        Ok(sql.get_results(conn.deref_mut())?)
    }
}
