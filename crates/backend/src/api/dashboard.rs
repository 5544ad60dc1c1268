use super::AdminExt;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use threadlab_api_client::dashboard::{DashboardCommentsParams, DashboardLogsParams, ExportFormat};
use threadlab_database::{
    common::{article::ArticleView, interaction::InteractionQuery},
    error::BackendResult,
    impls::{ThreadlabContext, tree::build_comment_tree},
};
use threadlab_discussion::{
    export::{summarize_interactions, to_csv, to_json},
    flatten::{RowFilter, filter_rows, flatten_articles, sort_rows, summarize},
};

fn csv_response(body: String, filename: &str) -> Response {
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn json_response(body: String) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}

/// All comments of the selected articles as flat rows, seed comments optionally included.
#[debug_handler]
pub(super) async fn dashboard_comments(
    _admin: AdminExt,
    State(context): State<ThreadlabContext>,
    Query(params): Query<DashboardCommentsParams>,
) -> BackendResult<Response> {
    let views = context
        .store
        .list_articles(params.study_id)?
        .into_iter()
        .filter(|a| params.article_id.is_none_or(|id| id == a.id))
        .map(|article| {
            let comments = build_comment_tree(&*context.store, article.id)?;
            Ok(ArticleView { article, comments })
        })
        .collect::<BackendResult<Vec<_>>>()?;

    let filter = RowFilter {
        search: params.search,
        article_id: params.article_id,
        origin: params.origin,
    };
    let mut rows = filter_rows(flatten_articles(&views, params.show_default), &filter);
    sort_rows(&mut rows, params.sort, params.order);

    Ok(match params.format {
        ExportFormat::Csv => csv_response(to_csv(&rows)?, "comments.csv"),
        ExportFormat::Json => json_response(to_json(summarize(&rows), rows)?),
    })
}

/// Interaction logs matching the filter, oldest first.
#[debug_handler]
pub(super) async fn dashboard_logs(
    _admin: AdminExt,
    State(context): State<ThreadlabContext>,
    Query(params): Query<DashboardLogsParams>,
) -> BackendResult<Response> {
    let query = InteractionQuery {
        study_id: params.study_id,
        article_id: params.article_id,
        action: params.action.filter(|a| !a.trim().is_empty()),
        from: params.from,
        to: params.to,
    };
    let logs = context.store.list_interactions(&query)?;
    Ok(match params.format {
        ExportFormat::Csv => csv_response(to_csv(&logs)?, "logs.csv"),
        ExportFormat::Json => json_response(to_json(summarize_interactions(&logs), logs)?),
    })
}
