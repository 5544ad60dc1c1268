use super::{ApiClient, ClientResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadlab_database::common::{
    SuccessResponse,
    interaction::Interaction,
    newtypes::{ArticleId, StudyId},
};
use threadlab_discussion::{
    export::{ExportDocument, InteractionSummary},
    flatten::{CommentOrigin, CommentSummary, FlatComment, SortKey, SortOrder},
};

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// Sent by article pages for reader actions which dont go through another endpoint, like
/// scrolling or leaving the page.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LogInteractionParams {
    pub action: String,
    #[serde(default)]
    pub details: serde_json::Value,
    pub article_id: Option<ArticleId>,
    pub url: Option<String>,
    pub response_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct DashboardCommentsParams {
    pub study_id: Option<StudyId>,
    pub article_id: Option<ArticleId>,
    /// Include the seed comments of each article
    #[serde(default)]
    pub show_default: bool,
    pub search: Option<String>,
    pub origin: Option<CommentOrigin>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct DashboardLogsParams {
    pub study_id: Option<StudyId>,
    pub article_id: Option<ArticleId>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub format: ExportFormat,
}

pub type CommentExport = ExportDocument<CommentSummary, FlatComment>;
pub type LogExport = ExportDocument<InteractionSummary, Interaction>;

impl ApiClient {
    pub async fn log_interaction(
        &self,
        params: &LogInteractionParams,
    ) -> ClientResult<SuccessResponse> {
        self.post("/api/v1/log", Some(params)).await
    }

    pub async fn dashboard_comments(
        &self,
        params: &DashboardCommentsParams,
    ) -> ClientResult<CommentExport> {
        let params = DashboardCommentsParams {
            format: ExportFormat::Json,
            ..params.clone()
        };
        self.get("/api/v1/dashboard/comments", Some(params)).await
    }

    pub async fn dashboard_comments_csv(
        &self,
        params: &DashboardCommentsParams,
    ) -> ClientResult<String> {
        let params = DashboardCommentsParams {
            format: ExportFormat::Csv,
            ..params.clone()
        };
        self.get_text("/api/v1/dashboard/comments", Some(params))
            .await
    }

    pub async fn dashboard_logs(&self, params: &DashboardLogsParams) -> ClientResult<LogExport> {
        let params = DashboardLogsParams {
            format: ExportFormat::Json,
            ..params.clone()
        };
        self.get("/api/v1/dashboard/logs", Some(params)).await
    }

    pub async fn dashboard_logs_csv(&self, params: &DashboardLogsParams) -> ClientResult<String> {
        let params = DashboardLogsParams {
            format: ExportFormat::Csv,
            ..params.clone()
        };
        self.get_text("/api/v1/dashboard/logs", Some(params)).await
    }
}
