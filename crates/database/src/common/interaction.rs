use super::newtypes::{ArticleId, InteractionId, StudyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "postgres")]
use {
    crate::schema::interaction,
    diesel::{Identifiable, Insertable, Queryable, Selectable},
};

/// One silently recorded reader action, exported through the research dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(Queryable, Selectable, Identifiable))]
#[cfg_attr(feature = "postgres", diesel(table_name = interaction, check_for_backend(diesel::pg::Pg)))]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: InteractionId,
    pub user_id: String,
    #[serde(rename = "qualtricsResponseId")]
    pub response_id: Option<String>,
    pub study_id: Option<StudyId>,
    pub study_name: Option<String>,
    pub article_id: Option<ArticleId>,
    pub article_title: Option<String>,
    pub action: String,
    pub details: serde_json::Value,
    pub url: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "postgres", derive(Insertable))]
#[cfg_attr(feature = "postgres", diesel(table_name = interaction, check_for_backend(diesel::pg::Pg)))]
pub struct InteractionForm {
    pub user_id: String,
    pub response_id: Option<String>,
    pub study_id: Option<StudyId>,
    pub study_name: Option<String>,
    pub article_id: Option<ArticleId>,
    pub article_title: Option<String>,
    pub action: String,
    pub details: serde_json::Value,
    pub url: Option<String>,
    pub ip_address: Option<String>,
}

/// Actions recorded by the backend itself. Clients may log additional free-form actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionAction {
    ViewArticle,
    PostComment,
    PostReply,
    PostSubReply,
    Vote,
    DeleteComment,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::ViewArticle => "view_article",
            InteractionAction::PostComment => "post_comment",
            InteractionAction::PostReply => "post_reply",
            InteractionAction::PostSubReply => "post_sub_reply",
            InteractionAction::Vote => "vote",
            InteractionAction::DeleteComment => "delete_comment",
        }
    }

    /// Action for posting a comment at the given depth.
    pub fn post_at_depth(depth: usize) -> Self {
        match depth {
            0 => InteractionAction::PostComment,
            1 => InteractionAction::PostReply,
            _ => InteractionAction::PostSubReply,
        }
    }
}

/// Filter for listing interactions. All set fields must match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionQuery {
    pub study_id: Option<StudyId>,
    pub article_id: Option<ArticleId>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl InteractionQuery {
    pub fn matches(&self, interaction: &Interaction) -> bool {
        self.study_id.is_none_or(|s| interaction.study_id == Some(s))
            && self
                .article_id
                .is_none_or(|a| interaction.article_id == Some(a))
            && self
                .action
                .as_ref()
                .is_none_or(|a| &interaction.action == a)
            && self.from.is_none_or(|f| interaction.timestamp >= f)
            && self.to.is_none_or(|t| interaction.timestamp <= t)
    }
}
