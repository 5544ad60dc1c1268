//! Export formats of the research dashboard. CSV has a single header row and every value is
//! quoted, JSON is a pretty printed document with a summary and the rows.

use crate::flatten::FlatComment;
use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use threadlab_database::{common::interaction::Interaction, error::BackendResult};

/// A row type which can be written as CSV.
pub trait CsvRecord {
    fn headers() -> &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

/// ISO-8601 in UTC with millisecond precision, eg `2025-10-01T12:00:00.000Z`.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Strings are written as is, everything else as json.
fn format_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl CsvRecord for FlatComment {
    fn headers() -> &'static [&'static str] {
        &[
            "articleId",
            "articleTitle",
            "articleSlug",
            "articleAuthor",
            "id",
            "content",
            "name",
            "createdAt",
            "upvotes",
            "downvotes",
            "parentId",
            "grandParentId",
            "responseId",
            "depth",
            "isDefault",
            "replyCount",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.article_id.to_string(),
            self.article_title.clone(),
            self.article_slug.clone(),
            self.article_author.clone(),
            self.id.to_string(),
            self.content.clone(),
            self.name.clone(),
            format_timestamp(&self.created_at),
            self.upvotes.to_string(),
            self.downvotes.to_string(),
            opt(&self.parent_id),
            opt(&self.grand_parent_id),
            opt(&self.response_id),
            self.depth.to_string(),
            self.is_default.to_string(),
            self.reply_count.to_string(),
        ]
    }
}

impl CsvRecord for Interaction {
    /// Column names are the ones expected by `merge-responses`.
    fn headers() -> &'static [&'static str] {
        &[
            "id",
            "qualtricsResponseId",
            "userId",
            "studyId",
            "studyName",
            "articleId",
            "articleTitle",
            "action",
            "details",
            "url",
            "ipAddress",
            "timestamp",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.0.to_string(),
            opt(&self.response_id),
            self.user_id.clone(),
            opt(&self.study_id.map(|s| s.0)),
            opt(&self.study_name),
            opt(&self.article_id),
            opt(&self.article_title),
            self.action.clone(),
            format_json(&self.details),
            opt(&self.url),
            opt(&self.ip_address),
            format_timestamp(&self.timestamp),
        ]
    }
}

pub fn to_csv<T: CsvRecord>(rows: &[T]) -> BackendResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(vec![]);
    writer.write_record(T::headers())?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to write csv: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<S, R> {
    pub exported_at: DateTime<Utc>,
    pub summary: S,
    pub rows: Vec<R>,
}

pub fn to_json<S: Serialize, R: Serialize>(summary: S, rows: Vec<R>) -> BackendResult<String> {
    let document = ExportDocument {
        exported_at: Utc::now(),
        summary,
        rows,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSummary {
    pub total: usize,
    pub unique_users: usize,
    pub with_response_id: usize,
    pub actions: BTreeMap<String, usize>,
}

pub fn summarize_interactions(logs: &[Interaction]) -> InteractionSummary {
    InteractionSummary {
        total: logs.len(),
        unique_users: logs.iter().map(|l| &l.user_id).unique().count(),
        with_response_id: logs
            .iter()
            .filter(|l| l.response_id.as_deref().is_some_and(|r| !r.trim().is_empty()))
            .count(),
        actions: logs
            .iter()
            .map(|l| l.action.clone())
            .counts()
            .into_iter()
            .collect(),
    }
}
