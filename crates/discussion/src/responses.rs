//! Joins exported survey responses with the interaction log export of the dashboard, so that
//! every logged action carries the answers of the participant who performed it.

use anyhow::anyhow;
use itertools::Itertools;
use log::warn;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::{Display, Formatter},
    io::{Read, Write},
};
use threadlab_database::error::BackendResult;

/// Survey column holding the response id.
pub const SURVEY_KEY: &str = "ResponseId";
/// Log column holding the response id which the survey passed to the article page.
pub const LOG_KEY: &str = "qualtricsResponseId";
/// Prefix for survey columns in the merged output.
pub const SURVEY_PREFIX: &str = "qualtrics_";
pub const MATCH_STATUS: &str = "_match_status";

/// Log columns which come first in the merged output, if present.
const STANDARD_LOG_COLUMNS: [&str; 12] = [
    "qualtricsResponseId",
    "userId",
    "studyId",
    "studyName",
    "ipAddress",
    "action",
    "details",
    "timestamp",
    "url",
    "articleId",
    "articleTitle",
    "id",
];

pub type Row = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    Matched,
    NoResponseId,
    ResponseIdNotFound,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "matched",
            MatchStatus::NoResponseId => "no_qualtrics_id",
            MatchStatus::ResponseIdNotFound => "qualtrics_id_not_found",
        }
    }
}

/// Read a survey export. The file starts with three header rows (column names, question
/// labels and import ids), only the first one is used. Rows without response id are skipped,
/// a later row with the same id replaces an earlier one.
pub fn read_survey<R: Read>(reader: R) -> BackendResult<HashMap<String, Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.records();
    let headers: Vec<String> = records
        .next()
        .transpose()?
        .ok_or_else(|| anyhow!("Survey file is empty"))?
        .iter()
        .map(str::to_string)
        .collect();
    let key_index = headers
        .iter()
        .position(|h| h == SURVEY_KEY)
        .ok_or_else(|| {
            anyhow!(
                "Column {SURVEY_KEY} not found in survey file, available columns: {}",
                headers.iter().take(10).join(", ")
            )
        })?;
    // labels and import ids
    for _ in 0..2 {
        records.next().transpose()?;
    }

    let mut responses = HashMap::new();
    for record in records {
        let record = record?;
        let Some(response_id) = record.get(key_index).map(str::trim) else {
            continue;
        };
        if response_id.is_empty() {
            continue;
        }
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();
        responses.insert(response_id.to_string(), row);
    }
    Ok(responses)
}

/// Read an interaction log csv as exported by the dashboard.
pub fn read_logs<R: Read>(reader: R) -> BackendResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let mut logs = vec![];
    for record in reader.records() {
        let record = record?;
        logs.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(logs)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeReport {
    pub rows: Vec<Row>,
    pub survey_responses: usize,
    pub log_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub logs_without_id: usize,
    pub matched_ids: BTreeSet<String>,
    /// Survey responses which no log row refers to, sorted
    pub responses_without_logs: Vec<String>,
}

/// Every log row is kept. Survey fields are added to matching rows with [SURVEY_PREFIX], and
/// each row gets a [MATCH_STATUS] column.
pub fn merge(survey: &HashMap<String, Row>, logs: Vec<Row>) -> MergeReport {
    let mut report = MergeReport {
        survey_responses: survey.len(),
        log_rows: logs.len(),
        ..Default::default()
    };
    for mut log in logs {
        let response_id = log
            .get(LOG_KEY)
            .map(|r| r.trim().to_string())
            .unwrap_or_default();
        let status = if response_id.is_empty() {
            report.logs_without_id += 1;
            MatchStatus::NoResponseId
        } else if let Some(response) = survey.get(&response_id) {
            for (key, value) in response {
                log.insert(format!("{SURVEY_PREFIX}{key}"), value.clone());
            }
            report.matched_ids.insert(response_id);
            MatchStatus::Matched
        } else {
            MatchStatus::ResponseIdNotFound
        };
        if status == MatchStatus::Matched {
            report.matched += 1;
        } else {
            report.unmatched += 1;
        }
        log.insert(MATCH_STATUS.to_string(), status.as_str().to_string());
        report.rows.push(log);
    }
    report.responses_without_logs = survey
        .keys()
        .filter(|id| !report.matched_ids.contains(*id))
        .cloned()
        .sorted()
        .collect();
    report
}

/// Standard log columns that exist, then survey columns, then remaining columns, then
/// metadata columns starting with `_`. Each group after the first is sorted.
pub fn ordered_columns(rows: &[Row]) -> Vec<String> {
    let all: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();
    let mut columns: Vec<String> = STANDARD_LOG_COLUMNS
        .iter()
        .filter(|c| all.contains(*c))
        .map(|c| c.to_string())
        .collect();
    let rest = all
        .iter()
        .copied()
        .filter(|c| !STANDARD_LOG_COLUMNS.contains(c));
    let (survey, other): (Vec<&str>, Vec<&str>) =
        rest.partition(|c| c.starts_with(SURVEY_PREFIX));
    let (meta, other): (Vec<&str>, Vec<&str>) = other.into_iter().partition(|c| c.starts_with('_'));
    columns.extend(
        survey
            .into_iter()
            .chain(other)
            .chain(meta)
            .map(str::to_string),
    );
    columns
}

/// Write merged rows, missing values are left empty. Nothing is written if there are no
/// rows.
pub fn write_merged<W: Write>(rows: &[Row], writer: W) -> BackendResult<()> {
    if rows.is_empty() {
        warn!("No merged rows to write");
        return Ok(());
    }
    let columns = ordered_columns(rows);
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

impl Display for MergeReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let line = "=".repeat(70);
        writeln!(f, "{line}")?;
        writeln!(f, "MERGE SUMMARY")?;
        writeln!(f, "{line}")?;
        writeln!(f, "Survey responses loaded: {}", self.survey_responses)?;
        writeln!(f, "Log entries loaded: {}", self.log_rows)?;
        writeln!(f)?;
        writeln!(f, "Matched log entries: {}", self.matched)?;
        writeln!(f, "Unmatched log entries: {}", self.unmatched)?;
        writeln!(f, "Unique response ids matched: {}", self.matched_ids.len())?;
        if !self.responses_without_logs.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Survey responses without logs: {}",
                self.responses_without_logs.len()
            )?;
            let shown = self.responses_without_logs.iter().take(10).join(", ");
            if self.responses_without_logs.len() > 10 {
                writeln!(f, "  Response ids (first 10): {shown}...")?;
            } else {
                writeln!(f, "  Response ids: {shown}")?;
            }
        }
        if self.logs_without_id > 0 {
            writeln!(f)?;
            writeln!(f, "Log entries without {LOG_KEY}: {}", self.logs_without_id)?;
        }
        write!(f, "{line}")
    }
}
