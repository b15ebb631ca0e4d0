//! Bazaar backend.
//!
//! Bazaar has no log templates, so its native human-readable layout is
//! decoded directly: records are separated by a horizontal rule and each
//! record runs through a small per-line state machine (metadata, message,
//! diff). Bazaar's `since..` range includes the lower bound, so bounded
//! history drops the final record.

use chrono::{DateTime, Utc};

use crate::backend::VcsBackend;
use crate::error::{VcsError, VcsResult};
use crate::types::{Branch, Revision, Tag};
use crate::util::{split_author, split_message, two_column_lines};

const RECORD_RULE: &str =
    "------------------------------------------------------------";
const MERGED_FOOTER: &str = "Use --include-merged or -n0 to see merged revisions.";
const TIMESTAMP_LAYOUT: &str = "%a %Y-%m-%d %H:%M:%S %z";

/// Parser position within one log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    Metadata,
    Message,
    Diff,
}

/// Fields accumulated while scanning one record.
#[derive(Debug, Default)]
struct RecordFields {
    identifier: String,
    author: String,
    email: String,
    timestamp: Option<DateTime<Utc>>,
    message: Vec<String>,
    diff: Vec<String>,
}

fn parse_timestamp(value: &str) -> VcsResult<DateTime<Utc>> {
    DateTime::parse_from_str(value, TIMESTAMP_LAYOUT)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| VcsError::MalformedOutput(format!("invalid timestamp {:?}", value)))
}

/// Advance the state machine by one line.
///
/// Pure in (state, line): field updates go into `fields`, the returned
/// value is the next state. Metadata prefixes are recognized in any
/// state; unrecognized lines are only legal outside the metadata state.
fn scan_line(
    state: RecordState,
    line: &str,
    fields: &mut RecordFields,
) -> VcsResult<RecordState> {
    if let Some(rest) = line.strip_prefix("revno:") {
        let id = rest.trim_start();
        fields.identifier = id.strip_suffix(" [merge]").unwrap_or(id).to_string();
        return Ok(state);
    }
    if let Some(rest) = line.strip_prefix("committer:") {
        let (author, email) = split_author(rest.trim_start());
        fields.author = author;
        fields.email = email;
        return Ok(state);
    }
    if let Some(rest) = line.strip_prefix("timestamp:") {
        fields.timestamp = Some(parse_timestamp(rest.trim_start())?);
        return Ok(state);
    }
    if line.starts_with("message:") {
        return Ok(RecordState::Message);
    }
    if line.starts_with("diff:") {
        return Ok(RecordState::Diff);
    }
    if line.starts_with("branch nick:")
        || line.starts_with("tags:")
        || line.starts_with("author:")
        || line.starts_with("fixes bug:")
    {
        // Recognized metadata we do not map into the record yet.
        return Ok(state);
    }
    match state {
        RecordState::Message => {
            fields.message.push(line.to_string());
            Ok(state)
        }
        RecordState::Diff => {
            fields.diff.push(line.to_string());
            Ok(state)
        }
        RecordState::Metadata => {
            if line.is_empty() || line == RECORD_RULE || line == MERGED_FOOTER {
                Ok(state)
            } else {
                Err(VcsError::MalformedOutput(format!(
                    "unknown line {:?}",
                    line
                )))
            }
        }
    }
}

fn parse_record(record: &str) -> VcsResult<Option<Revision>> {
    let mut state = RecordState::Metadata;
    let mut fields = RecordFields::default();
    for line in record.split('\n') {
        state = scan_line(state, line, &mut fields).map_err(|err| match err {
            VcsError::MalformedOutput(msg) => {
                VcsError::MalformedOutput(format!("{} in record {:?}", msg, record))
            }
            other => other,
        })?;
    }
    // Chunks without a revno (e.g. the trailing footer) produce nothing.
    if fields.identifier.is_empty() {
        return Ok(None);
    }
    let timestamp = fields.timestamp.ok_or_else(|| {
        VcsError::MalformedOutput(format!("record {:?} has no timestamp", fields.identifier))
    })?;
    let message: Vec<&str> = fields.message.iter().map(String::as_str).collect();
    let (subject, body) = split_message(&message);
    Ok(Some(Revision {
        short_identifier: fields.identifier.clone(),
        identifier: fields.identifier,
        subject,
        message: body,
        author: fields.author,
        email: fields.email,
        diff: fields.diff.join("\n").trim().to_string(),
        timestamp,
    }))
}

pub struct Bazaar;

impl VcsBackend for Bazaar {
    fn name(&self) -> &'static str {
        "bzr"
    }

    fn marker(&self) -> &'static str {
        ".bzr"
    }

    fn head(&self) -> &'static str {
        "-1"
    }

    fn inclusive_since(&self) -> bool {
        true
    }

    fn revision_args(&self, id: &str) -> Vec<String> {
        vec![
            "log".to_string(),
            "-p".to_string(),
            "-r".to_string(),
            id.to_string(),
        ]
    }

    fn history_args(&self, since: &str) -> Vec<String> {
        let mut args = vec!["log".to_string(), "-p".to_string()];
        if !since.is_empty() {
            args.push("-r".to_string());
            args.push(format!("{}..", since));
        }
        args
    }

    fn checkout_args(&self, rev: &str) -> Vec<String> {
        let rev = if rev.is_empty() { "-1" } else { rev };
        vec!["revert".to_string(), "-r".to_string(), rev.to_string()]
    }

    fn clone_args(&self, src: &str, dst: &str) -> Vec<String> {
        vec![
            "branch".to_string(),
            src.to_string(),
            dst.to_string(),
            "--use-existing-dir".to_string(),
        ]
    }

    fn update_args(&self) -> Vec<String> {
        vec!["pull".to_string(), "--overwrite".to_string()]
    }

    fn branches_args(&self) -> Option<Vec<String>> {
        None
    }

    fn tags_args(&self) -> Vec<String> {
        vec!["tags".to_string()]
    }

    fn parse_revisions(&self, data: &str) -> VcsResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        for record in data.split(&format!("\n{}\n", RECORD_RULE)) {
            if record.is_empty() {
                continue;
            }
            if let Some(rev) = parse_record(record)? {
                revisions.push(rev);
            }
        }
        Ok(revisions)
    }

    fn parse_branches(&self, _data: &str) -> VcsResult<Vec<Branch>> {
        Err(VcsError::Unsupported {
            vcs: "bzr",
            operation: "listing branches",
        })
    }

    fn parse_tags(&self, data: &str) -> VcsResult<Vec<Tag>> {
        Ok(two_column_lines(data)
            .into_iter()
            .map(|(name, revision)| Tag { name, revision })
            .collect())
    }
}
