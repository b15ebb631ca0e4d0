//! Mercurial backend.
//!
//! Log output uses a sentinel-delimited `--template`, like the git
//! backend, but author and timestamp need extra normalization: the author
//! is a single mailbox string and the date carries a fractional part with
//! a timezone offset. Mercurial's `tip:since` range includes both
//! endpoints, so bounded history drops the final record.

use crate::backend::VcsBackend;
use crate::error::{VcsError, VcsResult};
use crate::types::{Branch, Revision, Tag};
use crate::util::{split_author, split_message, two_column_lines, unix_timestamp};

use super::{BEGIN_RECORD, END_MESSAGE};

fn log_template() -> String {
    format!(
        "--template={}{{node}}\n{{node|short}}\n{{author}}\n{{date}}\n{{desc}}\n{}\n",
        BEGIN_RECORD, END_MESSAGE
    )
}

pub struct Mercurial;

impl VcsBackend for Mercurial {
    fn name(&self) -> &'static str {
        "hg"
    }

    fn marker(&self) -> &'static str {
        ".hg"
    }

    fn head(&self) -> &'static str {
        "tip"
    }

    fn inclusive_since(&self) -> bool {
        true
    }

    fn revision_args(&self, id: &str) -> Vec<String> {
        vec![
            "log".to_string(),
            "-pr".to_string(),
            id.to_string(),
            log_template(),
        ]
    }

    fn history_args(&self, since: &str) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            "-p".to_string(),
            "-b".to_string(),
            "default".to_string(),
        ];
        if !since.is_empty() {
            args.push("-r".to_string());
            args.push(format!("tip:{}", since));
        }
        args.push(log_template());
        args
    }

    fn checkout_args(&self, rev: &str) -> Vec<String> {
        let rev = if rev.is_empty() { "tip" } else { rev };
        vec![
            "update".to_string(),
            "-C".to_string(),
            "-r".to_string(),
            rev.to_string(),
        ]
    }

    fn clone_args(&self, src: &str, dst: &str) -> Vec<String> {
        vec!["clone".to_string(), src.to_string(), dst.to_string()]
    }

    fn update_args(&self) -> Vec<String> {
        vec!["pull".to_string(), "-u".to_string()]
    }

    fn branches_args(&self) -> Option<Vec<String>> {
        Some(vec!["branches".to_string()])
    }

    fn tags_args(&self) -> Vec<String> {
        vec!["tags".to_string()]
    }

    fn parse_revisions(&self, data: &str) -> VcsResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        for record in data.split(BEGIN_RECORD) {
            if record.is_empty() {
                continue;
            }
            let lines: Vec<&str> = record.split('\n').collect();
            if lines.len() < 4 {
                return Err(VcsError::MalformedOutput(format!(
                    "truncated log record {:?}",
                    record
                )));
            }
            let (author, email) = split_author(lines[2]);
            let timestamp = unix_timestamp(lines[3])?;
            let mut idx = 4;
            let mut msg = Vec::new();
            while idx < lines.len() && lines[idx] != END_MESSAGE {
                msg.push(lines[idx]);
                idx += 1;
            }
            let (subject, message) = split_message(&msg);
            let diff = lines.get(idx + 1..).unwrap_or(&[]).join("\n");
            revisions.push(Revision {
                identifier: lines[0].to_string(),
                short_identifier: lines[1].to_string(),
                subject,
                message,
                author,
                email,
                diff: diff.trim().to_string(),
                timestamp,
            });
        }
        Ok(revisions)
    }

    // Mercurial lists names first, revisions second.

    fn parse_branches(&self, data: &str) -> VcsResult<Vec<Branch>> {
        Ok(two_column_lines(data)
            .into_iter()
            .map(|(name, revision)| Branch { name, revision })
            .collect())
    }

    fn parse_tags(&self, data: &str) -> VcsResult<Vec<Tag>> {
        Ok(two_column_lines(data)
            .into_iter()
            .map(|(name, revision)| Tag { name, revision })
            .collect())
    }
}
