//! Git backend.
//!
//! Log output is generated through a custom `--format` template delimited
//! by the record sentinels, which makes decoding a fixed-position line
//! split. Git's native `since..HEAD` range already excludes the lower
//! bound, so bounded history needs no trimming.

use crate::backend::VcsBackend;
use crate::error::{VcsError, VcsResult};
use crate::types::{Branch, Revision, Tag};
use crate::util::{two_column_lines, unix_timestamp};

use super::{BEGIN_RECORD, END_MESSAGE};

fn log_format() -> String {
    format!(
        "--format={}%H%n%h%n%an%n%ae%n%at%n%s%n%b%n{}",
        BEGIN_RECORD, END_MESSAGE
    )
}

pub struct Git;

impl VcsBackend for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn marker(&self) -> &'static str {
        ".git"
    }

    fn head(&self) -> &'static str {
        "HEAD"
    }

    fn inclusive_since(&self) -> bool {
        false
    }

    fn revision_args(&self, id: &str) -> Vec<String> {
        vec!["show".to_string(), id.to_string(), log_format()]
    }

    fn history_args(&self, since: &str) -> Vec<String> {
        let mut args = vec!["log".to_string(), "-p".to_string()];
        if !since.is_empty() {
            args.push(format!("{}..HEAD", since));
        }
        args.push(log_format());
        args
    }

    fn checkout_args(&self, rev: &str) -> Vec<String> {
        let rev = if rev.is_empty() { "master" } else { rev };
        vec![
            "checkout".to_string(),
            "-f".to_string(),
            rev.to_string(),
        ]
    }

    fn clone_args(&self, src: &str, dst: &str) -> Vec<String> {
        vec!["clone".to_string(), src.to_string(), dst.to_string()]
    }

    fn update_args(&self) -> Vec<String> {
        // --rebase repairs the local history when upstream was rebased.
        vec![
            "pull".to_string(),
            "-f".to_string(),
            "--rebase".to_string(),
        ]
    }

    fn branches_args(&self) -> Option<Vec<String>> {
        Some(vec!["show-ref".to_string(), "--heads".to_string()])
    }

    fn tags_args(&self) -> Vec<String> {
        vec!["show-ref".to_string(), "--tags".to_string()]
    }

    fn parse_revisions(&self, data: &str) -> VcsResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        for record in data.split(BEGIN_RECORD) {
            if record.is_empty() {
                continue;
            }
            let lines: Vec<&str> = record.split('\n').collect();
            if lines.len() < 6 {
                return Err(VcsError::MalformedOutput(format!(
                    "truncated log record {:?}",
                    record
                )));
            }
            let timestamp = unix_timestamp(lines[4])?;
            let mut idx = 6;
            let mut message = Vec::new();
            while idx < lines.len() && lines[idx] != END_MESSAGE {
                message.push(lines[idx]);
                idx += 1;
            }
            let diff = lines.get(idx + 1..).unwrap_or(&[]).join("\n");
            revisions.push(Revision {
                identifier: lines[0].to_string(),
                short_identifier: lines[1].to_string(),
                subject: lines[5].to_string(),
                message: message.join("\n").trim().to_string(),
                author: lines[2].to_string(),
                email: lines[3].to_string(),
                diff: diff.trim().to_string(),
                timestamp,
            });
        }
        Ok(revisions)
    }

    fn parse_branches(&self, data: &str) -> VcsResult<Vec<Branch>> {
        Ok(two_column_lines(data)
            .into_iter()
            .map(|(revision, name)| Branch {
                name: name.trim_start_matches("refs/heads/").to_string(),
                revision,
            })
            .collect())
    }

    fn parse_tags(&self, data: &str) -> VcsResult<Vec<Tag>> {
        Ok(two_column_lines(data)
            .into_iter()
            .map(|(revision, name)| Tag {
                name: name.trim_start_matches("refs/tags/").to_string(),
                revision,
            })
            .collect())
    }
}
