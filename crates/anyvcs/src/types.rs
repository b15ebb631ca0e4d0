use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single commit decoded from backend log output.
///
/// `identifier` is never empty for an emitted record, and `timestamp` is
/// always UTC regardless of how the backend encodes timezones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Full revision identifier.
    pub identifier: String,
    /// Abbreviated identifier. Backends without a short form repeat the
    /// full identifier here.
    pub short_identifier: String,
    /// First line of the commit message.
    pub subject: String,
    /// Remaining message lines, trimmed.
    pub message: String,
    pub author: String,
    pub email: String,
    /// Trimmed patch text, empty when the log was not requested with a diff.
    pub diff: String,
    pub timestamp: DateTime<Utc>,
}

/// A branch head. The name never carries a ref namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub revision: String,
}

/// A tag. The name never carries a ref namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub revision: String,
}
