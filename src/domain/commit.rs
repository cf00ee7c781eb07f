use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::domain::trailer::{self, Trailers};

/// Raw metadata as read from the revision graph, before trailer parsing
#[derive(Debug, Clone, Default)]
pub struct CommitFields {
    pub sha1: String,
    pub subject: String,
    /// Body without the subject paragraph
    pub body: String,
    /// Full message, subject included
    pub raw_body: String,
    pub author_name: String,
    pub author_email: String,
    pub author_timestamp: i64,
    pub committer_name: String,
    pub committer_timestamp: i64,
}

/// A fully resolved commit.
///
/// Identity, equality and hashing are by full hash. Ancestry ordering needs
/// the graph and lives on [`crate::git::Repository::compare`].
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    pub sha1: String,
    pub sha1_short: String,
    pub subject: String,
    /// Body with the trailer block removed
    pub body: String,
    pub raw_body: String,
    pub author_name: String,
    pub author_email: String,
    pub author_date: DateTime<Utc>,
    pub committer_name: String,
    pub committer_date: DateTime<Utc>,
    pub trailers: Trailers,
    /// Declared author plus co-authors, `Name <email>`, sorted
    pub authors: Vec<String>,
    /// Display names of `authors`, sorted
    pub author_names: Vec<String>,
}

impl Commit {
    /// Build a commit from raw fields, splitting trailers out of the body
    pub fn from_fields(fields: CommitFields) -> Self {
        let parsed = trailer::parse(&fields.body);
        let authors = trailer::authors(&fields.author_name, &fields.author_email, &parsed.trailers);
        let author_names = trailer::author_names(&authors);
        let sha1_short = fields.sha1.chars().take(7).collect();

        Commit {
            sha1_short,
            sha1: fields.sha1,
            subject: fields.subject,
            body: parsed.body,
            raw_body: fields.raw_body,
            author_name: fields.author_name,
            author_email: fields.author_email,
            author_date: timestamp(fields.author_timestamp),
            committer_name: fields.committer_name,
            committer_date: timestamp(fields.committer_timestamp),
            trailers: parsed.trailers,
            authors,
            author_names,
        }
    }

    /// Author date as `YYYY-MM-DD` (UTC)
    pub fn date(&self) -> String {
        self.author_date.format("%Y-%m-%d").to_string()
    }

    /// Committer timestamp in seconds, the tag ordering key
    pub fn committer_timestamp(&self) -> i64 {
        self.committer_date.timestamp()
    }

    /// Look up a trailer by key; `Co-Authored-By` and `co_authored_by` are equivalent
    pub fn trailer(&self, key: &str) -> Option<&trailer::TrailerValue> {
        self.trailers.get(&trailer::normalize_key(key))
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or_default()
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.sha1 == other.sha1
    }
}

impl Eq for Commit {}

impl Hash for Commit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sha1.hash(state);
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sha1_short, self.subject)
    }
}

/// A commit that is either only named or fully read.
///
/// Graph queries accept both forms; backends resolve names in batches and
/// skip the metadata fetch entirely when only the identifier is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitRef {
    /// Any identifier the graph understands: a hash, tag, branch or `HEAD`
    Unresolved(String),
    Resolved(Box<Commit>),
}

impl CommitRef {
    pub fn named(identifier: impl Into<String>) -> Self {
        CommitRef::Unresolved(identifier.into())
    }

    /// The hash once resolved, the given name otherwise
    pub fn identifier(&self) -> &str {
        match self {
            CommitRef::Unresolved(name) => name,
            CommitRef::Resolved(commit) => &commit.sha1,
        }
    }

    pub fn as_resolved(&self) -> Option<&Commit> {
        match self {
            CommitRef::Resolved(commit) => Some(commit),
            CommitRef::Unresolved(_) => None,
        }
    }
}

impl From<Commit> for CommitRef {
    fn from(commit: Commit) -> Self {
        CommitRef::Resolved(Box::new(commit))
    }
}

impl From<&Commit> for CommitRef {
    fn from(commit: &Commit) -> Self {
        CommitRef::Resolved(Box::new(commit.clone()))
    }
}
