use serde::Serialize;

use crate::domain::section::OTHER_LABEL;
use crate::domain::Commit;

/// One commit as it appears in the changelog, after text processing
#[derive(Debug, Clone, Serialize)]
pub struct ChangelogEntry {
    /// Declared author name
    pub author: String,
    /// Author plus co-author display names, sorted
    pub authors: Vec<String>,
    pub subject: String,
    pub body: String,
    pub commit: Commit,
}

impl ChangelogEntry {
    /// Build an entry from a commit using already processed subject and body
    pub fn new(commit: Commit, subject: String, body: String) -> Self {
        ChangelogEntry {
            author: commit.author_name.clone(),
            authors: commit.author_names.clone(),
            subject,
            body,
            commit,
        }
    }
}

/// A topical group of commits within a version
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    /// `None` for commits no classification rule claimed
    pub label: Option<String>,
    pub commits: Vec<ChangelogEntry>,
}

impl Section {
    pub fn new(label: Option<String>) -> Self {
        Section {
            label,
            commits: Vec::new(),
        }
    }

    /// Label to print; unlabeled sections read as "Other"
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(OTHER_LABEL)
    }
}

/// One release bucket: a tag, or the unreleased head when `tag` is `None`
#[derive(Debug, Clone, Serialize)]
pub struct Version {
    pub tag: Option<String>,
    /// Author date of the boundary commit, `YYYY-MM-DD`
    pub date: String,
    pub sections: Vec<Section>,
}

impl Version {
    pub fn is_unreleased(&self) -> bool {
        self.tag.is_none()
    }

    /// Heading text: `tag (date)` for releases, `unreleased_label` otherwise
    pub fn heading(&self, unreleased_label: &str) -> String {
        match &self.tag {
            Some(tag) => format!("{} ({})", tag, self.date),
            None => unreleased_label.to_string(),
        }
    }

    /// Total number of entries across sections
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.commits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Entries in section order
    pub fn entries(&self) -> impl Iterator<Item = &ChangelogEntry> {
        self.sections.iter().flat_map(|s| s.commits.iter())
    }
}
