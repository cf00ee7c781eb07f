use regex::Regex;

use crate::domain::Commit;
use crate::error::{ChangelogError, Result};

/// Represents a git tag and the commit it points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit: Commit,
}

impl Tag {
    /// Create a new tag pointing at `commit`
    pub fn new(name: impl Into<String>, commit: Commit) -> Self {
        Tag {
            name: name.into(),
            commit,
        }
    }

    /// Ordering key used when partitioning: the tagged commit's committer time
    pub fn timestamp(&self) -> i64 {
        self.commit.committer_timestamp()
    }
}

/// Sort tags oldest first by committer timestamp of their target.
///
/// The sort is stable, so tags sharing a timestamp keep the order the
/// backend listed them in (alphabetical for both git backends).
pub fn sort_by_timestamp(tags: &mut [Tag]) {
    tags.sort_by_key(Tag::timestamp);
}

/// Tag name filter deciding which tags count as version boundaries.
///
/// The pattern must match at the start of the tag name; it is not implicitly
/// anchored at the end.
#[derive(Debug, Clone)]
pub struct TagFilter {
    pattern: String,
    regex: Regex,
}

impl TagFilter {
    /// Compile a tag filter pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            ChangelogError::classification(format!(
                "invalid tag_filter_regexp '{}': {}",
                pattern, e
            ))
        })?;

        Ok(TagFilter {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as configured
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Validate if a tag name matches this filter
    pub fn matches(&self, tag: &str) -> bool {
        self.regex.is_match(tag)
    }
}
