use std::fmt;

/// Advisory conditions met while building a changelog.
///
/// None of these are errors: the changelog is still produced. They are handed
/// to the caller's warning callback, which may print, log or drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogWarning {
    /// No tag in range matched the tag filter; everything lands in "unreleased"
    NoMatchingTags {
        filter: String,
        /// Revision list as given by the caller, empty when defaulted to HEAD
        revlist: Vec<String>,
    },
    /// Every commit was filtered out, nothing will be rendered
    EmptyChangelog,
}

impl fmt::Display for ChangelogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangelogWarning::NoMatchingTags { filter, revlist } if revlist.is_empty() => {
                write!(f, "no tag name matching tag_filter_regexp '{}'.", filter)
            }
            ChangelogWarning::NoMatchingTags { filter, revlist } => write!(
                f,
                "no tag contained in revlist '{}' with name matching tag_filter_regexp '{}'.",
                revlist.join(" "),
                filter
            ),
            ChangelogWarning::EmptyChangelog => write!(
                f,
                "Empty changelog. No commits were elected to be used as entry."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matching_tags_without_revlist() {
        let warning = ChangelogWarning::NoMatchingTags {
            filter: r"^\d+$".to_string(),
            revlist: vec![],
        };
        assert_eq!(
            warning.to_string(),
            r"no tag name matching tag_filter_regexp '^\d+$'."
        );
    }

    #[test]
    fn test_no_matching_tags_with_revlist() {
        let warning = ChangelogWarning::NoMatchingTags {
            filter: "v.*".to_string(),
            revlist: vec!["0.0.2..0.0.3".to_string(), "^old".to_string()],
        };
        let msg = warning.to_string();
        assert!(msg.contains("contained in revlist '0.0.2..0.0.3 ^old'"));
        assert!(msg.contains("'v.*'"));
    }

    #[test]
    fn test_empty_changelog() {
        assert!(ChangelogWarning::EmptyChangelog
            .to_string()
            .starts_with("Empty changelog."));
    }
}
