//! Ordered, first-match-wins classification of commit subjects.

use regex::Regex;

use crate::error::{ChangelogError, Result};

/// Label shown for commits no rule claimed, and for a catch-all without label
pub const OTHER_LABEL: &str = "Other";

/// One classification rule
#[derive(Debug, Clone)]
pub enum SectionRule {
    /// Matches every subject; meant as the last, catch-all rule
    Unconditional(String),
    /// Matches when any regex is found anywhere in the subject
    Pattern(String, Vec<Regex>),
}

impl SectionRule {
    /// Build a rule from configuration; `None` patterns make a catch-all
    pub fn new(label: impl Into<String>, patterns: Option<&[String]>) -> Result<Self> {
        let label = label.into();
        match patterns {
            None => Ok(SectionRule::Unconditional(label)),
            Some(patterns) => {
                let regexes = patterns
                    .iter()
                    .map(|pattern| {
                        Regex::new(pattern).map_err(|e| {
                            ChangelogError::classification(format!(
                                "invalid regex '{}' in section '{}': {}",
                                pattern, label, e
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(SectionRule::Pattern(label, regexes))
            }
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SectionRule::Unconditional(label) | SectionRule::Pattern(label, _) => label,
        }
    }

    pub fn matches(&self, subject: &str) -> bool {
        match self {
            SectionRule::Unconditional(_) => true,
            SectionRule::Pattern(_, regexes) => regexes.iter().any(|re| re.is_match(subject)),
        }
    }
}

/// Caller-ordered list of section rules
#[derive(Debug, Clone, Default)]
pub struct SectionRules {
    rules: Vec<SectionRule>,
}

impl SectionRules {
    pub fn new(rules: Vec<SectionRule>) -> Self {
        SectionRules { rules }
    }

    /// Label of the first rule matching `subject`, `None` when nothing matches
    pub fn first_matching(&self, subject: &str) -> Option<&str> {
        first_matching(&self.rules, subject)
    }

    /// Rule labels in declaration order; this is the section display order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(SectionRule::label)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Return the label of the first rule in `rules` that matches `subject`
pub fn first_matching<'r>(rules: &'r [SectionRule], subject: &str) -> Option<&'r str> {
    rules
        .iter()
        .find(|rule| rule.matches(subject))
        .map(SectionRule::label)
}

/// Compiled ignore patterns; a match anywhere in the subject drops the commit
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    regexes: Vec<Regex>,
}

impl IgnoreRules {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let regexes = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ChangelogError::classification(format!(
                        "invalid ignore regex '{}': {}",
                        pattern, e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(IgnoreRules { regexes })
    }

    pub fn is_ignored(&self, subject: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(subject))
    }
}
