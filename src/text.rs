//! Composable text processing stages.
//!
//! A [`TextProc`] is a pure `&str -> String` function. Stages compose left to
//! right with [`TextProc::then`] (or the `|` operator), so `a | b` applies `a`
//! first and feeds its output to `b`. Pipelines are assembled from
//! [`StageSpec`] values found in the configuration; building a spec is where
//! patterns get compiled, so a broken pipeline is rejected before any
//! repository walk starts.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ChangelogError, Result};

/// Column width used when re-flowing paragraphs and bullet entries.
pub const WRAP_WIDTH: usize = 70;

/// Replacement text produced by [`final_dot`] for an empty message.
pub const EMPTY_MESSAGE: &str = "No commit message.";

type StageFn = dyn Fn(&str) -> String + Send + Sync;

/// A named, cloneable text transformation.
#[derive(Clone)]
pub struct TextProc {
    name: String,
    fun: Arc<StageFn>,
}

impl TextProc {
    /// Wrap a plain function as a stage
    pub fn new<F>(name: impl Into<String>, fun: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        TextProc {
            name: name.into(),
            fun: Arc::new(fun),
        }
    }

    /// Stage name, `a | b` for composed stages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the stage on `text`
    pub fn apply(&self, text: &str) -> String {
        (self.fun)(text)
    }

    /// Compose: the result runs `self` first, then `next`.
    pub fn then(&self, next: &TextProc) -> TextProc {
        let first = Arc::clone(&self.fun);
        let second = Arc::clone(&next.fun);
        TextProc {
            name: format!("{} | {}", self.name, next.name),
            fun: Arc::new(move |text| second(&first(text))),
        }
    }

    /// Identity stage
    pub fn noop() -> Self {
        TextProc::new("noop", |text| text.to_string())
    }

    /// Trim surrounding whitespace
    pub fn strip() -> Self {
        TextProc::new("strip", |text| text.trim().to_string())
    }

    pub fn ucfirst() -> Self {
        TextProc::new("ucfirst", ucfirst)
    }

    pub fn final_dot() -> Self {
        TextProc::new("final_dot", final_dot)
    }

    /// Replace an empty (or all-whitespace) text with `replacement`
    pub fn set_if_empty(replacement: impl Into<String>) -> Self {
        let replacement = replacement.into();
        TextProc::new("set_if_empty", move |text| {
            if text.trim().is_empty() {
                replacement.clone()
            } else {
                text.to_string()
            }
        })
    }

    /// Prefix every line with `chars`, or with `first` on the first line
    pub fn indent(chars: impl Into<String>, first: Option<String>) -> Self {
        let chars = chars.into();
        TextProc::new("indent", move |text| indent(text, &chars, first.as_deref()))
    }

    /// Re-flow each paragraph separated by `separator` (a regex, default
    /// a blank line) to [`WRAP_WIDTH`] columns.
    pub fn wrap(separator: Option<&str>) -> Result<Self> {
        let separator = compile(separator.unwrap_or("\n\n"))?;
        Ok(TextProc::new("wrap", move |text| {
            paragraph_wrap(text, &separator)
        }))
    }

    /// Regex substitution of every match; `replacement` uses `$1`/`${name}`
    pub fn resub(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let regex = compile(pattern)?;
        let replacement = replacement.into();
        Ok(TextProc::new("resub", move |text| {
            regex.replace_all(text, replacement.as_str()).into_owned()
        }))
    }

    /// Compose a sequence of stages, left to right. Empty input gives `noop`.
    pub fn pipeline(stages: impl IntoIterator<Item = TextProc>) -> Self {
        let mut stages = stages.into_iter();
        match stages.next() {
            Some(first) => stages.fold(first, |acc, stage| acc.then(&stage)),
            None => TextProc::noop(),
        }
    }
}

impl BitOr for TextProc {
    type Output = TextProc;

    fn bitor(self, rhs: TextProc) -> TextProc {
        self.then(&rhs)
    }
}

impl Default for TextProc {
    fn default() -> Self {
        TextProc::noop()
    }
}

impl fmt::Debug for TextProc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextProc").field(&self.name).finish()
    }
}

/// Configuration form of a pipeline stage.
///
/// Unit stages are written as bare strings (`"strip"`), parameterized ones
/// as single-key tables (`{ resub = { pattern = "..", replacement = ".." } }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSpec {
    Noop,
    Strip,
    Ucfirst,
    FinalDot,
    SetIfEmpty(String),
    Resub {
        pattern: String,
        replacement: String,
    },
    Indent {
        #[serde(default = "default_indent_chars")]
        chars: String,
        #[serde(default)]
        first: Option<String>,
    },
    Wrap {
        #[serde(default)]
        regexp: Option<String>,
    },
}

fn default_indent_chars() -> String {
    "  ".to_string()
}

impl StageSpec {
    /// Compile this spec into a runnable stage
    pub fn build(&self) -> Result<TextProc> {
        match self {
            StageSpec::Noop => Ok(TextProc::noop()),
            StageSpec::Strip => Ok(TextProc::strip()),
            StageSpec::Ucfirst => Ok(TextProc::ucfirst()),
            StageSpec::FinalDot => Ok(TextProc::final_dot()),
            StageSpec::SetIfEmpty(text) => Ok(TextProc::set_if_empty(text.clone())),
            StageSpec::Resub {
                pattern,
                replacement,
            } => TextProc::resub(pattern, replacement.clone()),
            StageSpec::Indent { chars, first } => {
                Ok(TextProc::indent(chars.clone(), first.clone()))
            }
            StageSpec::Wrap { regexp } => TextProc::wrap(regexp.as_deref()),
        }
    }
}

/// Build the composed pipeline for a list of stage specs
pub fn build_pipeline(specs: &[StageSpec]) -> Result<TextProc> {
    let stages = specs
        .iter()
        .map(StageSpec::build)
        .collect::<Result<Vec<_>>>()?;
    Ok(TextProc::pipeline(stages))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ChangelogError::classification(format!("invalid regex '{}': {}", pattern, e))
    })
}

/// Upper-case the first character
pub fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Terminate a sentence: a trailing alphanumeric gets a period.
pub fn final_dot(text: &str) -> String {
    match text.chars().last() {
        None => EMPTY_MESSAGE.to_string(),
        Some(last) if last.is_alphanumeric() => format!("{}.", text),
        Some(_) => text.to_string(),
    }
}

/// Indent every line of `text` with `chars`.
///
/// With `first`, the first line is prefixed with `first` instead, which is how
/// bullet entries are laid out. Trailing whitespace is trimmed on every line.
pub fn indent(text: &str, chars: &str, first: Option<&str>) -> String {
    match first {
        Some(first) => {
            let (head, rest) = match text.split_once('\n') {
                Some((head, rest)) => (head, Some(rest)),
                None => (text, None),
            };
            let head = format!("{}{}", first, head).trim_end().to_string();
            match rest {
                Some(rest) => format!("{}\n{}", head, indent(rest, chars, None)),
                None => head,
            }
        }
        None => text
            .split('\n')
            .map(|line| format!("{}{}", chars, line).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Wrap a single line of text to [`WRAP_WIDTH`] columns
pub fn wrap_line(text: &str) -> String {
    textwrap::wrap(text, WRAP_WIDTH).join("\n")
}

/// Re-flow each paragraph independently, collapsing internal whitespace.
pub fn paragraph_wrap(text: &str, separator: &Regex) -> String {
    separator
        .split(text)
        .map(|paragraph| {
            let flat = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
            wrap_line(&flat)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
