//! RFC822-style trailers at the end of a commit body.
//!
//! A trailer block is the last paragraph of the body when every line of it is
//! either a `Key: value` line or an indented continuation of the previous
//! value. It must be the whole body or be separated from the free text above
//! it by a blank line.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Trailer key that declares an additional author.
pub const CO_AUTHOR_KEY: &str = "co_authored_by";

/// One or several values collected for a trailer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TrailerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl TrailerValue {
    /// All values, in declaration order
    pub fn values(&self) -> Vec<&str> {
        match self {
            TrailerValue::Single(value) => vec![value.as_str()],
            TrailerValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            TrailerValue::Single(first) => {
                *self = TrailerValue::Multiple(vec![std::mem::take(first), value]);
            }
            TrailerValue::Multiple(values) => values.push(value),
        }
    }
}

/// Normalized trailer key -> value(s)
pub type Trailers = BTreeMap<String, TrailerValue>;

/// Result of splitting a body into its free text and its trailer block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBody {
    pub body: String,
    pub trailers: Trailers,
}

fn key_line() -> &'static Regex {
    static KEY_LINE: OnceLock<Regex> = OnceLock::new();
    KEY_LINE.get_or_init(|| {
        Regex::new(r"^(?P<key>[A-Z]\w+(-\w+)*): (?P<value>.*)$").expect("static trailer regex")
    })
}

/// Normalize a trailer key for programmatic access: `Co-Authored-By` -> `co_authored_by`
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_").to_lowercase()
}

/// Split `body` into display text and trailers.
///
/// A body without a qualifying trailing block comes back unchanged with an
/// empty trailer map.
pub fn parse(body: &str) -> ParsedBody {
    let trimmed = body.trim_end();
    let lines: Vec<&str> = trimmed.split('\n').collect();

    let start = lines
        .iter()
        .rposition(|line| line.trim().is_empty())
        .map(|blank| blank + 1)
        .unwrap_or(0);

    let block = &lines[start..];
    let Some(entries) = parse_block(block) else {
        return ParsedBody {
            body: body.to_string(),
            trailers: Trailers::new(),
        };
    };

    let mut trailers = Trailers::new();
    for (key, value) in entries {
        match trailers.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                trailers.insert(key, TrailerValue::Single(value));
            }
        }
    }

    ParsedBody {
        body: lines[..start].join("\n").trim_end().to_string(),
        trailers,
    }
}

fn parse_block(block: &[&str]) -> Option<Vec<(String, String)>> {
    let first = block.first()?;
    if !key_line().is_match(first) {
        return None;
    }

    let mut entries: Vec<(String, Vec<&str>)> = Vec::new();
    for line in block {
        if let Some(caps) = key_line().captures(line) {
            entries.push((normalize_key(&caps["key"]), vec![caps.name("value")?.as_str()]));
        } else if line.starts_with(char::is_whitespace) {
            entries.last_mut()?.1.push(line);
        } else {
            return None;
        }
    }

    Some(
        entries
            .into_iter()
            .map(|(key, lines)| (key, join_value(&lines)))
            .collect(),
    )
}

fn join_value(lines: &[&str]) -> String {
    match lines.split_first() {
        Some((first, [])) => first.to_string(),
        Some((first, rest)) => {
            let continuation = textwrap::dedent(&rest.join("\n"));
            format!("{}\n{}", first, continuation.trim_end())
        }
        None => String::new(),
    }
}

fn email_suffix() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^([^<]+)<[^>]+>\s*$").expect("static email regex"))
}

/// Sorted, de-duplicated union of the declared author and every co-author
pub fn authors(author_name: &str, author_email: &str, trailers: &Trailers) -> Vec<String> {
    let mut authors: Vec<String> = trailers
        .get(CO_AUTHOR_KEY)
        .map(|value| value.values().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    authors.push(format!("{} <{}>", author_name, author_email));
    authors.sort();
    authors.dedup();
    authors
}

/// Display names of `authors` with the email part removed, sorted
pub fn author_names(authors: &[String]) -> Vec<String> {
    let mut names: Vec<String> = authors
        .iter()
        .map(|author| {
            email_suffix()
                .replace(author, "$1")
                .trim()
                .to_string()
        })
        .collect();
    names.sort();
    names.dedup();
    names
}
