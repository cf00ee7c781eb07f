//! reStructuredText built by hand, one chunk per version.

use std::fmt;

use crate::domain::section::OTHER_LABEL;
use crate::domain::{ChangelogEntry, Version};
use crate::error::{ChangelogError, Result};
use crate::render::{Changelog, RenderOptions, Renderer};
use crate::text;

/// Built-in reStructuredText renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct RestRenderer;

const NAME: &str = "rest";

/// `label` followed by an underline of `underline` as long as the label
pub fn rest_title(label: &str, underline: char) -> String {
    let label = label.trim();
    let rule: String = std::iter::repeat(underline)
        .take(label.chars().count())
        .collect();
    format!("{}\n{}\n", label, rule)
}

/// Document title block
pub fn render_title(title: &str) -> String {
    format!("{}\n\n", rest_title(title, '='))
}

/// Bullet line(s): wrapped subject followed by the author names
pub fn render_bullet(entry: &ChangelogEntry) -> String {
    let subject = format!("{} [{}]", entry.subject, entry.authors.join(", "));
    let mut out = text::indent(&text::wrap_line(&subject), "  ", Some("- "))
        .trim()
        .to_string();
    out.push('\n');
    out
}

/// Body indented under its bullet and set apart by a blank line, or nothing
pub fn render_body(entry: &ChangelogEntry) -> String {
    if entry.body.is_empty() {
        return String::new();
    }
    format!("\n{}\n", text::indent(&entry.body, "  ", None))
}

/// One bullet with its body
pub fn render_entry(entry: &ChangelogEntry) -> String {
    render_bullet(entry) + &render_body(entry)
}

/// One version block, including its trailing blank lines
pub fn render_version(version: &Version, options: &RenderOptions) -> String {
    let mut out = rest_title(&version.heading(&options.unreleased_version_label), '-');

    let lone_section = version.sections.len() == 1;
    for section in &version.sections {
        let label = section.display_label();
        if !(lone_section && label == OTHER_LABEL) {
            out.push('\n');
            out.push_str(&rest_title(label, '~'));
        }
        for entry in &section.commits {
            out.push_str(&render_entry(entry));
        }
    }

    out.push_str("\n\n");
    out
}

fn write_chunk(out: &mut dyn fmt::Write, chunk: &str) -> Result<()> {
    out.write_str(chunk)
        .map_err(|e| ChangelogError::render(NAME, e))
}

impl Renderer for RestRenderer {
    fn name(&self) -> &str {
        NAME
    }

    fn render(&self, changelog: &Changelog, options: &RenderOptions) -> Result<String> {
        let mut out = String::new();
        if let Some(title) = &changelog.title {
            out.push_str(&render_title(title));
        }
        for version in changelog.versions.iter().filter(|v| !v.is_empty()) {
            out.push_str(&render_version(version, options));
        }
        Ok(out)
    }

    fn render_stream(
        &self,
        title: Option<&str>,
        versions: &mut dyn Iterator<Item = Result<Version>>,
        options: &RenderOptions,
        out: &mut dyn fmt::Write,
    ) -> Result<()> {
        if let Some(title) = title {
            write_chunk(out, &render_title(title))?;
        }
        for version in versions {
            let version = version?;
            if !version.is_empty() {
                write_chunk(out, &render_version(&version, options))?;
            }
        }
        Ok(())
    }
}
