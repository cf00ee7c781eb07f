//! Logic-less view of a changelog for the Handlebars engine.
//!
//! Handlebars has no string helpers worth relying on, so everything that
//! needs computing (headings, underlines, wrapped bullets, indented bodies)
//! is done here and the template only lays the pieces out.

use serde::Serialize;

use crate::domain::section::OTHER_LABEL;
use crate::domain::{ChangelogEntry, Section, Version};
use crate::render::rest;
use crate::render::{Changelog, RenderOptions};

fn underline(label: &str, rule: char) -> String {
    std::iter::repeat(rule).take(label.chars().count()).collect()
}

#[derive(Debug, Serialize)]
pub struct ChangelogView {
    pub title: Option<String>,
    pub title_underline: String,
    pub versions: Vec<VersionView>,
}

#[derive(Debug, Serialize)]
pub struct VersionView {
    pub tag: Option<String>,
    pub date: String,
    pub heading: String,
    pub heading_underline: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub label: String,
    pub label_underline: String,
    /// False for a lone unlabeled section
    pub show_label: bool,
    pub commits: Vec<EntryView>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub sha1: String,
    pub sha1_short: String,
    pub author: String,
    pub authors: String,
    pub subject: String,
    pub body: String,
    /// `- subject [authors]`, wrapped, newline terminated
    pub bullet: String,
    /// Indented body preceded by a blank line, or empty
    pub body_block: String,
}

impl ChangelogView {
    pub fn new(changelog: &Changelog, options: &RenderOptions) -> Self {
        let title = changelog.title.as_ref().map(|t| t.trim().to_string());
        ChangelogView {
            title_underline: title.as_deref().map(|t| underline(t, '=')).unwrap_or_default(),
            title,
            versions: changelog
                .versions
                .iter()
                .filter(|v| !v.is_empty())
                .map(|v| VersionView::new(v, options))
                .collect(),
        }
    }
}

impl VersionView {
    fn new(version: &Version, options: &RenderOptions) -> Self {
        let heading = version.heading(&options.unreleased_version_label);
        let lone_section = version.sections.len() == 1;
        VersionView {
            tag: version.tag.clone(),
            date: version.date.clone(),
            heading_underline: underline(&heading, '-'),
            heading,
            sections: version
                .sections
                .iter()
                .map(|s| SectionView::new(s, lone_section))
                .collect(),
        }
    }
}

impl SectionView {
    fn new(section: &Section, lone_section: bool) -> Self {
        let label = section.display_label().to_string();
        SectionView {
            label_underline: underline(&label, '~'),
            show_label: !(lone_section && label == OTHER_LABEL),
            label,
            commits: section.commits.iter().map(EntryView::new).collect(),
        }
    }
}

impl EntryView {
    fn new(entry: &ChangelogEntry) -> Self {
        EntryView {
            sha1: entry.commit.sha1.clone(),
            sha1_short: entry.commit.sha1_short.clone(),
            author: entry.author.clone(),
            authors: entry.authors.join(", "),
            subject: entry.subject.clone(),
            body: entry.body.clone(),
            bullet: rest::render_bullet(entry),
            body_block: rest::render_body(entry),
        }
    }
}
