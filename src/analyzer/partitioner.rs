use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, instrument, trace};

use crate::analyzer::range::{resolve_range, RevisionRange};
use crate::domain::{
    tag, ChangelogEntry, Commit, CommitRef, IgnoreRules, Section, SectionRules, Tag, TagFilter,
    Version,
};
use crate::error::Result;
use crate::git::{LogQuery, Repository};
use crate::render::{RenderOptions, Renderer};
use crate::text::TextProc;
use crate::warning::ChangelogWarning;

/// Document title used when the whole history is rendered
pub const CHANGELOG_TITLE: &str = "Changelog";

/// Compiled parameters driving attribution and classification
#[derive(Debug, Clone)]
pub struct ChangelogSettings {
    pub ignore: IgnoreRules,
    pub sections: SectionRules,
    pub tag_filter: TagFilter,
    pub include_merges: bool,
    pub subject_process: TextProc,
    pub body_process: TextProc,
}

/// Upper end of one version: a tag, or the unreleased head of the range
#[derive(Debug, Clone)]
struct Boundary {
    tag: Option<String>,
    commit: Commit,
    includes: Vec<CommitRef>,
}

/// Lazy newest-first sequence of versions
///
/// Each step walks the commits reachable from one boundary and from none of
/// the older boundaries. After the first error the sequence is exhausted.
pub struct Versions<'r, R: Repository + ?Sized> {
    repo: &'r R,
    settings: &'r ChangelogSettings,
    /// Newest first
    boundaries: Vec<Boundary>,
    excludes: Vec<CommitRef>,
    next: usize,
    failed: bool,
}

impl<'r, R: Repository + ?Sized> Versions<'r, R> {
    /// Resolve `revlist` and collect version boundaries; no commit is
    /// classified until the sequence is consumed
    pub fn new(
        repo: &'r R,
        revlist: &[String],
        settings: &'r ChangelogSettings,
        warn: &mut dyn FnMut(&ChangelogWarning),
    ) -> Result<Self> {
        let RevisionRange {
            includes,
            excludes,
            explicit,
        } = resolve_range(repo, revlist)?;

        // Unfiltered tip: a tagged merge at the head still bounds a release
        // when merges are left out of the walk
        let newest = repo
            .log(&LogQuery::new(includes.clone(), excludes.clone()))?
            .next()
            .transpose()?;

        let mut boundaries: Vec<Boundary> = Vec::new();
        if newest.is_some() {
            for tag in eligible_tags(repo, &includes, &settings.tag_filter)? {
                boundaries.push(Boundary {
                    includes: vec![CommitRef::from(&tag.commit)],
                    tag: Some(tag.name),
                    commit: tag.commit,
                });
            }
        }
        let tag_count = boundaries.len();

        if tag_count == 0 {
            warn(&ChangelogWarning::NoMatchingTags {
                filter: settings.tag_filter.pattern().to_string(),
                revlist: revlist.to_vec(),
            });
        }

        if let Some(newest) = newest {
            boundaries.push(Boundary {
                tag: None,
                commit: newest,
                includes,
            });
        }
        boundaries.reverse();

        debug!(
            "{} version boundaries ({} tags) for {}",
            boundaries.len(),
            tag_count,
            if explicit { revlist.join(" ") } else { "HEAD".to_string() }
        );

        Ok(Versions {
            repo,
            settings,
            boundaries,
            excludes,
            next: 0,
            failed: false,
        })
    }

    #[instrument(level = "debug", skip(self), fields(tag = ?self.boundaries[index].tag))]
    fn build(&self, index: usize) -> Result<Option<Version>> {
        let boundary = &self.boundaries[index];
        let excludes = self.boundaries[index + 1..]
            .iter()
            .map(|older| CommitRef::from(&older.commit))
            .chain(self.excludes.iter().cloned())
            .collect();
        let query = LogQuery::new(boundary.includes.clone(), excludes)
            .include_merges(self.settings.include_merges);

        let mut slots = SectionSlots::new(&self.settings.sections);
        let mut walked = 0usize;
        for commit in self.repo.log(&query)? {
            let commit = commit?;
            walked += 1;

            if self.settings.ignore.is_ignored(&commit.subject) {
                trace!("ignoring {}", commit);
                continue;
            }

            let label = self.settings.sections.first_matching(&commit.subject);
            let subject = self.settings.subject_process.apply(&commit.subject);
            let body = self.settings.body_process.apply(&commit.body);
            slots.push(label, ChangelogEntry::new(commit, subject, body));
        }

        let sections = slots.into_sections();
        debug!("{} commits walked, {} sections kept", walked, sections.len());
        if sections.is_empty() {
            return Ok(None);
        }

        Ok(Some(Version {
            tag: boundary.tag.clone(),
            date: boundary.commit.date(),
            sections,
        }))
    }
}

/// Tags contained in any include tip that pass `filter`, oldest first
///
/// Tags sharing a commit collapse into one boundary carrying the
/// alphabetically last name.
fn eligible_tags<R: Repository + ?Sized>(
    repo: &R,
    includes: &[CommitRef],
    filter: &TagFilter,
) -> Result<Vec<Tag>> {
    let mut by_name = BTreeMap::new();
    for tip in repo.resolve_all(includes)? {
        for tag in repo.tags(Some(&tip))? {
            if !filter.matches(&tag.name) {
                trace!("tag '{}' does not match the tag filter", tag.name);
                continue;
            }
            by_name.entry(tag.name.clone()).or_insert(tag);
        }
    }

    let mut tags: Vec<Tag> = by_name.into_values().collect();
    tag::sort_by_timestamp(&mut tags);

    let mut eligible: Vec<Tag> = Vec::with_capacity(tags.len());
    for tag in tags {
        match eligible.iter_mut().find(|kept| kept.commit == tag.commit) {
            Some(kept) => {
                trace!("tags '{}' and '{}' share a commit", kept.name, tag.name);
                if tag.name > kept.name {
                    kept.name = tag.name;
                }
            }
            None => eligible.push(tag),
        }
    }
    Ok(eligible)
}

impl<R: Repository + ?Sized> Iterator for Versions<'_, R> {
    type Item = Result<Version>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed && self.next < self.boundaries.len() {
            let index = self.next;
            self.next += 1;
            match self.build(index) {
                Ok(Some(version)) => return Some(Ok(version)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<R: Repository + ?Sized> fmt::Debug for Versions<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Versions")
            .field("boundaries", &self.boundaries.len())
            .field("next", &self.next)
            .field("failed", &self.failed)
            .finish()
    }
}

/// Section buckets in rule declaration order, unlabeled bucket last
struct SectionSlots {
    slots: Vec<Section>,
}

impl SectionSlots {
    fn new(rules: &SectionRules) -> Self {
        let mut slots: Vec<Section> = Vec::with_capacity(rules.len() + 1);
        for label in rules.labels() {
            if !slots.iter().any(|s| s.label.as_deref() == Some(label)) {
                slots.push(Section::new(Some(label.to_string())));
            }
        }
        slots.push(Section::new(None));
        SectionSlots { slots }
    }

    fn push(&mut self, label: Option<&str>, entry: ChangelogEntry) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.label.as_deref() == label) {
            slot.commits.push(entry);
        }
    }

    fn into_sections(self) -> Vec<Section> {
        self.slots
            .into_iter()
            .filter(|s| !s.commits.is_empty())
            .collect()
    }
}

/// Lazy newest-first versions of `revlist` (empty means `HEAD`)
pub fn versions<'r, R: Repository + ?Sized>(
    repo: &'r R,
    revlist: &[String],
    settings: &'r ChangelogSettings,
    warn: &mut dyn FnMut(&ChangelogWarning),
) -> Result<Versions<'r, R>> {
    Versions::new(repo, revlist, settings, warn)
}

/// Build and render the changelog of `revlist` into a string
///
/// The document is titled only when the whole history is rendered. An empty
/// result is reported through `warn` and still renders.
pub fn changelog<R: Repository + ?Sized>(
    repo: &R,
    revlist: &[String],
    settings: &ChangelogSettings,
    renderer: &dyn Renderer,
    options: &RenderOptions,
    warn: &mut dyn FnMut(&ChangelogWarning),
) -> Result<String> {
    let mut versions = versions(repo, revlist, settings, warn)?.peekable();
    if versions.peek().is_none() {
        warn(&ChangelogWarning::EmptyChangelog);
    }

    let title = revlist.is_empty().then_some(CHANGELOG_TITLE);
    let mut out = String::new();
    renderer.render_stream(title, &mut versions, options, &mut out)?;
    Ok(out)
}
