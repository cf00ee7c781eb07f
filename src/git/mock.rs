use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{tag, Commit, CommitFields, Tag};
use crate::error::{ChangelogError, Result};
use crate::git::{CommitStream, LogQuery, Repository};

/// First timestamp handed out: 2000-01-01T00:00:00Z
const EPOCH: i64 = 946_684_800;

/// In-memory commit graph for testing without a git repository
///
/// Commits get sequential hashes and timestamps one minute apart, so
/// creation order is also date order unless a timestamp is given explicitly.
#[derive(Debug, Default)]
pub struct MockRepository {
    commits: HashMap<String, Commit>,
    parents: HashMap<String, Vec<String>>,
    tags: BTreeMap<String, String>,
    head: Option<String>,
    clock: i64,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with the given subject and parents; it becomes `HEAD`
    pub fn commit(&mut self, subject: &str, parents: &[&str]) -> String {
        self.commit_with_body(subject, "", parents)
    }

    /// Add a commit with a body; it becomes `HEAD`
    pub fn commit_with_body(&mut self, subject: &str, body: &str, parents: &[&str]) -> String {
        self.clock += 60;
        let timestamp = EPOCH + self.clock;
        self.commit_at(subject, body, parents, timestamp)
    }

    /// Add a commit with explicit author and committer timestamp
    pub fn commit_at(&mut self, subject: &str, body: &str, parents: &[&str], timestamp: i64) -> String {
        let sha1 = format!("{:040x}", self.commits.len() + 1);
        let raw_body = if body.is_empty() {
            subject.to_string()
        } else {
            format!("{}\n\n{}", subject, body)
        };

        let commit = Commit::from_fields(CommitFields {
            sha1: sha1.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
            raw_body,
            author_name: "Tester".to_string(),
            author_email: "tester@example.com".to_string(),
            author_timestamp: timestamp,
            committer_name: "Tester".to_string(),
            committer_timestamp: timestamp,
        });

        self.commits.insert(sha1.clone(), commit);
        self.parents.insert(
            sha1.clone(),
            parents.iter().map(|p| p.to_string()).collect(),
        );
        self.head = Some(sha1.clone());
        sha1
    }

    /// Add a tag pointing to a commit
    pub fn add_tag(&mut self, name: impl Into<String>, sha1: &str) {
        self.tags.insert(name.into(), sha1.to_string());
    }

    /// Move `HEAD`
    pub fn set_head(&mut self, sha1: &str) {
        self.head = Some(sha1.to_string());
    }

    fn lookup(&self, reference: &str) -> Result<&str> {
        let sha1 = match reference {
            "HEAD" => self.head.as_deref(),
            name => self
                .tags
                .get(name)
                .map(String::as_str)
                .or_else(|| self.commits.get_key_value(name).map(|(k, _)| k.as_str())),
        };
        sha1.ok_or_else(|| ChangelogError::reference_not_found(reference))
    }

    fn parents_of(&self, sha1: &str) -> &[String] {
        self.parents.get(sha1).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `sha1` and every commit reachable from it
    fn ancestors(&self, sha1: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![sha1.to_string()];
        while let Some(current) = stack.pop() {
            if seen.insert(current.clone()) {
                stack.extend(self.parents_of(&current).iter().cloned());
            }
        }
        seen
    }

    fn timestamp(&self, sha1: &str) -> i64 {
        self.commits
            .get(sha1)
            .map(Commit::committer_timestamp)
            .unwrap_or_default()
    }
}

impl Repository for MockRepository {
    fn resolve(&self, reference: &str) -> Result<Commit> {
        let sha1 = self.lookup(reference)?;
        self.commits
            .get(sha1)
            .cloned()
            .ok_or_else(|| ChangelogError::reference_not_found(reference))
    }

    fn tags(&self, contains: Option<&Commit>) -> Result<Vec<Tag>> {
        let reachable = contains.map(|commit| self.ancestors(&commit.sha1));

        let mut tags = Vec::new();
        for (name, sha1) in &self.tags {
            if reachable.as_ref().is_some_and(|set| !set.contains(sha1)) {
                continue;
            }
            tags.push(Tag::new(name.clone(), self.resolve(sha1)?));
        }

        tag::sort_by_timestamp(&mut tags);
        Ok(tags)
    }

    fn log(&self, query: &LogQuery) -> Result<CommitStream<'_>> {
        let mut excluded = HashSet::new();
        for reference in &query.excludes {
            excluded.extend(self.ancestors(self.lookup(reference.identifier())?));
        }

        let mut includes = query
            .includes
            .iter()
            .map(|r| self.lookup(r.identifier()).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        includes.sort_by_key(|sha1| self.timestamp(sha1));

        // Reverse DFS post-order: children first, merged-in branches kept together
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        for start in includes {
            let mut stack = vec![(start, 0usize)];
            while let Some((sha1, next)) = stack.pop() {
                if next == 0 && (excluded.contains(&sha1) || !visited.insert(sha1.clone())) {
                    continue;
                }
                match self.parents_of(&sha1).get(next) {
                    Some(parent) => {
                        let parent = parent.clone();
                        stack.push((sha1, next + 1));
                        stack.push((parent, 0));
                    }
                    None => postorder.push(sha1),
                }
            }
        }

        let include_merges = query.include_merges;
        let commits: Vec<Commit> = postorder
            .into_iter()
            .rev()
            .filter(|sha1| include_merges || self.parents_of(sha1).len() <= 1)
            .filter_map(|sha1| self.commits.get(&sha1).cloned())
            .collect();

        Ok(Box::new(commits.into_iter().map(Ok)))
    }

    fn merge_base(&self, left: &Commit, right: &Commit) -> Result<Commit> {
        let left_ancestors = self.ancestors(&left.sha1);
        let right_ancestors = self.ancestors(&right.sha1);
        let common: Vec<&String> = left_ancestors.intersection(&right_ancestors).collect();

        // Best common ancestors are not reachable from another common ancestor
        let best = common
            .iter()
            .filter(|candidate| {
                !common.iter().any(|other| {
                    other != *candidate && self.ancestors(other).contains(candidate.as_str())
                })
            })
            .max_by_key(|candidate| self.timestamp(candidate))
            .ok_or_else(|| ChangelogError::unrelated(&left.sha1, &right.sha1))?;

        self.resolve(best)
    }
}
