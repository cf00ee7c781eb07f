//! Revision graph access layer
//!
//! The changelog engine only needs a handful of graph queries: resolve a
//! reference, list tags, walk the commits reachable from one set of refs but
//! not another, and answer ancestry questions. The [Repository] trait captures
//! exactly that, so the partitioner can run against:
//!
//! - [Git2Repository]: in-process walk through `libgit2`
//! - [SystemGitRepository]: the `git` executable, streamed through a pipe
//! - [MockRepository]: an in-memory commit graph for tests
//!
//! ```rust,no_run
//! # use git_changelog::git::{Git2Repository, LogQuery, Repository};
//! # use git_changelog::domain::CommitRef;
//! # fn example() -> git_changelog::Result<()> {
//! let repo = Git2Repository::open(".")?;
//! let query = LogQuery::new(vec![CommitRef::named("HEAD")], vec![CommitRef::named("0.1.0")]);
//! for commit in repo.log(&query)? {
//!     println!("{}", commit?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod system;

pub use mock::MockRepository;
pub use repository::Git2Repository;
pub use system::SystemGitRepository;

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::domain::{Commit, CommitRef, Tag};
use crate::error::{ChangelogError, Result};

/// Lazy sequence of commits; an `Err` item ends the sequence
pub type CommitStream<'a> = Box<dyn Iterator<Item = Result<Commit>> + 'a>;

/// Bounded commit enumeration: reachable from any include, from no exclude
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub includes: Vec<CommitRef>,
    pub excludes: Vec<CommitRef>,
    pub include_merges: bool,
}

impl LogQuery {
    /// Query including merge commits
    pub fn new(includes: Vec<CommitRef>, excludes: Vec<CommitRef>) -> Self {
        LogQuery {
            includes,
            excludes,
            include_merges: true,
        }
    }

    pub fn include_merges(mut self, include_merges: bool) -> Self {
        self.include_merges = include_merges;
        self
    }
}

/// Read-only access to a revision graph
///
/// ## Error Handling
///
/// Identifiers that do not resolve fail with
/// [ChangelogError::ReferenceNotFound]. Ancestry questions about commits
/// sharing no history fail with [ChangelogError::UnrelatedCommits] rather
/// than answering `false`.
pub trait Repository {
    /// Resolve a hash, tag, branch or `HEAD` to a fully read commit
    fn resolve(&self, reference: &str) -> Result<Commit>;

    /// Tags pointing at commits, oldest first by committer timestamp
    ///
    /// With `contains`, only tags whose target is `contains` or one of its
    /// ancestors are listed.
    fn tags(&self, contains: Option<&Commit>) -> Result<Vec<Tag>>;

    /// Commits matching `query`, children before parents
    fn log(&self, query: &LogQuery) -> Result<CommitStream<'_>>;

    /// Best common ancestor of two commits
    ///
    /// Fails with [ChangelogError::UnrelatedCommits] when the histories
    /// never meet.
    fn merge_base(&self, left: &Commit, right: &Commit) -> Result<Commit>;

    /// Root of the working tree, `None` for bare or in-memory repositories
    fn workdir(&self) -> Option<PathBuf> {
        None
    }

    /// Value of a git configuration key, `None` when unset
    fn config_value(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Resolve a reference unless it already carries its commit
    fn resolve_ref(&self, reference: &CommitRef) -> Result<Commit> {
        match reference {
            CommitRef::Resolved(commit) => Ok((**commit).clone()),
            CommitRef::Unresolved(name) => self.resolve(name),
        }
    }

    /// Resolve several references; backends may batch the lookups
    fn resolve_all(&self, references: &[CommitRef]) -> Result<Vec<Commit>> {
        references.iter().map(|r| self.resolve_ref(r)).collect()
    }

    /// `true` iff `ancestor` is reachable from `descendant` through parent
    /// edges, or both are the same commit
    fn is_ancestor(&self, ancestor: &Commit, descendant: &Commit) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self.merge_base(ancestor, descendant)? == *ancestor)
    }

    /// Ancestry order: `Less` when `left` is a strict ancestor of `right`
    ///
    /// Commits on diverging branches are not ordered and fail with
    /// [ChangelogError::UnrelatedCommits].
    fn compare(&self, left: &Commit, right: &Commit) -> Result<Ordering> {
        if left == right {
            return Ok(Ordering::Equal);
        }
        let base = self.merge_base(left, right)?;
        if base == *left {
            Ok(Ordering::Less)
        } else if base == *right {
            Ok(Ordering::Greater)
        } else {
            Err(ChangelogError::unrelated(&left.sha1, &right.sha1))
        }
    }
}
