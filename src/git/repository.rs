use std::path::{Path, PathBuf};

use git2::{ErrorCode, Oid, Repository as Git2Repo, Sort};
use tracing::{debug, trace};

use crate::domain::{tag, Commit, CommitFields, CommitRef, Tag};
use crate::error::{ChangelogError, Result};
use crate::git::{CommitStream, LogQuery};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn find_oid(&self, reference: &str) -> Result<Oid> {
        let object = self.repo.revparse_single(reference).map_err(|e| match e.code() {
            ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => {
                ChangelogError::reference_not_found(reference)
            }
            _ => ChangelogError::Git(e),
        })?;

        let commit = object
            .peel_to_commit()
            .map_err(|_| ChangelogError::reference_not_found(reference))?;

        Ok(commit.id())
    }

    fn ref_oid(&self, reference: &CommitRef) -> Result<Oid> {
        match reference {
            CommitRef::Resolved(commit) => Ok(Oid::from_str(&commit.sha1)?),
            CommitRef::Unresolved(name) => self.find_oid(name),
        }
    }

    fn read_commit(&self, oid: Oid) -> Result<Commit> {
        let commit = self.repo.find_commit(oid)?;
        Ok(to_commit(&commit))
    }
}

fn to_commit(commit: &git2::Commit<'_>) -> Commit {
    let author = commit.author();
    let committer = commit.committer();

    Commit::from_fields(CommitFields {
        sha1: commit.id().to_string(),
        subject: commit.summary().unwrap_or_default().to_string(),
        body: commit.body().unwrap_or_default().to_string(),
        raw_body: commit.message().unwrap_or_default().to_string(),
        author_name: author.name().unwrap_or("unknown").to_string(),
        author_email: author.email().unwrap_or_default().to_string(),
        author_timestamp: author.when().seconds(),
        committer_name: committer.name().unwrap_or("unknown").to_string(),
        committer_timestamp: committer.when().seconds(),
    })
}

impl super::Repository for Git2Repository {
    fn resolve(&self, reference: &str) -> Result<Commit> {
        let oid = self.find_oid(reference)?;
        self.read_commit(oid)
    }

    fn tags(&self, contains: Option<&Commit>) -> Result<Vec<Tag>> {
        let bound = contains.map(|c| Oid::from_str(&c.sha1)).transpose()?;

        let names = self.repo.tag_names(None)?;
        let mut names: Vec<&str> = names.iter().flatten().collect();
        names.sort_unstable();

        let mut tags = Vec::new();
        for name in names {
            let reference = format!("refs/tags/{}", name);
            let Ok(target) = self
                .repo
                .revparse_single(&reference)
                .and_then(|object| object.peel_to_commit())
            else {
                trace!("skipping tag '{}': not pointing at a commit", name);
                continue;
            };

            if let Some(bound) = bound {
                if target.id() != bound && !self.repo.graph_descendant_of(bound, target.id())? {
                    continue;
                }
            }

            tags.push(Tag::new(name, to_commit(&target)));
        }

        tag::sort_by_timestamp(&mut tags);
        debug!("listed {} tags", tags.len());
        Ok(tags)
    }

    fn log(&self, query: &LogQuery) -> Result<CommitStream<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        for include in &query.includes {
            revwalk.push(self.ref_oid(include)?)?;
        }
        for exclude in &query.excludes {
            revwalk.hide(self.ref_oid(exclude)?)?;
        }

        let include_merges = query.include_merges;
        let commits = revwalk.filter_map(move |oid| {
            let commit = match oid.and_then(|oid| self.repo.find_commit(oid)) {
                Ok(commit) => commit,
                Err(e) => return Some(Err(ChangelogError::Git(e))),
            };
            if !include_merges && commit.parent_count() > 1 {
                return None;
            }
            Some(Ok(to_commit(&commit)))
        });

        Ok(Box::new(commits))
    }

    fn merge_base(&self, left: &Commit, right: &Commit) -> Result<Commit> {
        let base = self
            .repo
            .merge_base(Oid::from_str(&left.sha1)?, Oid::from_str(&right.sha1)?)
            .map_err(|e| match e.code() {
                ErrorCode::NotFound => ChangelogError::unrelated(&left.sha1, &right.sha1),
                _ => ChangelogError::Git(e),
            })?;
        self.read_commit(base)
    }

    fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    fn config_value(&self, key: &str) -> Result<Option<String>> {
        match self.repo.config()?.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
