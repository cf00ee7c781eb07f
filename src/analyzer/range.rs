//! Revision list parsing: `HEAD`, `^excluded`, `a..b` and `a...b`.

use crate::domain::CommitRef;
use crate::error::{ChangelogError, Result};
use crate::git::Repository;

/// A revision list resolved to concrete include and exclude commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRange {
    pub includes: Vec<CommitRef>,
    pub excludes: Vec<CommitRef>,
    /// `false` when the caller gave no revision and `HEAD` was assumed
    pub explicit: bool,
}

enum Side {
    Include(String),
    Exclude(String),
    /// `a...b`: both sides, minus their merge base
    Symmetric(String, String),
}

fn or_head(name: &str) -> String {
    if name.is_empty() {
        "HEAD".to_string()
    } else {
        name.to_string()
    }
}

fn parse_revision(revision: &str) -> Result<Vec<Side>> {
    if revision.is_empty() || revision.starts_with('-') {
        return Err(ChangelogError::config(format!(
            "unsupported revision '{}'",
            revision
        )));
    }

    if let Some(excluded) = revision.strip_prefix('^') {
        return Ok(vec![Side::Exclude(excluded.to_string())]);
    }
    if let Some((left, right)) = revision.split_once("...") {
        return Ok(vec![Side::Symmetric(or_head(left), or_head(right))]);
    }
    if let Some((left, right)) = revision.split_once("..") {
        return Ok(vec![
            Side::Exclude(or_head(left)),
            Side::Include(or_head(right)),
        ]);
    }
    Ok(vec![Side::Include(revision.to_string())])
}

/// Resolve `revlist` against `repo`; an empty list means `HEAD`
///
/// Every named revision must resolve, so a typo fails here with
/// [ChangelogError::ReferenceNotFound] before any walk starts.
pub fn resolve_range<R: Repository + ?Sized>(repo: &R, revlist: &[String]) -> Result<RevisionRange> {
    if revlist.is_empty() {
        return Ok(RevisionRange {
            includes: vec![CommitRef::from(repo.resolve("HEAD")?)],
            excludes: Vec::new(),
            explicit: false,
        });
    }

    let mut sides = Vec::new();
    for revision in revlist {
        sides.extend(parse_revision(revision)?);
    }

    let mut names = Vec::new();
    for side in &sides {
        match side {
            Side::Include(name) | Side::Exclude(name) => names.push(CommitRef::named(name.as_str())),
            Side::Symmetric(left, right) => {
                names.push(CommitRef::named(left.as_str()));
                names.push(CommitRef::named(right.as_str()));
            }
        }
    }
    let mut resolved = repo.resolve_all(&names)?.into_iter();

    let mut range = RevisionRange {
        includes: Vec::new(),
        excludes: Vec::new(),
        explicit: true,
    };
    for side in &sides {
        let mut next = || {
            resolved
                .next()
                .ok_or_else(|| ChangelogError::config("revision list resolution came back short"))
        };
        match side {
            Side::Include(_) => range.includes.push(next()?.into()),
            Side::Exclude(_) => range.excludes.push(next()?.into()),
            Side::Symmetric(_, _) => {
                let left = next()?;
                let right = next()?;
                let base = repo.merge_base(&left, &right)?;
                range.includes.push(left.into());
                range.includes.push(right.into());
                range.excludes.push(base.into());
            }
        }
    }

    if range.includes.is_empty() {
        range.includes.push(CommitRef::from(repo.resolve("HEAD")?));
    }

    Ok(range)
}
