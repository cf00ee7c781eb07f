#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

/// 2000-01-01T00:00:00Z
pub const EPOCH: i64 = 946_684_800;

/// Timestamp of `day` (1-based, January 2000) at `hour` UTC
pub fn at(day: i64, hour: i64) -> i64 {
    EPOCH + (day - 1) * 86_400 + hour * 3_600
}

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        TestRepo { dir, repo }
    }

    /// Commit on top of `parents` with an unchanged tree; `update_head` moves
    /// the current branch to the new commit.
    pub fn commit_on(
        &self,
        parents: &[Oid],
        message: &str,
        author: &str,
        when: i64,
        update_head: bool,
    ) -> Oid {
        let signature = Signature::new(
            author,
            &format!("{}@example.com", author.to_lowercase()),
            &Time::new(when, 0),
        )
        .unwrap();

        let parents: Vec<git2::Commit<'_>> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).unwrap())
            .collect();
        let tree = match parents.first() {
            Some(parent) => parent.tree().unwrap(),
            None => {
                let tree_id = self.repo.treebuilder(None).unwrap().write().unwrap();
                self.repo.find_tree(tree_id).unwrap()
            }
        };
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        self.repo
            .commit(
                update_head.then_some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parent_refs,
            )
            .unwrap()
    }

    /// Commit on top of `HEAD` (or as root) and advance the branch
    pub fn commit(&self, message: &str, author: &str, when: i64) -> Oid {
        let parents = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap().id()],
            Err(_) => Vec::new(),
        };
        self.commit_on(&parents, message, author, when, true)
    }

    pub fn tag(&self, name: &str, oid: Oid) {
        let object = self.repo.find_object(oid, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    pub fn tag_annotated(&self, name: &str, oid: Oid) {
        let object = self.repo.find_object(oid, None).unwrap();
        let signature = Signature::new("Tagger", "tagger@example.com", &Time::new(EPOCH, 0)).unwrap();
        self.repo
            .tag(name, &object, &signature, "release", false)
            .unwrap();
    }
}

pub const CHANGE_ID: &str = "Change-Id: Ic8aaa0728a43936cd4c6e1ed590e01ba8f0fbf5b";

/// The five-commit, three-tag reference history
pub fn reference_repo() -> TestRepo {
    let t = TestRepo::new();

    let first = t.commit("new: first commit", "Bob", at(1, 10));
    t.tag("0.0.1", first);

    let b = t.commit(
        &format!(
            "add ``b`` with non-ascii chars éèàâ§µ and HTML chars ``&<``\n\n{}",
            CHANGE_ID
        ),
        "Alice",
        at(2, 11),
    );
    t.tag("0.0.2", b);

    t.commit("new: add file ``c``", "Charly", at(3, 12));
    t.commit(
        &format!(
            "new: add file ``e``, modified ``b``\n\n\
             This is a message body.\n\n\
             With multi-line content:\n\
             - one\n\
             - two\n\n\
             Bug: #42\n\
             {}\n\
             Signed-off-by: A. U. Thor <author@example.com>\n\
             CC: R. E. Viewer <reviewer@example.com>\n\
             Subject: This is a fake subject spanning to several lines\n  as you can see",
            CHANGE_ID
        ),
        "Bob",
        at(4, 13),
    );
    let minor = t.commit("chg: modified ``b`` !minor", "Bob", at(5, 13));
    t.tag("0.0.3", minor);

    t.commit(
        "chg: modified ``b`` XXX\n\n\
         Co-Authored-By: Juliet <juliet@example.com>\n\
         Co-Authored-By: Charly <charly@example.com>",
        "Alice",
        at(6, 11),
    );
    t
}

/// Expected reStructuredText for [reference_repo]
pub const REFERENCE: &str = "Changelog
=========


(unreleased)
------------

Changes
~~~~~~~
- Modified ``b`` XXX. [Alice, Charly, Juliet]


0.0.3 (2000-01-05)
------------------

New
~~~
- Add file ``e``, modified ``b`` [Bob]

  This is a message body.

  With multi-line content:
  - one
  - two
- Add file ``c`` [Charly]


0.0.2 (2000-01-02)
------------------
- Add ``b`` with non-ascii chars éèàâ§µ and HTML chars ``&<`` [Alice]


";

/// The 0.0.3 block of [REFERENCE]
pub fn reference_block_003() -> &'static str {
    let start = REFERENCE.find("0.0.3 (").unwrap();
    let end = REFERENCE.find("0.0.2 (").unwrap();
    &REFERENCE[start..end]
}

pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
