// tests/integration_test.rs
mod common;

use common::{at, git_available, reference_block_003, reference_repo, TestRepo, REFERENCE};
use git_changelog::analyzer::{self, ChangelogSettings};
use git_changelog::config::Config;
use std::time::{Duration, Instant};

use git_changelog::domain::CommitRef;
use git_changelog::git::{Git2Repository, LogQuery, Repository, SystemGitRepository};
use git_changelog::render::{build_renderer, OutputEngine, RenderOptions, RestRenderer};
use git_changelog::warning::ChangelogWarning;
use git_changelog::ChangelogError;

fn settings() -> ChangelogSettings {
    Config::default().settings().expect("default settings compile")
}

fn render<R: Repository + ?Sized>(repo: &R, revlist: &[&str]) -> (String, Vec<ChangelogWarning>) {
    let revlist: Vec<String> = revlist.iter().map(|s| s.to_string()).collect();
    let mut warnings = Vec::new();
    let output = analyzer::changelog(
        repo,
        &revlist,
        &settings(),
        &RestRenderer,
        &RenderOptions::default(),
        &mut |w| warnings.push(w.clone()),
    )
    .unwrap();
    (output, warnings)
}

#[test]
fn test_reference_history() {
    let t = reference_repo();
    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let (output, warnings) = render(&repo, &[]);
    assert_eq!(output, REFERENCE);
    assert!(warnings.is_empty());
}

#[test]
fn test_incremental_range_has_no_title() {
    let t = reference_repo();
    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let (output, _) = render(&repo, &["0.0.2..0.0.3"]);
    assert_eq!(output, reference_block_003());
}

#[test]
fn test_range_up_to_tag() {
    let t = reference_repo();
    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let (output, _) = render(&repo, &["0.0.3"]);
    assert!(output.starts_with("0.0.3 (2000-01-05)"));
    assert!(output.contains("0.0.2 (2000-01-02)"));
    assert!(!output.contains("(unreleased)"));
}

#[test]
fn test_template_engines_match_reference() {
    let t = reference_repo();
    let repo = Git2Repository::open(t.dir.path()).unwrap();

    for engine in [
        OutputEngine::Handlebars("restructuredtext".to_string()),
        OutputEngine::Jinja("restructuredtext".to_string()),
    ] {
        let renderer = build_renderer(&engine, None).unwrap();
        let output = analyzer::changelog(
            &repo,
            &[],
            &settings(),
            renderer.as_ref(),
            &RenderOptions::default(),
            &mut |_| {},
        )
        .unwrap();
        assert_eq!(output, REFERENCE, "engine {}", engine);
    }
}

#[test]
fn test_annotated_tags_are_boundaries() {
    let t = TestRepo::new();
    let a = t.commit("new: alpha", "Alice", at(1, 9));
    t.tag_annotated("1.0", a);
    t.commit("fix: beta", "Bob", at(2, 9));

    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let (output, _) = render(&repo, &[]);
    assert!(output.contains("1.0 (2000-01-01)\n----------------\n\nNew\n~~~\n- Alpha. [Alice]"));
    assert!(output.contains("(unreleased)\n------------\n\nFix\n~~~\n- Beta. [Bob]"));
}

#[test]
fn test_merged_branch_commit_belongs_to_unreleased() {
    let t = TestRepo::new();
    let base = t.commit("new: base", "Alice", at(1, 9));
    t.tag("1.0", base);

    // Branch off 1.0 before 1.1 exists, merge after it
    let feature = t.commit_on(&[base], "new: feature work", "Bob", at(2, 9), false);
    let release = t.commit("fix: release fix", "Alice", at(3, 9));
    t.tag("1.1", release);
    t.commit_on(
        &[release, feature],
        "Merge branch 'feature'",
        "Alice",
        at(4, 9),
        true,
    );

    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let (output, _) = render(&repo, &[]);

    let unreleased_end = output.find("1.1 (").unwrap();
    let (unreleased, released) = output.split_at(unreleased_end);
    assert!(unreleased.contains("Feature work"));
    assert!(unreleased.contains("- Merge branch 'feature' [Alice]"));
    assert!(!released.contains("Feature work"));
    assert!(released.contains("Release fix."));
}

#[test]
fn test_merges_can_be_excluded() {
    let t = TestRepo::new();
    let base = t.commit("new: base", "Alice", at(1, 9));
    let side = t.commit_on(&[base], "new: side", "Bob", at(2, 9), false);
    let main = t.commit("new: main", "Alice", at(3, 9));
    t.commit_on(&[main, side], "Merge branch 'side'", "Alice", at(4, 9), true);

    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let config = Config {
        include_merge: false,
        ..Config::default()
    };
    let output = analyzer::changelog(
        &repo,
        &[],
        &config.settings().unwrap(),
        &RestRenderer,
        &RenderOptions::default(),
        &mut |_| {},
    )
    .unwrap();
    assert!(!output.contains("Merge branch"));
    assert!(output.contains("- Side. [Bob]"));
}

#[test]
fn test_empty_changelog_warns_twice_and_renders_title() {
    let t = TestRepo::new();
    t.commit("new: first commit", "Alice", at(1, 9));

    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let (output, warnings) = render(&repo, &[]);
    assert_eq!(output, "Changelog\n=========\n\n\n");
    assert!(matches!(warnings[0], ChangelogWarning::NoMatchingTags { .. }));
    assert!(matches!(warnings[1], ChangelogWarning::EmptyChangelog));
}

#[test]
fn test_unknown_revision_fails_before_output() {
    let t = reference_repo();
    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let err = analyzer::changelog(
        &repo,
        &["0.0.9..HEAD".to_string()],
        &settings(),
        &RestRenderer,
        &RenderOptions::default(),
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, ChangelogError::ReferenceNotFound(ref name) if name == "0.0.9"));
}

#[test]
fn test_compare_across_branches() {
    let t = TestRepo::new();
    let base = t.commit("base", "Alice", at(1, 9));
    let left = t.commit("left", "Alice", at(2, 9));
    let right = t.commit_on(&[base], "right", "Bob", at(3, 9), false);

    let repo = Git2Repository::open(t.dir.path()).unwrap();
    let base = repo.resolve(&base.to_string()).unwrap();
    let left = repo.resolve(&left.to_string()).unwrap();
    let right = repo.resolve(&right.to_string()).unwrap();

    assert_eq!(repo.compare(&base, &left).unwrap(), std::cmp::Ordering::Less);
    assert_eq!(repo.compare(&left, &base).unwrap(), std::cmp::Ordering::Greater);
    assert!(matches!(
        repo.compare(&left, &right),
        Err(ChangelogError::UnrelatedCommits { .. })
    ));
}

#[test]
fn test_system_backend_matches_reference() {
    if !git_available() {
        eprintln!("git executable not found, skipping");
        return;
    }
    let t = reference_repo();
    let repo = SystemGitRepository::open(t.dir.path()).unwrap();

    let (output, warnings) = render(&repo, &[]);
    assert_eq!(output, REFERENCE);
    assert!(warnings.is_empty());

    let (output, _) = render(&repo, &["0.0.2..0.0.3"]);
    assert_eq!(output, reference_block_003());
}

#[test]
fn test_system_backend_unknown_revision() {
    if !git_available() {
        return;
    }
    let t = reference_repo();
    let repo = SystemGitRepository::open(t.dir.path()).unwrap();
    assert!(matches!(
        repo.resolve("no-such-tag"),
        Err(ChangelogError::ReferenceNotFound(_))
    ));
}

#[test]
fn test_tagged_merge_head_is_a_release_without_merges() {
    let t = TestRepo::new();
    let base = t.commit("new: base", "Alice", at(1, 9));
    let side = t.commit_on(&[base], "fix: side", "Bob", at(2, 9), false);
    let main = t.commit("new: main", "Alice", at(3, 9));
    let merge = t.commit_on(&[main, side], "Merge branch 'release'", "Alice", at(4, 9), true);
    t.tag("1.0", merge);

    let config = Config {
        include_merge: false,
        ..Config::default()
    };
    let settings = config.settings().unwrap();
    let git2 = Git2Repository::open(t.dir.path()).unwrap();

    let check = |repo: &dyn Repository| {
        let mut warnings = Vec::new();
        let output = analyzer::changelog(
            repo,
            &[],
            &settings,
            &RestRenderer,
            &RenderOptions::default(),
            &mut |w| warnings.push(w.clone()),
        )
        .unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert!(output.contains("1.0 (2000-01-04)"));
        assert!(!output.contains("(unreleased)"));
        assert!(!output.contains("Merge branch"));
        assert!(output.contains("- Side. [Bob]"));
    };

    check(&git2);
    if git_available() {
        check(&SystemGitRepository::open(t.dir.path()).unwrap());
    }
}

#[test]
fn test_system_log_dropped_early_returns_promptly() {
    if !git_available() {
        return;
    }
    let t = TestRepo::new();
    for i in 0..500 {
        t.commit(&format!("chg: step {}", i), "Alice", at(1, 0) + i);
    }
    let repo = SystemGitRepository::open(t.dir.path()).unwrap();

    let start = Instant::now();
    {
        let mut stream = repo
            .log(&LogQuery::new(vec![CommitRef::named("HEAD")], Vec::new()))
            .unwrap();
        let newest = stream.next().unwrap().unwrap();
        assert_eq!(newest.subject, "chg: step 499");
    }
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_system_log_accepts_thousands_of_excludes() {
    if !git_available() {
        return;
    }
    let t = TestRepo::new();
    let count = 3000;
    for i in 0..count {
        let oid = t.commit(&format!("chg: step {}", i), "Alice", at(1, 0) + i);
        if i + 1 < count {
            t.tag(&format!("t{}", i), oid);
        }
    }
    let repo = SystemGitRepository::open(t.dir.path()).unwrap();

    let excludes = (0..count - 1).map(|i| CommitRef::named(format!("t{}", i))).collect();
    let commits: Vec<_> = repo
        .log(&LogQuery::new(vec![CommitRef::named("HEAD")], excludes))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].subject, format!("chg: step {}", count - 1));
}
