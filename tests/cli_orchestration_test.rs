mod common;

use std::fs;

use common::{at, reference_block_003, reference_repo, TestRepo, REFERENCE};
use git_changelog::cli::{run_init, run_show, InitArgs, ShowArgs};
use git_changelog::config::{Config, REFERENCE_CONFIG, REPOSITORY_CONFIG_FILENAME};
use git_changelog::warning::ChangelogWarning;
use git_changelog::ChangelogError;

fn show(t: &TestRepo, config: &str, revlist: &[&str]) -> (Result<String, ChangelogError>, Vec<ChangelogWarning>) {
    let config_path = t.dir.path().join("test-config.toml");
    fs::write(&config_path, config).unwrap();
    let args = ShowArgs {
        repo_path: t.dir.path().to_path_buf(),
        config_path: Some(config_path),
        revlist: revlist.iter().map(|s| s.to_string()).collect(),
    };
    let mut warnings = Vec::new();
    let result = run_show(&args, &mut |w| warnings.push(w.clone()));
    (result, warnings)
}

#[test]
fn test_show_reference_history() {
    let t = reference_repo();
    let (output, warnings) = show(&t, "", &[]);
    assert_eq!(output.unwrap(), REFERENCE);
    assert!(warnings.is_empty());
}

#[test]
fn test_show_incremental() {
    let t = reference_repo();
    let (output, _) = show(&t, "", &["0.0.2..0.0.3"]);
    assert_eq!(output.unwrap(), reference_block_003());
}

#[test]
fn test_show_with_bundled_templates() {
    let t = reference_repo();
    for engine in ["{ handlebars = \"restructuredtext\" }", "{ jinja = \"restructuredtext\" }"] {
        let (output, _) = show(&t, &format!("output_engine = {}", engine), &[]);
        assert_eq!(output.unwrap(), REFERENCE, "engine {}", engine);
    }
}

#[test]
fn test_show_with_template_file_from_work_tree() {
    let t = reference_repo();
    fs::write(
        t.dir.path().join("short.j2"),
        "{% for version in data.versions %}{{ version.tag or 'next' }};{% endfor %}",
    )
    .unwrap();
    let (output, _) = show(&t, "output_engine = { jinja = \"short.j2\" }", &[]);
    assert_eq!(output.unwrap(), "next;0.0.3;0.0.2;");
}

#[test]
fn test_show_with_system_backend() {
    if !common::git_available() {
        return;
    }
    let t = reference_repo();
    let (output, _) = show(&t, "backend = \"system\"", &[]);
    assert_eq!(output.unwrap(), REFERENCE);
}

#[test]
fn test_show_unreleased_label() {
    let t = reference_repo();
    let (output, _) = show(&t, "unreleased_version_label = \"Upcoming\"", &[]);
    assert!(output.unwrap().contains("\nUpcoming\n--------\n"));
}

#[test]
fn test_show_rejects_broken_section_regex() {
    let t = reference_repo();
    let (output, _) = show(&t, "[[sections]]\nlabel = \"Bad\"\nregexps = ['(']\n", &[]);
    assert!(matches!(output, Err(ChangelogError::ClassificationConfig(_))));
}

#[test]
fn test_show_unknown_template() {
    let t = reference_repo();
    let (output, _) = show(&t, "output_engine = { handlebars = \"nope\" }", &[]);
    assert!(matches!(output, Err(ChangelogError::Config(_))));
}

#[test]
fn test_show_warns_when_no_tag_matches() {
    let t = TestRepo::new();
    t.commit("new: something", "Alice", at(1, 9));
    let (output, warnings) = show(&t, "", &[]);
    assert!(output.unwrap().contains("- Something. [Alice]"));
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], ChangelogWarning::NoMatchingTags { .. }));
}

#[test]
fn test_init_writes_reference_config() {
    let t = TestRepo::new();
    let path = run_init(&InitArgs {
        repo_path: t.dir.path().to_path_buf(),
    })
    .unwrap();
    assert!(path.ends_with(REPOSITORY_CONFIG_FILENAME));
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, REFERENCE_CONFIG);
    assert_eq!(Config::from_toml(&written, "init").unwrap(), Config::default());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let t = TestRepo::new();
    fs::write(t.dir.path().join(REPOSITORY_CONFIG_FILENAME), "# mine").unwrap();
    let err = run_init(&InitArgs {
        repo_path: t.dir.path().to_path_buf(),
    })
    .unwrap_err();
    assert!(matches!(err, ChangelogError::Config(_)));
    assert_eq!(
        fs::read_to_string(t.dir.path().join(REPOSITORY_CONFIG_FILENAME)).unwrap(),
        "# mine"
    );
}

#[test]
fn test_init_refuses_bare_repository() {
    let dir = tempfile::TempDir::new().unwrap();
    git2::Repository::init_bare(dir.path()).unwrap();
    let err = run_init(&InitArgs {
        repo_path: dir.path().to_path_buf(),
    })
    .unwrap_err();
    assert!(matches!(err, ChangelogError::Config(_)));
}
