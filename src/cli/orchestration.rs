//! Command workflows
//!
//! Each workflow takes plain arguments rather than clap types so it can be
//! driven from tests without a process boundary.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::analyzer;
use crate::config::{self, Backend, REFERENCE_CONFIG, REPOSITORY_CONFIG_FILENAME};
use crate::error::{ChangelogError, Result};
use crate::git::{Git2Repository, Repository, SystemGitRepository};
use crate::render::build_renderer;
use crate::warning::ChangelogWarning;

/// Arguments for `show`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShowArgs {
    /// Any path inside the repository
    pub repo_path: PathBuf,

    /// `--config`
    pub config_path: Option<PathBuf>,

    /// Revisions; empty means the whole history up to `HEAD`
    pub revlist: Vec<String>,
}

/// Arguments for `init`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InitArgs {
    /// Any path inside the repository
    pub repo_path: PathBuf,
}

fn open_backend(backend: Backend, probe: Git2Repository, path: &Path) -> Result<Box<dyn Repository>> {
    match backend {
        Backend::Git2 => Ok(Box::new(probe)),
        Backend::System => Ok(Box::new(SystemGitRepository::open(path)?)),
    }
}

/// Render the changelog of `args.revlist`.
///
/// Steps:
/// 1. Open the repository and locate the configuration
/// 2. Compile classification rules and pipelines
/// 3. Build the renderer for the configured output engine
/// 4. Partition and render through the configured backend
///
/// Advisory warnings go to `warn`; the returned text is the full document.
pub fn run_show(args: &ShowArgs, warn: &mut dyn FnMut(&ChangelogWarning)) -> Result<String> {
    let probe = Git2Repository::open(&args.repo_path)?;
    let (config, source) = config::load_config(args.config_path.as_deref(), &probe)?;
    debug!(?source, backend = ?config.backend, engine = %config.output_engine, "configuration loaded");

    let settings = config.settings()?;
    let workdir = probe.workdir();
    let renderer = build_renderer(&config.output_engine, workdir.as_deref())?;
    let options = config.render_options();

    let repo = open_backend(config.backend, probe, &args.repo_path)?;
    analyzer::changelog(
        repo.as_ref(),
        &args.revlist,
        &settings,
        renderer.as_ref(),
        &options,
        warn,
    )
}

/// Write the reference configuration at the root of the work tree.
///
/// Refuses bare repositories and never overwrites an existing file.
pub fn run_init(args: &InitArgs) -> Result<PathBuf> {
    let repo = Git2Repository::open(&args.repo_path)?;
    let root = repo
        .workdir()
        .ok_or_else(|| ChangelogError::config("cannot init a bare repository"))?;

    let path = root.join(REPOSITORY_CONFIG_FILENAME);
    if path.exists() {
        return Err(ChangelogError::config(format!(
            "'{}' already exists",
            path.display()
        )));
    }

    fs::write(&path, REFERENCE_CONFIG)?;
    debug!(path = %path.display(), "wrote reference configuration");
    Ok(path)
}
