//! Template lookup: files on disk first, then the bundled set.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChangelogError, Result};

/// Template engine a template is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Handlebars,
    Jinja,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Handlebars => write!(f, "handlebars"),
            Engine::Jinja => write!(f, "jinja"),
        }
    }
}

const HANDLEBARS_BUNDLED: &[(&str, &str)] = &[(
    "restructuredtext",
    include_str!("../../templates/handlebars/restructuredtext.hbs"),
)];

const JINJA_BUNDLED: &[(&str, &str)] = &[(
    "restructuredtext",
    include_str!("../../templates/jinja/restructuredtext.j2"),
)];

impl Engine {
    fn bundled(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Engine::Handlebars => HANDLEBARS_BUNDLED,
            Engine::Jinja => JINJA_BUNDLED,
        }
    }

    /// Names of the templates shipped with the binary
    pub fn bundled_names(self) -> Vec<&'static str> {
        self.bundled().iter().map(|(name, _)| *name).collect()
    }
}

fn candidate_path(name: &str, base: Option<&Path>) -> PathBuf {
    let path = Path::new(name);
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Source of template `name` for `engine`
///
/// An existing file (relative names are taken from `base`) wins over a
/// bundled template of the same name.
pub fn load(engine: Engine, name: &str, base: Option<&Path>) -> Result<String> {
    let path = candidate_path(name, base);
    if path.is_file() {
        tracing::debug!(engine = %engine, path = %path.display(), "loading template file");
        return Ok(fs::read_to_string(&path)?);
    }

    engine
        .bundled()
        .iter()
        .find(|(bundled, _)| *bundled == name)
        .map(|(_, source)| source.to_string())
        .ok_or_else(|| {
            ChangelogError::config(format!(
                "no {} template named '{}' (not a file, bundled templates: {})",
                engine,
                name,
                engine.bundled_names().join(", ")
            ))
        })
}
