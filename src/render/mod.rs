//! Changelog renderers
//!
//! Every renderer consumes the same tree: an optional document title and the
//! newest-first list of [`Version`]s, plus [`RenderOptions`]. They differ only
//! in how text is produced: direct string building ([`RestRenderer`]) or one
//! of two template engines ([`HandlebarsRenderer`], [`JinjaRenderer`]).

pub mod handlebars;
pub mod jinja;
pub mod rest;
pub mod templates;
pub mod view;

pub use self::handlebars::HandlebarsRenderer;
pub use jinja::JinjaRenderer;
pub use rest::RestRenderer;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Version;
use crate::error::{ChangelogError, Result};

/// Label of the unreleased version when none is configured
pub const DEFAULT_UNRELEASED_LABEL: &str = "(unreleased)";

/// Options handed to renderers alongside the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOptions {
    pub unreleased_version_label: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            unreleased_version_label: DEFAULT_UNRELEASED_LABEL.to_string(),
        }
    }
}

/// Fully built changelog tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct Changelog {
    pub title: Option<String>,
    pub versions: Vec<Version>,
}

/// Turns a changelog tree into text
///
/// Renderers never mutate the tree. Failures inside a renderer come back as
/// [`ChangelogError::Render`] naming the renderer.
pub trait Renderer {
    /// Identifier used in error messages and logs
    fn name(&self) -> &str;

    /// Render a complete tree
    fn render(&self, changelog: &Changelog, options: &RenderOptions) -> Result<String>;

    /// Render versions as they are produced, writing chunks to `out`
    ///
    /// The default collects every version first; renderers able to emit one
    /// version at a time override it.
    fn render_stream(
        &self,
        title: Option<&str>,
        versions: &mut dyn Iterator<Item = Result<Version>>,
        options: &RenderOptions,
        out: &mut dyn fmt::Write,
    ) -> Result<()> {
        let changelog = Changelog {
            title: title.map(str::to_string),
            versions: versions.collect::<Result<Vec<_>>>()?,
        };
        let text = self.render(&changelog, options)?;
        out.write_str(&text)
            .map_err(|e| ChangelogError::render(self.name(), e))
    }
}

/// Output engine selected by configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEngine {
    /// Built-in reStructuredText renderer
    #[default]
    Rest,
    /// Handlebars template, by bundled name or file path
    Handlebars(String),
    /// Jinja template, by bundled name or file path
    Jinja(String),
}

impl fmt::Display for OutputEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputEngine::Rest => write!(f, "rest"),
            OutputEngine::Handlebars(name) => write!(f, "handlebars:{}", name),
            OutputEngine::Jinja(name) => write!(f, "jinja:{}", name),
        }
    }
}

/// Build the renderer for `engine`
///
/// Template names are looked up as files relative to `base` first, then
/// among the bundled templates.
pub fn build_renderer(engine: &OutputEngine, base: Option<&Path>) -> Result<Box<dyn Renderer>> {
    match engine {
        OutputEngine::Rest => Ok(Box::new(RestRenderer)),
        OutputEngine::Handlebars(name) => {
            let source = templates::load(templates::Engine::Handlebars, name, base)?;
            Ok(Box::new(HandlebarsRenderer::new(name, &source)?))
        }
        OutputEngine::Jinja(name) => {
            let source = templates::load(templates::Engine::Jinja, name, base)?;
            Ok(Box::new(JinjaRenderer::new(name, source)?))
        }
    }
}
