//! Handlebars renderer over [`ChangelogView`](super::view::ChangelogView).

use handlebars::Handlebars;

use crate::error::{ChangelogError, Result};
use crate::render::view::ChangelogView;
use crate::render::{Changelog, RenderOptions, Renderer};

pub struct HandlebarsRenderer {
    name: String,
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Compile `source`; syntax errors surface here rather than at render time
    pub fn new(name: &str, source: &str) -> Result<Self> {
        let name = format!("handlebars:{}", name);
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(&name, source)
            .map_err(|e| ChangelogError::render(&name, e))?;
        Ok(HandlebarsRenderer { name, registry })
    }
}

impl std::fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlebarsRenderer")
            .field("name", &self.name)
            .finish()
    }
}

impl Renderer for HandlebarsRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, changelog: &Changelog, options: &RenderOptions) -> Result<String> {
        let view = ChangelogView::new(changelog, options);
        self.registry
            .render(&self.name, &view)
            .map_err(|e| ChangelogError::render(&self.name, e))
    }
}
