//! Jinja renderer backed by minijinja.
//!
//! Templates see the raw tree as `data` and the render options as `opts`,
//! plus a few text filters:
//!
//! - `underline(ch)`: the value, a newline, then `ch` repeated to its width
//! - `indent_text(chars="  ", first=none)`
//! - `bullet`: wrapped and laid out as a `- ` list item
//! - `ucfirst`
//! - `paragraph_wrap`

use minijinja::{context, AutoEscape, Environment};
use regex::Regex;

use crate::error::{ChangelogError, Result};
use crate::render::{Changelog, RenderOptions, Renderer};
use crate::text;

fn underline(value: String, rule: Option<String>) -> String {
    let label = value.trim();
    let rule = rule.unwrap_or_else(|| "-".to_string());
    format!("{}\n{}", label, rule.repeat(label.chars().count()))
}

fn indent_text(value: String, chars: Option<String>, first: Option<String>) -> String {
    text::indent(&value, chars.as_deref().unwrap_or("  "), first.as_deref())
}

fn bullet(value: String) -> String {
    text::indent(&text::wrap_line(&value), "  ", Some("- "))
        .trim()
        .to_string()
}

fn paragraph_wrap(value: String) -> std::result::Result<String, minijinja::Error> {
    let separator = Regex::new("\n\n").map_err(|e| {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
    })?;
    Ok(text::paragraph_wrap(&value, &separator))
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("underline", underline);
    env.add_filter("indent_text", indent_text);
    env.add_filter("bullet", bullet);
    env.add_filter("ucfirst", |value: String| text::ucfirst(&value));
    env.add_filter("paragraph_wrap", paragraph_wrap);
    env
}

pub struct JinjaRenderer {
    name: String,
    source: String,
    env: Environment<'static>,
}

impl JinjaRenderer {
    /// Parse `source` once to reject syntax errors up front
    pub fn new(name: &str, source: String) -> Result<Self> {
        let name = format!("jinja:{}", name);
        environment()
            .template_from_named_str(&name, &source)
            .map(|_| ())
            .map_err(|e| ChangelogError::render(&name, e))?;
        Ok(JinjaRenderer {
            name,
            source,
            env: environment(),
        })
    }
}

impl std::fmt::Debug for JinjaRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaRenderer")
            .field("name", &self.name)
            .finish()
    }
}

impl Renderer for JinjaRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, changelog: &Changelog, options: &RenderOptions) -> Result<String> {
        self.env
            .render_named_str(
                &self.name,
                &self.source,
                context! { data => changelog, opts => options },
            )
            .map_err(|e| ChangelogError::render(&self.name, e))
    }
}
