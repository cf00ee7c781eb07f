use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::ChangelogSettings;
use crate::domain::{IgnoreRules, SectionRule, SectionRules, TagFilter};
use crate::error::{ChangelogError, Result};
use crate::git::Repository;
use crate::render::{OutputEngine, RenderOptions, DEFAULT_UNRELEASED_LABEL};
use crate::text::{build_pipeline, StageSpec, EMPTY_MESSAGE};

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "GITCHANGELOG_CONFIG_FILENAME";

/// Git configuration key holding a configuration path, relative to the work tree
pub const GIT_CONFIG_KEY: &str = "gitchangelog.rc-path";

/// Configuration file looked up at the root of the work tree
pub const REPOSITORY_CONFIG_FILENAME: &str = ".gitchangelog.toml";

/// Configuration file looked up in the user configuration directory
pub const USER_CONFIG_FILENAME: &str = "gitchangelog.toml";

/// Reference configuration written by `git-changelog init`
pub const REFERENCE_CONFIG: &str = include_str!("../templates/gitchangelog.toml");

/// Represents the complete configuration for git-changelog.
///
/// Every key is optional; a missing key takes the reference default, so an
/// empty file behaves exactly like no file at all.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Commits whose subject matches any of these are left out
    #[serde(default = "default_ignore_regexps")]
    pub ignore_regexps: Vec<String>,

    /// Ordered classification rules, first match wins
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,

    /// Tags whose name matches are version boundaries
    #[serde(default = "default_tag_filter_regexp")]
    pub tag_filter_regexp: String,

    #[serde(default = "default_unreleased_version_label")]
    pub unreleased_version_label: String,

    /// Whether merge commits become entries
    #[serde(default = "default_include_merge")]
    pub include_merge: bool,

    #[serde(default = "default_subject_process")]
    pub subject_process: Vec<StageSpec>,

    #[serde(default = "default_body_process")]
    pub body_process: Vec<StageSpec>,

    #[serde(default)]
    pub output_engine: OutputEngine,

    #[serde(default)]
    pub backend: Backend,
}

/// One section rule: a label and the regexes claiming subjects for it.
///
/// Without `regexps` the rule claims every subject that reaches it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SectionConfig {
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexps: Option<Vec<String>>,
}

/// Graph access backend
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process libgit2
    #[default]
    Git2,
    /// The `git` executable
    System,
}

const PREFIXES: &str = r"^([cC]hg|[fF]ix|[nN]ew)\s*:\s*";

fn default_ignore_regexps() -> Vec<String> {
    vec![
        "@minor".to_string(),
        "!minor".to_string(),
        "@cosmetic".to_string(),
        "!cosmetic".to_string(),
        "@refactor".to_string(),
        "!refactor".to_string(),
        "@wip".to_string(),
        "!wip".to_string(),
        format!("{}[p|P]kg:", PREFIXES),
        format!("{}[d|D]ev:", PREFIXES),
        r"^(.{3,3}\s*:)?\s*[fF]irst commit.?\s*$".to_string(),
        "^$".to_string(),
    ]
}

fn section(label: &str, prefix: &str) -> SectionConfig {
    SectionConfig {
        label: label.to_string(),
        regexps: Some(vec![format!(
            r"^{}\s*:\s*((dev|use?r|pkg|test|doc)\s*:\s*)?([^\n]*)$",
            prefix
        )]),
    }
}

fn default_sections() -> Vec<SectionConfig> {
    vec![
        section("New", "[nN]ew"),
        section("Changes", "[cC]hg"),
        section("Fix", "[fF]ix"),
        SectionConfig {
            label: "Other".to_string(),
            regexps: None,
        },
    ]
}

fn default_tag_filter_regexp() -> String {
    r"^[0-9]+\.[0-9]+(\.[0-9]+)?$".to_string()
}

fn default_unreleased_version_label() -> String {
    DEFAULT_UNRELEASED_LABEL.to_string()
}

fn default_include_merge() -> bool {
    true
}

fn default_subject_process() -> Vec<StageSpec> {
    vec![
        StageSpec::Strip,
        StageSpec::Resub {
            pattern: format!(
                r"{}((dev|use?r|pkg|test|doc)\s*:\s*)?([^\n@]*)(@[a-z]+\s+)*$",
                PREFIXES
            ),
            replacement: "${4}".to_string(),
        },
        StageSpec::SetIfEmpty(EMPTY_MESSAGE.to_string()),
        StageSpec::Ucfirst,
        StageSpec::FinalDot,
    ]
}

fn default_body_process() -> Vec<StageSpec> {
    vec![StageSpec::Strip]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ignore_regexps: default_ignore_regexps(),
            sections: default_sections(),
            tag_filter_regexp: default_tag_filter_regexp(),
            unreleased_version_label: default_unreleased_version_label(),
            include_merge: default_include_merge(),
            subject_process: default_subject_process(),
            body_process: default_body_process(),
            output_engine: OutputEngine::default(),
            backend: Backend::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document; `origin` only labels error messages
    pub fn from_toml(source: &str, origin: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|e| ChangelogError::config(format!("invalid config file '{}': {}", origin, e)))
    }

    /// Read and parse the file at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            ChangelogError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        Config::from_toml(&source, &path.display().to_string())
    }

    /// Compile every regex and pipeline.
    ///
    /// Runs before any graph walk, so a broken pattern fails the whole run
    /// with [ChangelogError::ClassificationConfig] up front.
    pub fn settings(&self) -> Result<ChangelogSettings> {
        let sections = self
            .sections
            .iter()
            .map(|s| SectionRule::new(s.label.as_str(), s.regexps.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(ChangelogSettings {
            ignore: IgnoreRules::new(&self.ignore_regexps)?,
            sections: SectionRules::new(sections),
            tag_filter: TagFilter::new(&self.tag_filter_regexp)?,
            include_merges: self.include_merge,
            subject_process: build_pipeline(&self.subject_process)?,
            body_process: build_pipeline(&self.body_process)?,
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            unreleased_version_label: self.unreleased_version_label.clone(),
        }
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config`
    Explicit(PathBuf),
    /// [CONFIG_ENV_VAR]
    Environment(PathBuf),
    /// [GIT_CONFIG_KEY]
    GitConfig(PathBuf),
    /// [REPOSITORY_CONFIG_FILENAME] at the work tree root
    Repository(PathBuf),
    /// [USER_CONFIG_FILENAME] in the user configuration directory
    User(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(path)
            | ConfigSource::Environment(path)
            | ConfigSource::GitConfig(path)
            | ConfigSource::Repository(path)
            | ConfigSource::User(path) => Some(path),
            ConfigSource::Defaults => None,
        }
    }
}

fn required(path: PathBuf, origin: &str) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ChangelogError::config(format!(
            "config file '{}' given by {} does not exist",
            path.display(),
            origin
        )))
    }
}

/// Find the configuration file to use.
///
/// Attempts the following in order:
/// 1. `explicit` path (must exist)
/// 2. [CONFIG_ENV_VAR] (must exist)
/// 3. git config [GIT_CONFIG_KEY], relative to the work tree (must exist)
/// 4. [REPOSITORY_CONFIG_FILENAME] at the work tree root
/// 5. [USER_CONFIG_FILENAME] in the user configuration directory
/// 6. Built-in defaults
pub fn locate_config<R: Repository + ?Sized>(explicit: Option<&Path>, repo: &R) -> Result<ConfigSource> {
    if let Some(path) = explicit {
        return required(path.to_path_buf(), "--config").map(ConfigSource::Explicit);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return required(PathBuf::from(path), CONFIG_ENV_VAR).map(ConfigSource::Environment);
        }
    }

    let workdir = repo.workdir();
    if let Some(path) = repo.config_value(GIT_CONFIG_KEY)? {
        let path = match &workdir {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        };
        return required(path, GIT_CONFIG_KEY).map(ConfigSource::GitConfig);
    }

    if let Some(root) = &workdir {
        let path = root.join(REPOSITORY_CONFIG_FILENAME);
        if path.is_file() {
            return Ok(ConfigSource::Repository(path));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(USER_CONFIG_FILENAME);
        if path.is_file() {
            return Ok(ConfigSource::User(path));
        }
    }

    Ok(ConfigSource::Defaults)
}

/// Locate and load the configuration, falling back to defaults.
///
/// # Returns
/// * `Ok((Config, ConfigSource))` - Loaded or default configuration
/// * `Err` - If a required file is missing, or a file cannot be read or parsed
pub fn load_config<R: Repository + ?Sized>(
    explicit: Option<&Path>,
    repo: &R,
) -> Result<(Config, ConfigSource)> {
    let source = locate_config(explicit, repo)?;
    let config = match source.path() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            Config::from_file(path)?
        }
        None => {
            tracing::debug!("no configuration file, using defaults");
            Config::default()
        }
    };
    Ok((config, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_config_matches_defaults() {
        let config = Config::from_toml(REFERENCE_CONFIG, "reference").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(Config::from_toml("", "empty").unwrap(), Config::default());
    }

    #[test]
    fn test_defaults_compile() {
        let settings = Config::default().settings().unwrap();
        assert_eq!(settings.sections.len(), 4);
        assert!(settings.tag_filter.matches("0.0.3"));
        assert!(!settings.tag_filter.matches("v1.0"));
        assert!(settings.ignore.is_ignored("chg: modified ``b`` !minor"));
        assert!(settings.ignore.is_ignored("new: first commit"));
        assert!(settings.ignore.is_ignored(""));
        assert!(!settings.ignore.is_ignored("new: add file ``c``"));
    }

    #[test]
    fn test_default_subject_pipeline() {
        let settings = Config::default().settings().unwrap();
        let subject = |s: &str| settings.subject_process.apply(s);
        assert_eq!(subject("chg: modified ``b`` XXX"), "Modified ``b`` XXX.");
        assert_eq!(subject("new: usr: add file ``c``"), "Add file ``c``");
        assert_eq!(subject("fix: dev: typo"), "Typo.");
        assert_eq!(subject("new:"), EMPTY_MESSAGE);
        assert_eq!(subject("  plain subject  "), "Plain subject.");
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let config = Config::from_toml(
            r#"
tag_filter_regexp = 'v[0-9]+'
include_merge = false
output_engine = { jinja = "restructuredtext" }
backend = "system"

[[sections]]
label = "Features"
regexps = ['^feat']

[[sections]]
label = "Misc"
"#,
            "partial",
        )
        .unwrap();
        assert_eq!(config.tag_filter_regexp, "v[0-9]+");
        assert!(!config.include_merge);
        assert_eq!(config.output_engine, OutputEngine::Jinja("restructuredtext".to_string()));
        assert_eq!(config.backend, Backend::System);
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[1].regexps, None);
        assert_eq!(config.ignore_regexps, default_ignore_regexps());
    }

    #[test]
    fn test_stage_specs_from_toml() {
        let config = Config::from_toml(
            r#"
body_process = ["strip", { wrap = {} }, { indent = { chars = "> " } }, { set_if_empty = "-" }]
"#,
            "stages",
        )
        .unwrap();
        assert_eq!(
            config.body_process,
            vec![
                StageSpec::Strip,
                StageSpec::Wrap { regexp: None },
                StageSpec::Indent {
                    chars: "> ".to_string(),
                    first: None
                },
                StageSpec::SetIfEmpty("-".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_regex_fails_settings() {
        let config = Config {
            sections: vec![SectionConfig {
                label: "Broken".to_string(),
                regexps: Some(vec!["([".to_string()]),
            }],
            ..Config::default()
        };
        assert!(matches!(
            config.settings(),
            Err(ChangelogError::ClassificationConfig(_))
        ));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = Config::from_toml("sections = 3", "bad.toml").unwrap_err();
        assert!(matches!(err, ChangelogError::Config(ref msg) if msg.contains("bad.toml")));
    }
}
