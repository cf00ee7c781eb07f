use thiserror::Error;

/// Unified error type for changelog generation
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Commits '{left}' and '{right}' have no ancestry relationship")]
    UnrelatedCommits { left: String, right: String },

    #[error("Invalid classification config: {0}")]
    ClassificationConfig(String),

    #[error("Renderer '{renderer}' failed: {message}")]
    Render { renderer: String, message: String },

    #[error("Command '{command}' exited with {}{}", exit_label(.code), captured(.stdout, .stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-changelog
pub type Result<T> = std::result::Result<T, ChangelogError>;

impl ChangelogError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ChangelogError::Config(msg.into())
    }

    /// Create a classification (regex/pipeline) configuration error
    pub fn classification(msg: impl Into<String>) -> Self {
        ChangelogError::ClassificationConfig(msg.into())
    }

    /// Create a render error attributed to a renderer
    pub fn render(renderer: impl Into<String>, msg: impl std::fmt::Display) -> Self {
        ChangelogError::Render {
            renderer: renderer.into(),
            message: msg.to_string(),
        }
    }

    /// Create a reference-not-found error
    pub fn reference_not_found(reference: impl Into<String>) -> Self {
        ChangelogError::ReferenceNotFound(reference.into())
    }

    /// Create an unrelated-commits error
    pub fn unrelated(left: impl Into<String>, right: impl Into<String>) -> Self {
        ChangelogError::UnrelatedCommits {
            left: left.into(),
            right: right.into(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("errorlevel {}", code),
        None => "a signal".to_string(),
    }
}

fn captured(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    for (label, stream) in [("stdout", stdout), ("stderr", stderr)] {
        let stream = stream.trim_end();
        if stream.is_empty() {
            continue;
        }
        out.push_str(&format!("\n  {}:", label));
        for line in stream.lines() {
            out.push_str(&format!("\n  | {}", line));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChangelogError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChangelogError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_render_error_names_renderer() {
        let err = ChangelogError::render("handlebars", "missing helper");
        let msg = err.to_string();
        assert!(msg.contains("handlebars"));
        assert!(msg.contains("missing helper"));
    }

    #[test]
    fn test_unrelated_commits_names_both_sides() {
        let err = ChangelogError::unrelated("abc123", "def456");
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }

    #[test]
    fn test_command_failed_includes_streams() {
        let err = ChangelogError::CommandFailed {
            command: "git log".to_string(),
            code: Some(128),
            stdout: String::new(),
            stderr: "fatal: bad revision 'nope'\n".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Command 'git log' exited with errorlevel 128"));
        assert!(msg.contains("stderr:"));
        assert!(msg.contains("| fatal: bad revision 'nope'"));
        assert!(!msg.contains("stdout:"));
    }

    #[test]
    fn test_command_failed_by_signal() {
        let err = ChangelogError::CommandFailed {
            command: "git log".to_string(),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Command 'git log' exited with a signal");
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ChangelogError::config("x"), "Configuration error"),
            (
                ChangelogError::classification("x"),
                "Invalid classification config",
            ),
            (ChangelogError::reference_not_found("x"), "Reference not found"),
            (ChangelogError::render("rest", "x"), "Renderer 'rest' failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
