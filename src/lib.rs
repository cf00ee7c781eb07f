pub mod analyzer;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod render;
pub mod text;
pub mod ui;
pub mod warning;

pub use error::{ChangelogError, Result};
