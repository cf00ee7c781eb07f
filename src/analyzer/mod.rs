//! Changelog engine: revision ranges and the version partitioner

pub mod partitioner;
pub mod range;

pub use partitioner::{changelog, versions, ChangelogSettings, Versions, CHANGELOG_TITLE};
pub use range::{resolve_range, RevisionRange};
