//! Domain values - commits, tags, classification rules and the version tree

pub mod commit;
pub mod section;
pub mod tag;
pub mod trailer;
pub mod version;

pub use commit::{Commit, CommitFields, CommitRef};
pub use section::{first_matching, IgnoreRules, SectionRule, SectionRules};
pub use tag::{Tag, TagFilter};
pub use trailer::{TrailerValue, Trailers};
pub use version::{ChangelogEntry, Section, Version};
