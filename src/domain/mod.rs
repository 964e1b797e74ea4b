//! Domain logic - pure release rules independent of git, processes and HTTP

pub mod artifact;
pub mod commit;
pub mod tag;
pub mod version;

pub use artifact::{Flavor, ReleaseArtifact};
pub use commit::ParsedCommit;
pub use tag::{ChannelTagPattern, Tag};
pub use version::ReleaseVersion;
