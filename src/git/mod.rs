//! Version-control history abstraction
//!
//! The release pipeline only needs a narrow view of history: tags in creation
//! order, commits since a tag, paths changed since a tag, and the ability to
//! tag and push the released commit. The [HistoryProvider] trait captures that
//! view so the resolver and the controller can run against either a real
//! repository or an in-memory fixture.
//!
//! - [repository::Git2Repository]: implementation backed by the `git2` crate
//! - [mock::MockRepository]: in-memory implementation for tests
//!
//! ```rust
//! # use flavor_release::git::{HistoryProvider, MockRepository};
//! let mut repo = MockRepository::new();
//! repo.add_tag("1.0.0-stable.20240101_0000");
//! repo.add_commit(":sparkles: add widget");
//! let tags = repo.list_tags_by_creation().unwrap();
//! let commits = repo.commits_since(Some(tags[0].name.as_str())).unwrap();
//! assert_eq!(commits.len(), 1);
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Tag;
use crate::error::Result;

/// Commit information read from history
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The full commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// History operations the release pipeline depends on
///
/// All methods return [crate::error::Result<T>]; implementations map their
/// underlying errors (like `git2::Error`) onto [crate::error::ReleaseError].
pub trait HistoryProvider {
    /// List every tag, oldest first.
    ///
    /// The returned [Tag::order] values are the positions in this list.
    fn list_tags_by_creation(&self) -> Result<Vec<Tag>>;

    /// Commits reachable from HEAD but not from `base_tag`, newest first
    /// (the order `git log` prints them).
    ///
    /// With `base_tag = None` every commit reachable from HEAD is returned.
    fn commits_since(&self, base_tag: Option<&str>) -> Result<Vec<CommitInfo>>;

    /// Paths that differ between `base_tag` and HEAD.
    ///
    /// With `base_tag = None` every path in the HEAD tree is returned.
    fn changed_paths_since(&self, base_tag: Option<&str>) -> Result<Vec<String>>;

    /// Hash of the commit HEAD points to
    fn head_hash(&self) -> Result<String>;

    /// Create a lightweight tag at HEAD
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Push one tag to a remote
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;
}
