use crate::domain::Tag;
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, HistoryProvider};
use std::sync::Mutex;

/// Mock history for testing without an actual repository
///
/// Tags are kept in insertion order, which stands in for creation order.
/// Commits are returned in insertion order, which stands in for `git log`
/// order (newest first).
#[derive(Default)]
pub struct MockRepository {
    tags: Vec<String>,
    commits: Vec<CommitInfo>,
    changed_paths: Vec<String>,
    head: String,
    requested_bases: Mutex<Vec<Option<String>>>,
    created_tags: Mutex<Vec<String>>,
    pushed_tags: Mutex<Vec<(String, String)>>,
    reject_push: bool,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            head: "0000000000000000000000000000000000000000".to_string(),
            ..Default::default()
        }
    }

    /// Add a tag; later calls are treated as newer tags
    pub fn add_tag(&mut self, name: impl Into<String>) {
        self.tags.push(name.into());
    }

    /// Add a commit with the given message
    pub fn add_commit(&mut self, message: impl Into<String>) {
        let index = self.commits.len();
        self.commits.push(CommitInfo {
            hash: format!("{:040x}", index + 1),
            message: message.into(),
            author: "Test Author".to_string(),
        });
    }

    /// Add a path reported as changed since the base tag
    pub fn add_changed_path(&mut self, path: impl Into<String>) {
        self.changed_paths.push(path.into());
    }

    /// Make every [HistoryProvider::push_tag] call fail, as a rejecting remote would
    pub fn reject_tag_pushes(&mut self) {
        self.reject_push = true;
    }

    /// Base tags passed to [HistoryProvider::commits_since], in call order
    pub fn requested_bases(&self) -> Vec<Option<String>> {
        self.requested_bases
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Tags created through [HistoryProvider::create_tag]
    pub fn created_tags(&self) -> Vec<String> {
        self.created_tags
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// `(remote, tag)` pairs pushed through [HistoryProvider::push_tag]
    pub fn pushed_tags(&self) -> Vec<(String, String)> {
        self.pushed_tags
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    fn check_base(&self, base_tag: Option<&str>) -> Result<()> {
        match base_tag {
            Some(tag) if !self.tags.iter().any(|t| t == tag) => {
                Err(ReleaseError::tag(format!("Tag not found: {}", tag)))
            }
            _ => Ok(()),
        }
    }
}

impl HistoryProvider for MockRepository {
    fn list_tags_by_creation(&self) -> Result<Vec<Tag>> {
        Ok(Tag::from_ordered_names(self.tags.iter().cloned()))
    }

    fn commits_since(&self, base_tag: Option<&str>) -> Result<Vec<CommitInfo>> {
        self.check_base(base_tag)?;
        if let Ok(mut bases) = self.requested_bases.lock() {
            bases.push(base_tag.map(str::to_string));
        }
        Ok(self.commits.clone())
    }

    fn changed_paths_since(&self, base_tag: Option<&str>) -> Result<Vec<String>> {
        self.check_base(base_tag)?;
        Ok(self.changed_paths.clone())
    }

    fn head_hash(&self) -> Result<String> {
        Ok(self.head.clone())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        if self.tags.iter().any(|t| t == name) {
            return Err(ReleaseError::tag(format!("Tag already exists: {}", name)));
        }
        if let Ok(mut created) = self.created_tags.lock() {
            created.push(name.to_string());
        }
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        if self.reject_push {
            return Err(ReleaseError::tag(format!("{} rejected {}", remote, name)));
        }
        if let Ok(mut pushed) = self.pushed_tags.lock() {
            pushed.push((remote.to_string(), name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_tags_keep_insertion_order() {
        let mut repo = MockRepository::new();
        repo.add_tag("b");
        repo.add_tag("a");

        let tags = repo.list_tags_by_creation().unwrap();
        assert_eq!(tags, vec![Tag::new("b", 0), Tag::new("a", 1)]);
    }

    #[test]
    fn test_mock_repository_commits_record_base() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1");
        repo.add_commit(":bug: fix");

        let commits = repo.commits_since(Some("v1")).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].subject(), ":bug: fix");
        assert_eq!(repo.requested_bases(), vec![Some("v1".to_string())]);
    }

    #[test]
    fn test_mock_repository_unknown_base_fails() {
        let repo = MockRepository::new();
        assert!(repo.commits_since(Some("missing")).is_err());
        assert!(repo.changed_paths_since(Some("missing")).is_err());
    }

    #[test]
    fn test_mock_repository_records_tagging() {
        let repo = MockRepository::new();
        repo.create_tag("1.0.0-stable.20240101_0000").unwrap();
        repo.push_tag("origin", "1.0.0-stable.20240101_0000").unwrap();

        assert_eq!(repo.created_tags(), vec!["1.0.0-stable.20240101_0000"]);
        assert_eq!(
            repo.pushed_tags(),
            vec![("origin".to_string(), "1.0.0-stable.20240101_0000".to_string())]
        );
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.list_tags_by_creation().unwrap().is_empty());
    }
}
