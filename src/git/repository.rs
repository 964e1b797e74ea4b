use crate::domain::Tag;
use crate::error::{ReleaseError, Result};
use crate::git::CommitInfo;
use git2::{Oid, Repository as Git2Repo};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    push_token: Option<SecretString>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository {
            repo,
            push_token: None,
        })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            push_token: None,
        }
    }

    /// Use an access token for HTTPS pushes (CI checkouts have no SSH keys).
    pub fn with_push_token(mut self, token: SecretString) -> Self {
        self.push_token = Some(token);
        self
    }

    fn tag_commit_oid(&self, tag_name: &str) -> Result<Oid> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", tag_name))
            .map_err(|e| ReleaseError::tag(format!("Cannot find tag '{}': {}", tag_name, e)))?;

        let commit = reference
            .peel_to_commit()
            .map_err(|e| ReleaseError::tag(format!("Cannot peel tag '{}': {}", tag_name, e)))?;

        Ok(commit.id())
    }

    /// Creation time of a tag: tagger time for annotated tags, commit time otherwise.
    fn tag_created_at(&self, tag_name: &str) -> Result<i64> {
        let reference = self.repo.find_reference(&format!("refs/tags/{}", tag_name))?;

        if let Ok(tag) = reference.peel_to_tag() {
            if let Some(tagger) = tag.tagger() {
                return Ok(tagger.when().seconds());
            }
        }

        let commit = reference.peel_to_commit()?;
        Ok(commit.time().seconds())
    }

    fn head_tree(&self) -> Result<git2::Tree<'_>> {
        Ok(self.repo.head()?.peel_to_tree()?)
    }
}

impl super::HistoryProvider for Git2Repository {
    fn list_tags_by_creation(&self) -> Result<Vec<Tag>> {
        let names = self.repo.tag_names(None)?;

        let mut dated = Vec::new();
        for name in names.iter().flatten() {
            dated.push((self.tag_created_at(name)?, name.to_string()));
        }

        // Ties keep name order, like `git for-each-ref --sort=taggerdate`.
        dated.sort();

        Ok(Tag::from_ordered_names(dated.into_iter().map(|(_, name)| name)))
    }

    fn commits_since(&self, base_tag: Option<&str>) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TIME)?;
        revwalk.push_head()?;

        if let Some(tag) = base_tag {
            revwalk.hide(self.tag_commit_oid(tag)?)?;
        }

        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            let message = commit.message().unwrap_or("(empty message)").to_string();

            let author = commit.author().name().unwrap_or("unknown").to_string();

            commits.push(CommitInfo {
                hash: oid.to_string(),
                message,
                author,
            });
        }

        Ok(commits)
    }

    fn changed_paths_since(&self, base_tag: Option<&str>) -> Result<Vec<String>> {
        let head_tree = self.head_tree()?;

        let base_tree = match base_tag {
            Some(tag) => Some(self.repo.find_commit(self.tag_commit_oid(tag)?)?.tree()?),
            None => None,
        };

        let diff = self
            .repo
            .diff_tree_to_tree(base_tree.as_ref(), Some(&head_tree), None)?;

        let mut paths = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.insert(path.to_string_lossy().into_owned());
                }
            }
        }

        Ok(paths.into_iter().collect())
    }

    fn head_hash(&self) -> Result<String> {
        Ok(self.repo.head()?.peel_to_commit()?.id().to_string())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;

        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .map_err(|e| ReleaseError::tag(format!("Cannot create tag: {}", e)))?;

        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote)?;

        let mut callbacks = git2::RemoteCallbacks::new();
        let token = self.push_token.clone();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = &token {
                    return git2::Cred::userpass_plaintext(
                        "x-access-token",
                        token.expose_secret(),
                    );
                }
            }
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                return git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
            }
            git2::Cred::default()
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/tags/{}:refs/tags/{}", name, name);
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| ReleaseError::tag(format!("Push of '{}' failed: {}", name, e)))?;

        Ok(())
    }
}
