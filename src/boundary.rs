use std::fmt;

/// Non-fatal conditions met during a run that the operator should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No new commits since the base tag
    NoNewCommits {
        base_tag: String,
        current_commit_hash: String,
    },
    /// Commits exist since the base tag but none carries a classification code
    NoCodedCommits { base_tag: String, skipped: usize },
    /// No tag matches the channel; an unrelated tag was used as the base
    ChannelTagFallback { channel: String, fallback: String },
    /// The repository has no tags; all of history was considered
    NoTags,
    /// Commits with a code that no changelog category claims
    UnclassifiedCommits { count: usize },
    /// A stage failed after the manifest was rewritten
    ManifestLeftBumped { manifest: String, version: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                base_tag,
                current_commit_hash,
            } => {
                let short_hash = if current_commit_hash.len() > 7 {
                    &current_commit_hash[..7]
                } else {
                    current_commit_hash.as_str()
                };
                write!(
                    f,
                    "No new commits since tag '{}' (current: {})",
                    base_tag, short_hash
                )
            }
            BoundaryWarning::ChannelTagFallback { channel, fallback } => {
                write!(
                    f,
                    "No tag matches channel '{}'; using latest tag '{}' as base",
                    channel, fallback
                )
            }
            BoundaryWarning::NoCodedCommits { base_tag, skipped } => {
                write!(
                    f,
                    "No coded commits since tag '{}' ({} uncoded commit(s) ignored)",
                    base_tag, skipped
                )
            }
            BoundaryWarning::NoTags => {
                write!(f, "Repository has no tags; the whole history is considered")
            }
            BoundaryWarning::UnclassifiedCommits { count } => {
                write!(
                    f,
                    "{} commit(s) use a code no changelog category claims and were left out",
                    count
                )
            }
            BoundaryWarning::ManifestLeftBumped { manifest, version } => {
                write!(
                    f,
                    "{} still declares versionName \"{}\"; revert it before retrying if needed",
                    manifest, version
                )
            }
        }
    }
}
