use crate::error::{ReleaseError, Result};
use regex::Regex;

/// Represents a git tag and its position in creation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Index in the creation-ordered tag list (0 = oldest).
    pub order: usize,
}

impl Tag {
    pub fn new(name: impl Into<String>, order: usize) -> Self {
        Tag {
            name: name.into(),
            order,
        }
    }

    /// Build tags from names already sorted oldest to newest.
    pub fn from_ordered_names<I, S>(names: I) -> Vec<Tag>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(order, name)| Tag::new(name, order))
            .collect()
    }
}

/// Channel-qualified release tag pattern: `<semver>-<channel>.<YYYYMMDD>_<HHMM>`
#[derive(Debug, Clone)]
pub struct ChannelTagPattern {
    channel: String,
    regex: Regex,
}

impl ChannelTagPattern {
    /// Create the pattern for one channel
    pub fn new(channel: &str) -> Result<Self> {
        if channel.is_empty() {
            return Err(ReleaseError::tag("channel must not be empty"));
        }

        let pattern = format!(r"^\d+\.\d+\.\d+-{}\.\d{{8}}_\d{{4}}$", regex::escape(channel));
        let regex = Regex::new(&pattern)
            .map_err(|e| ReleaseError::tag(format!("Invalid channel pattern: {}", e)))?;

        Ok(ChannelTagPattern {
            channel: channel.to_string(),
            regex,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Validate if a tag name matches this channel
    pub fn matches(&self, tag: &str) -> bool {
        self.regex.is_match(tag)
    }

    /// The newest tag matching this channel, scanning from the newest end.
    pub fn newest_match<'a>(&self, tags: &'a [Tag]) -> Option<&'a Tag> {
        tags.iter()
            .rev()
            .find(|tag| self.matches(&tag.name))
    }
}
