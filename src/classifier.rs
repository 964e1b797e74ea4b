//! Commit classification into changelog sections.

use crate::config::CategoryConfig;
use crate::domain::ParsedCommit;
use std::collections::HashMap;

/// One titled section of the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSection {
    pub title: String,
    pub entries: Vec<String>,
}

/// Changelog sections in the order they first received an entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Changelog {
    pub sections: Vec<ChangeSection>,
}

impl Changelog {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, title: &str) -> Option<&ChangeSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Total number of entries across sections
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    fn push(&mut self, title: &str, message: &str) {
        let index = match self.sections.iter().position(|s| s.title == title) {
            Some(index) => index,
            None => {
                self.sections.push(ChangeSection {
                    title: title.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };

        let entries = &mut self.sections[index].entries;
        if !entries.iter().any(|e| e == message) {
            entries.push(message.to_string());
        }
    }
}

/// Result of classifying a batch of commits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub changelog: Changelog,
    /// Parsed commits whose code no category claims
    pub unmatched: usize,
}

/// Maps commit codes to category titles; the first configured category wins.
pub struct CommitClassifier {
    titles_by_code: HashMap<String, String>,
}

impl CommitClassifier {
    pub fn new(categories: &[CategoryConfig]) -> Self {
        let mut titles_by_code = HashMap::new();
        for category in categories {
            for label in &category.labels {
                titles_by_code
                    .entry(label.clone())
                    .or_insert_with(|| category.title.clone());
            }
        }
        CommitClassifier { titles_by_code }
    }

    /// Category title for a code, if any
    pub fn category_for(&self, code: &str) -> Option<&str> {
        self.titles_by_code.get(code).map(String::as_str)
    }

    pub fn classify(&self, commits: &[ParsedCommit]) -> Classification {
        let mut classification = Classification::default();

        for commit in commits {
            match self.category_for(&commit.code) {
                Some(title) => classification.changelog.push(title, &commit.message),
                None => classification.unmatched += 1,
            }
        }

        classification
    }
}
