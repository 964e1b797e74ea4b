use regex::Regex;
use std::sync::OnceLock;

/// A commit subject split into its classification code and message.
///
/// Grammar: `:code:` (word characters only) followed by whitespace and a
/// non-empty message, e.g. `:sparkles: add dark mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub code: String,
    pub message: String,
}

fn subject_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*:(\w+):(?:\s+(.*))?$").ok())
        .as_ref()
}

impl ParsedCommit {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ParsedCommit {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Parse the first line of a commit message.
    ///
    /// Returns `None` when the subject carries no classification code or the
    /// message after the code is empty. Such commits never reach the changelog.
    pub fn parse(message: &str) -> Option<Self> {
        let subject = message.lines().next()?;
        let captures = subject_regex()?.captures(subject)?;

        let code = captures.get(1)?.as_str().to_string();
        let text = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();

        if text.is_empty() {
            return None;
        }

        Some(ParsedCommit {
            code,
            message: text.to_string(),
        })
    }

    /// Parse many messages, silently dropping the ones without a code.
    pub fn parse_all<'a, I>(messages: I) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        messages.into_iter().filter_map(Self::parse).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_code() {
        let commit = ParsedCommit::parse(":sparkles: add X").unwrap();
        assert_eq!(commit.code, "sparkles");
        assert_eq!(commit.message, "add X");
    }

    #[test]
    fn test_parse_uses_subject_only() {
        let commit = ParsedCommit::parse(":bug: fix Y\n\nLonger body text").unwrap();
        assert_eq!(commit.code, "bug");
        assert_eq!(commit.message, "fix Y");
    }

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        let commit = ParsedCommit::parse("  :zap:   faster startup  ").unwrap();
        assert_eq!(commit.code, "zap");
        assert_eq!(commit.message, "faster startup");
    }

    #[test]
    fn test_parse_without_code_is_none() {
        assert_eq!(ParsedCommit::parse("Random commit message"), None);
        assert_eq!(ParsedCommit::parse("feat: conventional style"), None);
        assert_eq!(ParsedCommit::parse(""), None);
    }

    #[test]
    fn test_parse_code_without_message_is_none() {
        assert_eq!(ParsedCommit::parse(":sparkles:"), None);
        assert_eq!(ParsedCommit::parse(":sparkles:   "), None);
    }

    #[test]
    fn test_parse_requires_separator() {
        assert_eq!(ParsedCommit::parse(":sparkles:add X"), None);
    }

    #[test]
    fn test_parse_rejects_non_word_code() {
        assert_eq!(ParsedCommit::parse(":+1: thanks"), None);
    }

    #[test]
    fn test_parse_all_drops_unparseable() {
        let commits = ParsedCommit::parse_all([":bug: one", "no code", ":memo: two"]);
        assert_eq!(
            commits,
            vec![ParsedCommit::new("bug", "one"), ParsedCommit::new("memo", "two")]
        );
    }
}
