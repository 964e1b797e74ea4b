use thiserror::Error;

/// Unified error type for release pipeline operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Build manifest error: {0}")]
    Manifest(String),

    #[error("Missing credential: {0}")]
    Credential(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Signing failed: {0}")]
    Sign(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in the release pipeline
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::Tag(msg.into())
    }

    /// Create a build manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        ReleaseError::Manifest(msg.into())
    }

    /// Create a missing-credential error naming the variable
    pub fn credential(name: impl Into<String>) -> Self {
        ReleaseError::Credential(name.into())
    }

    /// Create a precondition error with context
    pub fn precondition(msg: impl Into<String>) -> Self {
        ReleaseError::Precondition(msg.into())
    }

    /// Create a build error with context
    pub fn build(msg: impl Into<String>) -> Self {
        ReleaseError::Build(msg.into())
    }

    /// Create a signing error with context
    pub fn sign(msg: impl Into<String>) -> Self {
        ReleaseError::Sign(msg.into())
    }

    /// Create a publish error with context
    pub fn publish(msg: impl Into<String>) -> Self {
        ReleaseError::Publish(msg.into())
    }

    /// Whether this error aborts the run before anything was built.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ReleaseError::Credential(_) | ReleaseError::Precondition(_) | ReleaseError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_credential_error_names_variable() {
        let err = ReleaseError::credential("SIGN_ALIAS");
        assert_eq!(err.to_string(), "Missing credential: SIGN_ALIAS");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_build_errors_are_not_preconditions() {
        assert!(!ReleaseError::build("gradle exited 1").is_precondition());
        assert!(!ReleaseError::sign("apksigner exited 1").is_precondition());
        assert!(!ReleaseError::publish("HTTP 500").is_precondition());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ReleaseError::config("x"), "Configuration error"),
            (ReleaseError::version("x"), "Version error"),
            (ReleaseError::tag("x"), "Tag error"),
            (ReleaseError::manifest("x"), "Build manifest error"),
            (ReleaseError::precondition("x"), "Precondition failed"),
            (ReleaseError::build("x"), "Build failed"),
            (ReleaseError::sign("x"), "Signing failed"),
            (ReleaseError::publish("x"), "Publish failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ReleaseError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
