// tests/config_test.rs
use flavor_release::config::{load_config, Config, TagFallbackPolicy, CONFIG_FILE_NAME};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.release.channel, "stable");
    assert_eq!(config.release.stable_channel, "stable");
    assert_eq!(config.build.flavors, vec!["lsposed", "lspatch"]);
    assert_eq!(config.build.manifest, PathBuf::from("app/build.gradle"));
    assert_eq!(config.changelog.max_caption_chars, 4000);
    assert_eq!(config.behavior.upload_timeout_secs, 120);
    assert!(!config.behavior.push_tag);
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[release]
repo = "example/app"
tag_fallback = "error"
sensitive_paths = ["server"]

[build]
flavors = ["full"]

[[changelog.categories]]
title = "New"
labels = ["sparkles"]

[storage]
endpoint = "https://cloud.example.org/api/fs/put"
root = "/releases"
public_url = "https://cloud.example.org/releases"

[messaging]
chat_id = "@example"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let workspace = TempDir::new().unwrap();
    let config = load_config(Some(temp_file.path()), workspace.path()).unwrap();

    assert_eq!(config.release.repo, "example/app");
    assert_eq!(config.release.tag_fallback, TagFallbackPolicy::Error);
    assert_eq!(config.release.sensitive_paths, vec!["server"]);
    assert_eq!(config.build.flavors, vec!["full"]);
    assert_eq!(config.build.artifact_extension, "apk");
    assert_eq!(config.changelog.categories.len(), 1);
    assert_eq!(config.changelog.categories[0].title, "New");
    assert!(config.validate_for_release().is_ok());
}

#[test]
fn test_workspace_github_dir_is_searched() {
    let workspace = TempDir::new().unwrap();
    let github = workspace.path().join(".github");
    fs::create_dir_all(&github).unwrap();
    fs::write(
        github.join(CONFIG_FILE_NAME),
        "[release]\nrepo = \"from/github-dir\"\n",
    )
    .unwrap();

    let config = load_config(None, workspace.path()).unwrap();
    assert_eq!(config.release.repo, "from/github-dir");
}

#[test]
fn test_workspace_root_wins_over_github_dir() {
    let workspace = TempDir::new().unwrap();
    fs::create_dir_all(workspace.path().join(".github")).unwrap();
    fs::write(
        workspace.path().join(".github").join(CONFIG_FILE_NAME),
        "[release]\nrepo = \"from/github-dir\"\n",
    )
    .unwrap();
    fs::write(
        workspace.path().join(CONFIG_FILE_NAME),
        "[release]\nrepo = \"from/root\"\n",
    )
    .unwrap();

    let config = load_config(None, workspace.path()).unwrap();
    assert_eq!(config.release.repo, "from/root");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[release\nrepo = ").unwrap();
    temp_file.flush().unwrap();

    let workspace = TempDir::new().unwrap();
    let err = load_config(Some(temp_file.path()), workspace.path()).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_release_validation_lists_missing_key() {
    let err = Config::default().validate_for_release().unwrap_err();
    assert!(err.to_string().contains("release.repo"));
}
