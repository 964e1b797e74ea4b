use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit configuration path is given.
pub const CONFIG_FILE_NAME: &str = "flavor-release.toml";

/// Represents the complete configuration for a release run.
///
/// Contains the release channel rules, build layout, changelog taxonomy and the
/// settings of every distribution target.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    #[serde(default)]
    pub forum: ForumConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// What to do when no tag matches the channel pattern.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagFallbackPolicy {
    /// Use the most recently created tag of any name.
    #[default]
    Latest,
    /// Refuse to release.
    Error,
}

/// Channel and history rules.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReleaseConfig {
    /// Code-hosting repository in `owner/name` form.
    #[serde(default)]
    pub repo: String,

    #[serde(default = "default_channel")]
    pub channel: String,

    /// Channel that publishes full releases and posts to the forum.
    #[serde(default = "default_channel")]
    pub stable_channel: String,

    #[serde(default)]
    pub tag_fallback: TagFallbackPolicy,

    /// Path prefixes whose modification requires a device restart.
    #[serde(default = "default_sensitive_paths")]
    pub sensitive_paths: Vec<String>,
}

fn default_channel() -> String {
    "stable".to_string()
}

fn default_sensitive_paths() -> Vec<String> {
    vec![
        "server".to_string(),
        "app/src/lsposed/java/net/ankio/auto/hooks/android".to_string(),
    ]
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            repo: String::new(),
            channel: default_channel(),
            stable_channel: default_channel(),
            tag_fallback: TagFallbackPolicy::default(),
            sensitive_paths: default_sensitive_paths(),
        }
    }
}

/// Build layout relative to the workspace root.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildConfig {
    #[serde(default = "default_flavors")]
    pub flavors: Vec<String>,

    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,

    #[serde(default = "default_keystore")]
    pub keystore: PathBuf,

    #[serde(default = "default_gradle_wrapper")]
    pub gradle_wrapper: PathBuf,

    /// Android build-tools version hosting `apksigner`.
    #[serde(default = "default_build_tools_version")]
    pub build_tools_version: String,
}

fn default_flavors() -> Vec<String> {
    vec!["lsposed".to_string(), "lspatch".to_string()]
}

fn default_artifact_extension() -> String {
    "apk".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("app/build.gradle")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_keystore() -> PathBuf {
    PathBuf::from(".github/workflows/key")
}

fn default_gradle_wrapper() -> PathBuf {
    PathBuf::from("gradlew")
}

fn default_build_tools_version() -> String {
    "29.0.3".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            flavors: default_flavors(),
            artifact_extension: default_artifact_extension(),
            manifest: default_manifest(),
            dist_dir: default_dist_dir(),
            keystore: default_keystore(),
            gradle_wrapper: default_gradle_wrapper(),
            build_tools_version: default_build_tools_version(),
        }
    }
}

/// A changelog section and the commit codes that land in it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    pub title: String,
    pub labels: Vec<String>,
}

impl CategoryConfig {
    pub fn new(title: impl Into<String>, labels: &[&str]) -> Self {
        CategoryConfig {
            title: title.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Returns the default category taxonomy.
fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("Features", &["sparkles", "tada", "rocket"]),
        CategoryConfig::new("Fixes", &["bug", "ambulance", "adhesive_bandage"]),
        CategoryConfig::new("Performance", &["zap"]),
        CategoryConfig::new("Refactoring", &["recycle", "art", "truck"]),
        CategoryConfig::new("Documentation", &["memo", "bulb"]),
        CategoryConfig::new("Translations", &["globe_with_meridians"]),
    ]
}

fn default_max_caption_chars() -> usize {
    4000
}

fn default_restart_notice() -> String {
    "This release modifies framework hooks; reboot the device for changes to take effect."
        .to_string()
}

/// Changelog taxonomy and rendering limits.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChangelogConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,

    /// Allow one commit code in several categories (first category wins).
    #[serde(default)]
    pub allow_shared_labels: bool,

    #[serde(default = "default_max_caption_chars")]
    pub max_caption_chars: usize,

    #[serde(default = "default_restart_notice")]
    pub restart_notice: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            categories: default_categories(),
            allow_shared_labels: false,
            max_caption_chars: default_max_caption_chars(),
            restart_notice: default_restart_notice(),
        }
    }
}

impl ChangelogConfig {
    /// Reject a code claimed by two categories unless explicitly allowed.
    pub fn validate(&self) -> Result<()> {
        if self.allow_shared_labels {
            return Ok(());
        }
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for category in &self.categories {
            for label in &category.labels {
                if let Some(first) = owners.insert(label.as_str(), category.title.as_str()) {
                    if first != category.title {
                        return Err(ReleaseError::config(format!(
                            "label '{}' is claimed by both '{}' and '{}' (set changelog.allow_shared_labels to permit this)",
                            label, first, category.title
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    #[serde(default = "default_github_web_url")]
    pub web_url: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_web_url() -> String {
    "https://github.com".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: default_github_api_url(),
            web_url: default_github_web_url(),
        }
    }
}

/// Object store (AList `fs/put` compatible).
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// Full URL of the put endpoint, e.g. `https://cloud.example.org/api/fs/put`.
    #[serde(default)]
    pub endpoint: String,

    /// Directory under which each channel gets its own folder.
    #[serde(default)]
    pub root: String,

    /// Public download base corresponding to `root`.
    #[serde(default)]
    pub public_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessagingConfig {
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    /// Channel handle or numeric chat id.
    #[serde(default)]
    pub chat_id: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        MessagingConfig {
            api_url: default_telegram_api_url(),
            chat_id: String::new(),
        }
    }
}

/// Flarum forum settings.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ForumConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub tag_ids: Vec<String>,
}

/// Controls runtime behavior without affecting what gets released.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorConfig {
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Create and push a git tag named after the version once published.
    #[serde(default)]
    pub push_tag: bool,
}

fn default_upload_timeout_secs() -> u64 {
    120
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            upload_timeout_secs: default_upload_timeout_secs(),
            push_tag: false,
        }
    }
}

impl Config {
    /// Check the settings every real release needs before anything is mutated.
    pub fn validate_for_release(&self) -> Result<()> {
        self.changelog.validate()?;

        let required = [
            ("release.repo", &self.release.repo),
            ("storage.endpoint", &self.storage.endpoint),
            ("storage.public_url", &self.storage.public_url),
            ("messaging.chat_id", &self.messaging.chat_id),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ReleaseError::config(format!("{} must be set", key)));
            }
        }
        if self.build.flavors.is_empty() {
            return Err(ReleaseError::config("build.flavors must not be empty"));
        }
        if self.changelog.max_caption_chars < 4 {
            return Err(ReleaseError::config(
                "changelog.max_caption_chars must leave room for the truncation marker",
            ));
        }
        Ok(())
    }

    /// Whether a channel is the stable channel.
    pub fn is_stable(&self, channel: &str) -> bool {
        channel == self.release.stable_channel
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `flavor-release.toml` in the workspace root
/// 3. `.github/flavor-release.toml` in the workspace
/// 4. `flavor-release.toml` in the user config directory
/// 5. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, workspace: &Path) -> Result<Config> {
    let candidates = [
        workspace.join(CONFIG_FILE_NAME),
        workspace.join(".github").join(CONFIG_FILE_NAME),
    ];

    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if let Some(found) = candidates.iter().find(|p| p.exists()) {
        fs::read_to_string(found)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    parse_config(&config_str)
}

/// Parse configuration text.
pub fn parse_config(config_str: &str) -> Result<Config> {
    toml::from_str(config_str).map_err(|e| ReleaseError::config(e.to_string()))
}
