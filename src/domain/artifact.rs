use std::fmt;
use std::path::{Path, PathBuf};

/// One product variant of the application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flavor {
    pub name: String,
}

impl Flavor {
    pub fn new(name: impl Into<String>) -> Self {
        Flavor { name: name.into() }
    }

    pub fn from_names(names: &[String]) -> Vec<Flavor> {
        names.iter().map(Flavor::new).collect()
    }

    /// Gradle task that assembles the release variant, e.g. `assembleLsposedRelease`.
    pub fn assemble_task(&self) -> String {
        let mut chars = self.name.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("assemble{}Release", capitalized)
    }

    /// Staged, not yet signed file name: `app-<flavor>.<ext>`.
    pub fn unsigned_file_name(&self, extension: &str) -> String {
        format!("app-{}.{}", self.name, extension)
    }

    /// Signed file name: `app-<flavor>-signed.<ext>`.
    pub fn signed_file_name(&self, extension: &str) -> String {
        format!("app-{}-signed.{}", self.name, extension)
    }

    /// Name used when distributing outside the release host: `<version>-<flavor>.<ext>`.
    pub fn published_file_name(&self, version: &str, extension: &str) -> String {
        format!("{}-{}.{}", version, self.name, extension)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A built and signed binary for one flavor. Read-only once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    pub flavor: Flavor,
    pub path: PathBuf,
    pub signed: bool,
}

impl ReleaseArtifact {
    pub fn signed(flavor: Flavor, path: impl Into<PathBuf>) -> Self {
        ReleaseArtifact {
            flavor,
            path: path.into(),
            signed: true,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
