//! Building and signing one artifact per flavor.
//!
//! The driver checks its preconditions before running anything, then builds,
//! stages and signs each flavor in order. The first failure aborts the whole
//! batch, so callers never see a partial set of artifacts.

use crate::config::BuildConfig;
use crate::credentials::{Credentials, SigningCredentials};
use crate::domain::{Flavor, ReleaseArtifact};
use crate::error::{ReleaseError, Result};
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Environment variable pointing at the Android SDK
pub const ANDROID_HOME: &str = "ANDROID_HOME";
/// Overrides the configured build-tools version when set
pub const BUILD_TOOLS_VERSION: &str = "BUILD_TOOLS_VERSION";

/// Produces an unsigned artifact for a flavor
pub trait BuildExecutor {
    /// Build `flavor` and return the path of the unsigned output
    fn assemble(&self, flavor: &Flavor) -> Result<PathBuf>;
}

/// Signs a staged artifact
pub trait ArtifactSigner {
    /// Fail early when signing cannot work in this environment
    fn check(&self) -> Result<()> {
        Ok(())
    }

    fn sign(&self, input: &Path, output: &Path, credentials: &SigningCredentials) -> Result<()>;
}

/// Runs the Gradle wrapper in the workspace
pub struct GradleBuilder {
    workspace: PathBuf,
    wrapper: PathBuf,
}

impl GradleBuilder {
    pub fn new(workspace: impl Into<PathBuf>, config: &BuildConfig) -> Self {
        let workspace = workspace.into();
        let wrapper = workspace.join(&config.gradle_wrapper);
        GradleBuilder { workspace, wrapper }
    }

    /// Where Gradle leaves the release output for `flavor`
    pub fn output_path(&self, flavor: &Flavor) -> PathBuf {
        self.workspace
            .join("app")
            .join("build")
            .join("outputs")
            .join("apk")
            .join(&flavor.name)
            .join("release")
            .join("app.apk")
    }
}

impl BuildExecutor for GradleBuilder {
    fn assemble(&self, flavor: &Flavor) -> Result<PathBuf> {
        if !self.wrapper.is_file() {
            return Err(ReleaseError::precondition(format!(
                "Gradle wrapper not found: {}",
                self.wrapper.display()
            )));
        }

        let task = flavor.assemble_task();
        info!(flavor = %flavor, task = %task, "building");

        let mut cmd = Command::new(&self.wrapper);
        cmd.arg(&task).current_dir(&self.workspace);
        run_streaming(&mut cmd, "gradle")
            .map_err(|e| ReleaseError::build(format!("{} ({}): {}", flavor, task, e)))?;

        let output = self.output_path(flavor);
        if !output.is_file() {
            return Err(ReleaseError::build(format!(
                "{} produced no output at {}",
                task,
                output.display()
            )));
        }
        Ok(output)
    }
}

/// Signs with the SDK's `apksigner` and the workspace keystore
#[derive(Debug)]
pub struct ApkSigner {
    /// `None` when no SDK location is known
    apksigner: Option<PathBuf>,
    keystore: PathBuf,
}

impl ApkSigner {
    /// Locate `apksigner` under `android_home`.
    ///
    /// A missing SDK location surfaces as a precondition failure from
    /// [`ArtifactSigner::check`].
    pub fn new(
        android_home: Option<PathBuf>,
        build_tools_version: &str,
        keystore: impl Into<PathBuf>,
    ) -> Self {
        ApkSigner {
            apksigner: android_home.map(|home| {
                home.join("build-tools")
                    .join(build_tools_version)
                    .join("apksigner")
            }),
            keystore: keystore.into(),
        }
    }

    /// Resolve the SDK location and build-tools version from the environment.
    pub fn from_env(workspace: &Path, config: &BuildConfig) -> Self {
        let android_home = std::env::var_os(ANDROID_HOME)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let version = std::env::var(BUILD_TOOLS_VERSION)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| config.build_tools_version.clone());

        Self::new(android_home, &version, workspace.join(&config.keystore))
    }

    pub fn apksigner(&self) -> Result<&Path> {
        self.apksigner.as_deref().ok_or_else(|| {
            ReleaseError::precondition(format!("{} is not set", ANDROID_HOME))
        })
    }
}

impl ArtifactSigner for ApkSigner {
    fn check(&self) -> Result<()> {
        self.apksigner().map(|_| ())
    }

    fn sign(&self, input: &Path, output: &Path, credentials: &SigningCredentials) -> Result<()> {
        let apksigner = self.apksigner()?;
        debug!(input = %input.display(), output = %output.display(), "signing");

        let result = Command::new(apksigner)
            .arg("sign")
            .arg("--ks")
            .arg(&self.keystore)
            .arg("--ks-key-alias")
            .arg(credentials.alias())
            .arg("--ks-pass")
            .arg(format!("pass:{}", credentials.password()))
            .arg("--key-pass")
            .arg(format!("pass:{}", credentials.password()))
            .arg("--out")
            .arg(output)
            .arg(input)
            .output()
            .map_err(|e| {
                ReleaseError::sign(format!("Failed to run {}: {}", apksigner.display(), e))
            })?;

        if !result.status.success() {
            return Err(ReleaseError::sign(format!(
                "{} exited with code {}\nStderr: {}",
                input.display(),
                result.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&result.stderr)
            )));
        }

        Ok(())
    }
}

/// Run a command, forwarding each output line to the log.
fn run_streaming(cmd: &mut Command, source: &str) -> std::io::Result<()> {
    let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    std::thread::scope(|scope| {
        if let Some(stderr) = stderr {
            scope.spawn(move || forward_lines(stderr, source, true));
        }
        if let Some(stdout) = stdout {
            forward_lines(stdout, source, false);
        }
    });

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("exited with code {}", status.code().unwrap_or(-1)),
        ))
    }
}

fn forward_lines(stream: impl Read, source: &str, is_stderr: bool) {
    for line in BufReader::new(stream).lines().map_while(|l| l.ok()) {
        if is_stderr {
            warn!(target: "flavor_release::build::output", source, "{}", line);
        } else {
            info!(target: "flavor_release::build::output", source, "{}", line);
        }
    }
}

/// Builds, stages and signs every flavor.
pub struct BuildDriver<'a> {
    builder: &'a dyn BuildExecutor,
    signer: &'a dyn ArtifactSigner,
    credentials: &'a Credentials,
    keystore: PathBuf,
    staging_dir: PathBuf,
    extension: String,
}

impl<'a> BuildDriver<'a> {
    pub fn new(
        builder: &'a dyn BuildExecutor,
        signer: &'a dyn ArtifactSigner,
        credentials: &'a Credentials,
        workspace: &Path,
        config: &BuildConfig,
    ) -> Self {
        BuildDriver {
            builder,
            signer,
            credentials,
            keystore: workspace.join(&config.keystore),
            staging_dir: workspace.join(&config.dist_dir),
            extension: config.artifact_extension.clone(),
        }
    }

    /// Fail before any build runs if signing cannot succeed.
    pub fn check_preconditions(&self) -> Result<SigningCredentials> {
        let signing = self.credentials.signing()?;
        self.signer.check()?;
        if !self.keystore.is_file() {
            return Err(ReleaseError::precondition(format!(
                "Keystore not found: {}",
                self.keystore.display()
            )));
        }
        Ok(signing)
    }

    pub fn build_and_sign(&self, flavors: &[Flavor]) -> Result<Vec<ReleaseArtifact>> {
        let signing = self.check_preconditions()?;
        fs::create_dir_all(&self.staging_dir)?;

        let mut artifacts = Vec::with_capacity(flavors.len());
        for flavor in flavors {
            let built = self.builder.assemble(flavor)?;

            let staged = self
                .staging_dir
                .join(flavor.unsigned_file_name(&self.extension));
            fs::copy(&built, &staged).map_err(|e| {
                ReleaseError::build(format!(
                    "Cannot stage {} to {}: {}",
                    built.display(),
                    staged.display(),
                    e
                ))
            })?;

            let signed = self
                .staging_dir
                .join(flavor.signed_file_name(&self.extension));
            self.signer.sign(&staged, &signed, &signing)?;
            if !signed.is_file() {
                return Err(ReleaseError::sign(format!(
                    "No signed output at {}",
                    signed.display()
                )));
            }

            info!(flavor = %flavor, artifact = %signed.display(), "signed");
            artifacts.push(ReleaseArtifact::signed(flavor.clone(), signed));
        }

        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{SIGN_ALIAS, SIGN_PASSWORD};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeBuilder {
        out_dir: PathBuf,
        fail_on: Option<&'static str>,
        built: Mutex<Vec<String>>,
    }

    impl FakeBuilder {
        fn new(out_dir: &Path) -> Self {
            FakeBuilder {
                out_dir: out_dir.to_path_buf(),
                fail_on: None,
                built: Mutex::new(Vec::new()),
            }
        }
    }

    impl BuildExecutor for FakeBuilder {
        fn assemble(&self, flavor: &Flavor) -> Result<PathBuf> {
            self.built.lock().unwrap().push(flavor.name.clone());
            if self.fail_on == Some(flavor.name.as_str()) {
                return Err(ReleaseError::build(format!("{} broke", flavor)));
            }
            let path = self.out_dir.join(format!("{}.apk", flavor.name));
            fs::write(&path, format!("unsigned {}", flavor)).unwrap();
            Ok(path)
        }
    }

    #[derive(Default)]
    struct CopySigner {
        aliases: Mutex<Vec<String>>,
    }

    impl ArtifactSigner for CopySigner {
        fn sign(&self, input: &Path, output: &Path, credentials: &SigningCredentials) -> Result<()> {
            self.aliases
                .lock()
                .unwrap()
                .push(credentials.alias().to_string());
            fs::copy(input, output)?;
            Ok(())
        }
    }

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let keystore = dir.path().join(".github/workflows/key");
        fs::create_dir_all(keystore.parent().unwrap()).unwrap();
        fs::write(keystore, b"keystore").unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();
        dir
    }

    fn credentials() -> Credentials {
        Credentials::default()
            .with(SIGN_ALIAS, "release")
            .with(SIGN_PASSWORD, "hunter2")
    }

    fn flavors() -> Vec<Flavor> {
        vec![Flavor::new("lsposed"), Flavor::new("lspatch")]
    }

    #[test]
    fn test_build_and_sign_each_flavor() {
        let ws = workspace();
        let builder = FakeBuilder::new(&ws.path().join("out"));
        let signer = CopySigner::default();
        let creds = credentials();
        let driver = BuildDriver::new(&builder, &signer, &creds, ws.path(), &BuildConfig::default());

        let artifacts = driver.build_and_sign(&flavors()).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].file_name(), "app-lsposed-signed.apk");
        assert_eq!(artifacts[1].file_name(), "app-lspatch-signed.apk");
        assert!(artifacts.iter().all(|a| a.signed && a.path.is_file()));
        assert!(ws.path().join("dist/app-lsposed.apk").is_file());
        assert_eq!(*signer.aliases.lock().unwrap(), vec!["release", "release"]);
    }

    #[test]
    fn test_missing_credentials_fail_before_build() {
        let ws = workspace();
        let builder = FakeBuilder::new(&ws.path().join("out"));
        let signer = CopySigner::default();
        let creds = Credentials::default().with(SIGN_ALIAS, "release");
        let driver = BuildDriver::new(&builder, &signer, &creds, ws.path(), &BuildConfig::default());

        let err = driver.build_and_sign(&flavors()).unwrap_err();

        assert!(matches!(err, ReleaseError::Credential(ref name) if name == SIGN_PASSWORD));
        assert!(builder.built.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_keystore_is_precondition() {
        let ws = TempDir::new().unwrap();
        let builder = FakeBuilder::new(ws.path());
        let signer = CopySigner::default();
        let creds = credentials();
        let driver = BuildDriver::new(&builder, &signer, &creds, ws.path(), &BuildConfig::default());

        let err = driver.build_and_sign(&flavors()).unwrap_err();

        assert!(err.is_precondition());
        assert!(builder.built.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_aborts_remaining_flavors() {
        let ws = workspace();
        let mut builder = FakeBuilder::new(&ws.path().join("out"));
        builder.fail_on = Some("lsposed");
        let signer = CopySigner::default();
        let creds = credentials();
        let driver = BuildDriver::new(&builder, &signer, &creds, ws.path(), &BuildConfig::default());

        let err = driver.build_and_sign(&flavors()).unwrap_err();

        assert!(matches!(err, ReleaseError::Build(_)));
        assert_eq!(*builder.built.lock().unwrap(), vec!["lsposed"]);
        assert!(signer.aliases.lock().unwrap().is_empty());
    }

    #[test]
    fn test_signer_requires_android_home() {
        let signer = ApkSigner::new(None, "29.0.3", "key");
        let err = signer.check().unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains(ANDROID_HOME));
    }

    #[test]
    fn test_driver_checks_signer_before_build() {
        let ws = workspace();
        let builder = FakeBuilder::new(&ws.path().join("out"));
        let signer = ApkSigner::new(None, "29.0.3", ws.path().join(".github/workflows/key"));
        let creds = credentials();
        let driver = BuildDriver::new(&builder, &signer, &creds, ws.path(), &BuildConfig::default());

        assert!(driver.build_and_sign(&flavors()).unwrap_err().is_precondition());
        assert!(builder.built.lock().unwrap().is_empty());
    }

    #[test]
    fn test_signer_path_uses_build_tools_version() {
        let signer = ApkSigner::new(Some(PathBuf::from("/sdk")), "34.0.0", "key");
        assert_eq!(
            signer.apksigner().unwrap(),
            Path::new("/sdk/build-tools/34.0.0/apksigner")
        );
    }

    #[test]
    fn test_gradle_output_path() {
        let builder = GradleBuilder::new("/ws", &BuildConfig::default());
        assert_eq!(
            builder.output_path(&Flavor::new("lspatch")),
            Path::new("/ws/app/build/outputs/apk/lspatch/release/app.apk")
        );
    }

    #[test]
    fn test_missing_gradle_wrapper() {
        let ws = TempDir::new().unwrap();
        let builder = GradleBuilder::new(ws.path(), &BuildConfig::default());
        let err = builder.assemble(&Flavor::new("lsposed")).unwrap_err();
        assert!(err.is_precondition());
    }
}
