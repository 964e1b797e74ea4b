use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use flavor_release::build::{ApkSigner, GradleBuilder};
use flavor_release::config;
use flavor_release::credentials::{
    Credentials, FORUM_TOKEN, GITHUB_TOKEN, MESSAGING_TOKEN, STORAGE_TOKEN,
};
use flavor_release::git::Git2Repository;
use flavor_release::pipeline::{Pipeline, RunOptions, RunOutcome};
use flavor_release::publish::{
    http_client, AlistStorage, FlarumForum, GitHubReleases, PublishCoordinator, TelegramMessenger,
};
use flavor_release::{telemetry, ui};

#[derive(clap::Parser)]
#[command(
    name = "flavor-release",
    version,
    about = "Build, sign and publish a channel release of every app flavor"
)]
struct Args {
    #[arg(long, env = "CHANNEL", help = "Release channel, e.g. stable or canary")]
    channel: Option<String>,

    #[arg(long, env = "GITHUB_REPOSITORY", help = "Repository as owner/name")]
    repo: Option<String>,

    #[arg(long, env = "GITHUB_WORKSPACE", help = "Workspace root (defaults to the current directory)")]
    workspace: Option<PathBuf>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Render the changelog into dist without building or publishing")]
    dry_run: bool,

    #[arg(long, help = "Tag HEAD with the new version and push the tag before publishing")]
    tag: bool,

    #[arg(long, help = "Emit JSON log lines")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    telemetry::init_tracing(args.json_logs, telemetry::level_for(args.verbose));

    match run(args) {
        Ok(outcome) => ui::display_outcome(&outcome),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<RunOutcome> {
    let workspace = match args.workspace {
        Some(path) => path,
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };

    let mut config = config::load_config(args.config.as_deref(), &workspace)
        .context("Error loading config")?;
    if let Some(repo) = args.repo {
        config.release.repo = repo;
    }
    let channel = args
        .channel
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| config.release.channel.clone());

    let credentials = Credentials::from_env();

    let mut history = Git2Repository::open(&workspace)
        .with_context(|| format!("No git repository at {}", workspace.display()))?;
    if let Ok(token) = credentials.require(GITHUB_TOKEN) {
        history = history.with_push_token(token);
    }

    let client = http_client(Duration::from_secs(config.behavior.upload_timeout_secs))?;
    let release_host = GitHubReleases::new(
        client.clone(),
        &config.github,
        config.release.repo.clone(),
        credentials.secret_or_empty(GITHUB_TOKEN),
    );
    let store = AlistStorage::new(
        client.clone(),
        &config.storage,
        credentials.secret_or_empty(STORAGE_TOKEN),
    );
    let messenger = TelegramMessenger::new(
        client.clone(),
        &config.messaging,
        credentials.secret_or_empty(MESSAGING_TOKEN),
    );
    let forum = FlarumForum::new(client, &config.forum, credentials.secret_or_empty(FORUM_TOKEN));
    let publisher = PublishCoordinator::new(
        &release_host,
        &store,
        &messenger,
        &forum,
        config.changelog.max_caption_chars,
    );

    let builder = GradleBuilder::new(&workspace, &config.build);
    let signer = ApkSigner::from_env(&workspace, &config.build);

    let options = RunOptions {
        channel,
        dry_run: args.dry_run,
        push_tag: args.tag || config.behavior.push_tag,
        now: chrono::Local::now().naive_local(),
    };

    let pipeline = Pipeline::new(
        &config,
        &workspace,
        &history,
        &credentials,
        &builder,
        &signer,
        publisher,
    );
    Ok(pipeline.run(&options)?)
}
