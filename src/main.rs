mod annotation;
mod builder;
mod checks;
mod driver;
mod outputs;
mod pusher;
mod report;
mod workflow;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::builder::AnnotationBuilder;
use crate::checks::GitHubChecks;
use crate::driver::Driver;
use crate::pusher::AnnotationPusher;
use crate::workflow::WorkflowCommands;

/// CLI arguments for sarif-annotate execution.
#[derive(Parser, Debug)]
#[command(
    name = "sarif-annotate",
    about = "Publish SARIF findings as commit check-run annotations.",
    version
)]
struct Cli {
    /// Path to the SARIF report produced by the analyzer.
    #[arg(long, value_name = "PATH")]
    report: PathBuf,
    /// Annotate only files listed in --changed-files.
    #[arg(long)]
    only_changed_files: bool,
    /// Space-separated list of changed file paths.
    #[arg(long, value_name = "PATHS", default_value = "")]
    changed_files: String,
    #[arg(long, value_name = "OWNER/REPO", env = "GITHUB_REPOSITORY")]
    repository: String,
    #[arg(long, value_name = "SHA", env = "GITHUB_SHA")]
    head_sha: String,
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,
    #[arg(long, value_name = "PATH", env = "GITHUB_WORKSPACE", default_value = "")]
    workspace: String,
    #[arg(
        long,
        value_name = "URL",
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com"
    )]
    api_url: String,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging();
    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let report = report::load_report(&cli.report)?;
    let Some(data) = report::violation_data(&report)? else {
        return Ok(());
    };

    let driver: Driver = data.driver_name.parse()?;
    let builder = AnnotationBuilder::new(
        driver,
        data.rules,
        data.results,
        cli.only_changed_files,
        clean_changed_files(&cli.changed_files),
        &cli.workspace,
    );
    let annotations = builder.build();
    if annotations.is_empty() {
        info!("there are no violations to publish");
        return Ok(());
    }

    let (owner, repo) = split_repository(&cli.repository)?;
    let service = GitHubChecks::new(&cli.api_url, owner, repo, &cli.head_sha, &cli.token)?;
    let mut pusher = AnnotationPusher::new(driver, &cli.head_sha, annotations);
    match pusher.publish_as_check(&service) {
        Ok(()) => info!("published violations as a check-run"),
        Err(err) => {
            info!("check-run publishing failed ({err:#}), falling back to plain annotations");
            pusher.publish_as_annotations(&mut WorkflowCommands::stdout());
        }
    }
    outputs::specify_outputs(pusher.counter())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Split the space-separated changed-file list, stripping one leading `/` or
/// `./` from each entry so paths compare against normalized report paths.
fn clean_changed_files(changed_files: &str) -> Vec<String> {
    changed_files
        .split_whitespace()
        .map(|file| {
            file.strip_prefix('/')
                .or_else(|| file.strip_prefix("./"))
                .unwrap_or(file)
                .to_string()
        })
        .collect()
}

fn split_repository(repository: &str) -> Result<(&str, &str)> {
    repository
        .split_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        .with_context(|| format!("invalid repository '{repository}', expected OWNER/REPO"))
}
