//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use retemplate::context::CONFIG_FILE;
use retemplate::git::Git;
use retemplate::output::OutputConfig;
use retemplate::pipeline::{BranchRequest, Pipeline, RunOptions};
use retemplate::render::CookiecutterCli;
use retemplate::snapshot::SnapshotStore;

/// Retemplate - Checkout repos to current cookiecutter config
#[derive(Parser, Debug)]
#[command(name = "retemplate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to cookiecutter template dir
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Repos to run cookiecutter over
    #[arg(value_name = "REPOS")]
    repos: Vec<PathBuf>,

    /// Accept pre/post hooks
    #[arg(short = 'a', long)]
    accept_hooks: bool,

    /// Clean up backups from previous runs
    #[arg(short = 'c', long)]
    gc: bool,

    /// Checkout new branch from existing revision
    #[arg(short = 'b', long, value_name = "REV,NEW")]
    branch: Option<String>,

    /// Comma separated list of paths to ignore, cookiecutter vars are
    /// allowed
    #[arg(short = 'i', long, value_name = "LIST", value_delimiter = ',')]
    ignore: Vec<PathBuf>,

    /// Root directory for archived repository snapshots
    #[arg(long, value_name = "DIR", env = "RETEMPLATE_CACHE")]
    cache_root: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .init();
        let out = OutputConfig::from_env_and_flag(&self.color);

        let config = self.path.join(CONFIG_FILE);
        if !config.is_file() {
            anyhow::bail!("template config not found: {}", config.display());
        }

        let branch = self.branch.as_deref().map(parse_branch).transpose()?;
        let opts = RunOptions {
            accept_hooks: self.accept_hooks,
            gc: self.gc,
            branch,
            ignore: self.ignore,
        };

        let store = SnapshotStore::new(
            self.cache_root
                .unwrap_or_else(SnapshotStore::default_root),
        );
        let git = Git::new();
        let renderer = CookiecutterCli;

        Pipeline::new(&git, &renderer, &store, &out, opts).run(&self.path, &self.repos)?;
        Ok(())
    }
}

/// Parse the `REV,NEW` argument of `--branch`.
fn parse_branch(spec: &str) -> Result<BranchRequest> {
    match spec.split_once(',') {
        Some((rev, new_branch)) if !rev.is_empty() && !new_branch.is_empty() => {
            Ok(BranchRequest {
                rev: rev.to_string(),
                new_branch: new_branch.to_string(),
            })
        }
        _ => anyhow::bail!("--branch expects REV,NEW (got {spec:?})"),
    }
}
