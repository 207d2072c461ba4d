//! CLI Tooling
//!
//! Walks one or more paths of a repository and prints every file path found,
//! one per line, to stdout. Diagnostics go through `tracing`.

use crate::config::{ConfigLoader, RepoWalkConfig, WalkerUri};
use crate::error::WalkError;
use crate::logging::LoggingConfig;
use crate::tree::FileNode;
use crate::walker::{FileCallback, RepoWalker};
use async_trait::async_trait;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Repowalk CLI - recursively list the files of a hosted repository
#[derive(Parser)]
#[command(name = "repowalk")]
#[command(about = "Rate-limited recursive walk over a repository contents API")]
#[command(version)]
pub struct Cli {
    /// Walker URI, e.g. walker://owner/repo?access_token=TOKEN&concurrent=true
    #[arg(long)]
    pub walker_uri: String,

    /// Repository paths to walk ("" or "/" for the root)
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<String>,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings with the command-line flags applied
    pub fn logging_config(&self, base: LoggingConfig) -> LoggingConfig {
        base.with_overrides(
            self.log_level.clone(),
            self.log_format.clone(),
            self.log_output.clone(),
            self.log_file.clone(),
            self.verbose,
        )
    }
}

/// Callback writing each file path to stdout
#[derive(Debug, Default)]
pub struct PrintPaths;

#[async_trait]
impl FileCallback for PrintPaths {
    async fn on_file(&self, _ctx: &CancellationToken, file: &FileNode) -> anyhow::Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", file.path)?;
        Ok(())
    }
}

/// Loaded settings plus the walker built from them
pub struct CliContext {
    config: RepoWalkConfig,
    walker: RepoWalker,
}

impl CliContext {
    /// Load settings (global file, optional explicit file, environment).
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<RepoWalkConfig, WalkError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_with_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(config)
    }

    /// Create a new CLI context
    pub fn new(walker_uri: &str, config: RepoWalkConfig) -> Result<Self, WalkError> {
        let uri = WalkerUri::parse(walker_uri)?;
        let walker = RepoWalker::from_uri(&uri, &config)?;
        Ok(Self { config, walker })
    }

    pub fn config(&self) -> &RepoWalkConfig {
        &self.config
    }

    pub fn walker(&self) -> &RepoWalker {
        &self.walker
    }

    /// Walk each path in order, stopping at the first failure or on cancel.
    ///
    /// Returns a one-line summary of the counters.
    pub async fn execute(
        &self,
        ctx: &CancellationToken,
        paths: &[String],
        callback: Arc<dyn FileCallback>,
    ) -> Result<String, WalkError> {
        let started = Instant::now();
        for path in paths {
            if ctx.is_cancelled() {
                break;
            }
            self.walker
                .walk_uri(ctx, path, Arc::clone(&callback))
                .await?;
        }

        let stats = self.walker.stats();
        let summary = format!(
            "{} files, {} directories, {} requests, {} rate-limit waits in {:.2}s",
            stats.files,
            stats.directories,
            stats.requests,
            stats.rate_limit_waits,
            started.elapsed().as_secs_f64()
        );
        info!(
            repo = %self.walker.repo(),
            files = stats.files,
            directories = stats.directories,
            requests = stats.requests,
            rate_limit_waits = stats.rate_limit_waits,
            cancelled = ctx.is_cancelled(),
            "Command finished"
        );
        if let Some(rate) = self.walker.last_rate_info() {
            info!(
                remaining = rate.remaining,
                limit = rate.limit,
                reset = %rate.reset,
                "Rate window"
            );
        }
        Ok(summary)
    }
}
