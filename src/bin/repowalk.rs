//! Repowalk CLI Binary
//!
//! Walks the given repository paths and prints every file path found.

use clap::Parser;
use repowalk::logging::init_logging;
use repowalk::tooling::cli::{Cli, CliContext, PrintPaths};
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn main() {
    let cli = Cli::parse();

    let config = match CliContext::load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let logging = cli.logging_config(config.logging.clone());
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    let context = match CliContext::new(&cli.walker_uri, config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let ctx = CancellationToken::new();
        let interrupt = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping walk");
                interrupt.cancel();
            }
        });
        context.execute(&ctx, &cli.paths, Arc::new(PrintPaths)).await
    });

    match result {
        Ok(summary) => info!("{}", summary),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
