use clap::{Parser, Subcommand};
use git_syncer::commands::*;
use git_syncer::core::{error::GitSyncerError, print_error};
use std::env;

#[derive(Parser)]
#[command(name = "git-syncer")]
#[command(about = "Sync local changes to a hosted repository as a single commit")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload changed files and commit them onto a remote branch
    Sync(SyncArgs),
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let result = tokio::runtime::Runtime::new()
        .map_err(GitSyncerError::from)
        .and_then(|runtime| {
            runtime.block_on(async {
                match cli.command {
                    Commands::Sync(args) => execute_sync(args).await,
                }
            })
        });

    match result {
        Ok(()) => {}
        Err(e) => {
            print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
