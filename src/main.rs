// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! stagecraft - Minimal build-pipeline engine
//!
//! Run build stages in dependency order and hand their artifacts downstream.

use clap::Parser;
use miette::Result;

use stagecraft::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    stagecraft::utils::init_tracing(cli.verbose);

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Init { force } => stagecraft::cli::init::run(force, cli.verbose).await,
        Commands::Run {
            pipeline,
            stage,
            show_dep_tree,
            dry_run,
            artifact_root,
        } => {
            stagecraft::cli::run::run(
                pipeline,
                stage,
                show_dep_tree,
                dry_run,
                artifact_root,
                cli.verbose,
            )
            .await
        }
        Commands::Validate { pipeline } => {
            stagecraft::cli::validate::run(pipeline, cli.verbose).await
        }
        Commands::Graph { pipeline, format } => {
            stagecraft::cli::graph::run(pipeline, format, cli.verbose).await
        }
        Commands::Artifacts {
            action,
            pipeline,
            artifact_root,
        } => stagecraft::cli::artifacts::run(action, pipeline, artifact_root, cli.verbose).await,
    }
}
