// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Artifacts command - inspect and clean the artifact store

use colored::Colorize;
use miette::Result;
use std::io::{self, Write};
use std::path::PathBuf;

use super::{artifact_root, report, ArtifactAction};
use crate::artifacts::{format_size, ArtifactStore, LocalArtifactStore};
use crate::pipeline::Pipeline;

/// Run the artifacts command
pub async fn run(
    action: ArtifactAction,
    pipeline_path: PathBuf,
    root_override: Option<PathBuf>,
    _verbose: bool,
) -> Result<()> {
    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    // The pipeline file is optional here; without one the default root is used
    let pipeline = if pipeline_path.exists() {
        Some(Pipeline::from_file(&pipeline_path).map_err(report)?)
    } else {
        None
    };

    let root = artifact_root(&working_dir, pipeline.as_ref(), root_override.as_deref());
    let store = LocalArtifactStore::new(root.clone());

    match action {
        ArtifactAction::List => {
            let records = store.list().await.map_err(report)?;

            println!("{}", "Stored Artifacts".bold());
            println!("{}", "═".repeat(40));
            println!("  Location: {}", root.display());

            if records.is_empty() {
                println!("{}", "  No artifacts stored.".dimmed());
                return Ok(());
            }

            println!();
            for record in &records {
                let age = record
                    .saved_at
                    .elapsed()
                    .map(|d| format!(", {} ago", format_duration(d)))
                    .unwrap_or_default();
                println!(
                    "  {} {} file(s), {}{}",
                    format!("{:<16}", record.stage).cyan(),
                    record.files,
                    format_size(record.size_bytes),
                    age.dimmed()
                );
            }

            let stats = store.stats().await.map_err(report)?;
            println!();
            println!("  {} artifact(s) ({})", stats.entries, stats.formatted_size());

            Ok(())
        }

        ArtifactAction::Path { stage } => {
            println!("{}", store.locate(&stage).display());
            Ok(())
        }

        ArtifactAction::Clear { stage, yes } => {
            let stats = store.stats().await.map_err(report)?;

            if stats.entries == 0 {
                println!("{}", "Artifact store is already empty.".dimmed());
                return Ok(());
            }

            let what = match stage {
                Some(ref name) => format!("the artifact of '{}'", name),
                None => format!("{} artifact(s) ({})", stats.entries, stats.formatted_size()),
            };

            if !yes {
                print!("Delete {}? [y/N] ", what);
                io::stdout().flush().ok();

                let mut input = String::new();
                io::stdin().read_line(&mut input).ok();

                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("{}", "Cancelled.".dimmed());
                    return Ok(());
                }
            }

            match stage {
                Some(name) => store.remove(&name).await.map_err(report)?,
                None => store.clear().await.map_err(report)?,
            }
            println!("{} {}", "Deleted".green(), what);

            Ok(())
        }
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}
