// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Run command - execute the pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{executor_for, load_pipeline, print_dependency_tree, report};
use crate::artifacts::format_size;
use crate::pipeline::{ExecutionOptions, GraphValidator};

/// Run the pipeline
pub async fn run(
    pipeline_path: PathBuf,
    stage: Option<String>,
    show_dep_tree: bool,
    dry_run: bool,
    artifact_root: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let (pipeline, registry) = load_pipeline(&pipeline_path)?;

    if show_dep_tree {
        GraphValidator::validate(&registry).map_err(report)?;
        print_dependency_tree(&registry);
    }

    if verbose {
        let validation = GraphValidator::validate_all(&registry);
        if validation.has_warnings() {
            eprintln!("{}", "Pipeline warnings:".yellow().bold());
            for warning in &validation.warnings {
                eprintln!("  {} {}", "⚠".yellow(), warning);
            }
            eprintln!();
        }
    }

    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    let executor = executor_for(&pipeline, &working_dir, artifact_root.as_deref());

    let options = ExecutionOptions {
        target: stage,
        dry_run,
        progress: true,
    };

    println!("{} {}", "Running pipeline:".bold(), pipeline.name.cyan());
    println!();

    let result = executor.run(&registry, &options).await.map_err(report)?;

    if dry_run {
        println!("{}", "Execution order (dry run):".bold());
        for (i, name) in result.order.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
        return Ok(());
    }

    println!();
    println!(
        "{} {} stage(s) in {:.2}s",
        "✓".green(),
        result.outcomes.len(),
        result.duration.as_secs_f64()
    );

    let artifacts: Vec<_> = result
        .outcomes
        .iter()
        .filter_map(|o| o.artifact.as_ref().map(|a| (&o.stage, a)))
        .collect();

    if !artifacts.is_empty() {
        println!();
        println!("{}:", "Artifacts".bold());
        for (stage, location) in artifacts {
            let size = match executor.store().record(stage).await {
                Ok(Some(record)) => format!(" ({})", format_size(record.size_bytes)),
                _ => String::new(),
            };
            println!("  - {} -> {}{}", stage, location.display(), size.dimmed());
        }
    }

    Ok(())
}
