// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Validate command - check pipeline configuration

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_pipeline, report};
use crate::pipeline::GraphValidator;

/// Run the validate command
pub async fn run(pipeline_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let (pipeline, registry) = match load_pipeline(&pipeline_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("  {} Failed to load pipeline", "✗".red());
            eprintln!();
            return Err(e);
        }
    };

    println!("  {} Pipeline file parsed", "✓".green());
    println!("  {} {} stage(s) registered", "✓".green(), registry.len());

    let mut validation = GraphValidator::validate_all(&registry);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", pipeline.name);
        println!("  Stages: {}", registry.len());
        for stage in registry.stages() {
            let deps = if stage.dependencies.is_empty() {
                String::new()
            } else {
                format!(" [depends: {}]", stage.dependency_names().join(", "))
            };
            println!("    - {} ({}){}", stage.name, stage.kind(), deps.dimmed());
        }
    }

    println!();

    if validation.is_valid() {
        if validation.has_warnings() {
            println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
        } else {
            println!("{}", "Pipeline is valid!".green().bold());
        }
        Ok(())
    } else {
        // Report the first error in full, with its suggestion
        Err(report(validation.errors.remove(0)))
    }
}
