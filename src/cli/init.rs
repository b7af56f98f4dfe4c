// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Init command - write a starter pipeline

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::pipeline::DEFAULT_PIPELINE_FILE;

/// Run the init command
pub async fn run(force: bool, verbose: bool) -> Result<()> {
    let project_name = std::env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_else(|| "my-project".to_string());

    println!("{}", "Initializing stagecraft pipeline...".bold());
    println!();

    if Path::new(DEFAULT_PIPELINE_FILE).exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            DEFAULT_PIPELINE_FILE
        ));
    }

    let pipeline_content = generate_template(&project_name);

    std::fs::write(DEFAULT_PIPELINE_FILE, &pipeline_content).map_err(|e| {
        miette::miette!("Failed to write {}: {}", DEFAULT_PIPELINE_FILE, e)
    })?;

    println!("  {} Created {}", "✓".green(), DEFAULT_PIPELINE_FILE);

    println!();
    println!("{}", "Pipeline initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to describe your stages", DEFAULT_PIPELINE_FILE.cyan());
    println!("  2. Run {} to check it", "stagecraft validate".cyan());
    println!("  3. Run {} to build everything", "stagecraft run".cyan());
    println!();

    if verbose {
        println!("{}", "Generated pipeline:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", pipeline_content.dimmed());
    }

    Ok(())
}

/// Three-stage library/executable pipeline
pub fn generate_template(name: &str) -> String {
    format!(
        r#"# stagecraft pipeline configuration

version: "1"
name: "{name}"

artifacts:
  root: .stagecraft/artifacts

stages:
  - name: lib
    description: "Static library"
    run: |
      mkdir -p out/lib
      echo "lib" > out/lib/liblib.a
    artifact: out/lib

  - name: lib_dyn
    description: "Shared library, linked against lib"
    run: |
      mkdir -p out/lib_dyn
      cat "$STAGE_LIB_BIN/liblib.a" > out/lib_dyn/liblib_dyn.so
      echo "lib_dyn" >> out/lib_dyn/liblib_dyn.so
    depends_on: [lib]
    artifact: out/lib_dyn

  - name: exe
    description: "Executable, linked against both libraries"
    run: |
      mkdir -p out/exe
      cat "$STAGE_LIB_BIN/liblib.a" "$STAGE_LIB_DYN_BIN/liblib_dyn.so" > out/exe/app
    depends_on:
      - lib
      - lib_dyn
    artifact: out/exe
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{GraphValidator, Pipeline};

    #[test]
    fn test_template_is_valid() {
        let pipeline = Pipeline::from_yaml(&generate_template("demo")).unwrap();
        assert_eq!(pipeline.name, "demo");

        let registry = pipeline.to_registry(Path::new(DEFAULT_PIPELINE_FILE)).unwrap();
        assert!(GraphValidator::validate_all(&registry).is_valid());

        let order = GraphValidator::build_graph(&registry)
            .topological_order()
            .unwrap();
        assert_eq!(order, vec!["lib", "lib_dyn", "exe"]);
    }
}
