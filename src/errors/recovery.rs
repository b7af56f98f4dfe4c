// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use std::path::Path;

use crate::pipeline::DeclarationSite;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest fixing a reference to a stage that was never registered
    pub fn fix_missing_dependency(stage: &str, dependency: &str, site: &DeclarationSite) -> Self {
        Self {
            action: format!("Declare stage '{}' or drop the reference", dependency),
            steps: vec![
                format!("Stage '{}' refers to '{}' at {}", stage, dependency, site),
                "Dependency names are matched exactly, including case".into(),
            ],
            commands: vec![
                "# List registered stages:".into(),
                "stagecraft validate --verbose".into(),
            ],
        }
    }

    /// Suggest collapsing several artifact declarations into one
    pub fn single_artifact(stage: &str, count: usize) -> Self {
        Self {
            action: format!("Keep one artifact directory on stage '{}'", stage),
            steps: vec![
                format!("Stage '{}' declares {} artifact directories", stage, count),
                "Move the outputs under a common directory and declare that one".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(stages: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Detected cycle: {}", stages.join(" → ")),
                "Review your stage dependencies".into(),
                "Ensure stages form a directed acyclic graph (DAG)".into(),
            ],
            commands: vec![
                "# Visualize your pipeline:".into(),
                "stagecraft graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest creating the declared output directory
    pub fn fix_missing_artifact(stage: &str, path: &Path) -> Self {
        Self {
            action: format!("Produce '{}' from stage '{}'", path.display(), stage),
            steps: vec![
                "The artifact directory is copied after the stage succeeds".into(),
                "Check the stage writes its output to the declared directory".into(),
            ],
            commands: vec![
                "# Re-run just this stage:".into(),
                format!("stagecraft run --stage {}", stage),
            ],
        }
    }

    /// Suggest creating a pipeline file
    pub fn create_pipeline() -> Self {
        Self {
            action: "Create a pipeline configuration".into(),
            steps: vec![
                "No stagecraft.yaml found in current directory".into(),
                "Initialize a new project or create the file manually".into(),
            ],
            commands: vec!["# Write a starter pipeline:".into(), "stagecraft init".into()],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
