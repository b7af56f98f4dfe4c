// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Registry validation
//!
//! Validates declared dependencies and artifacts before anything runs.

use std::collections::HashSet;

use crate::errors::{StagecraftError, StagecraftResult};
use crate::pipeline::{DependencyGraph, Stage, StageRegistry};

/// Registry validator
pub struct GraphValidator;

impl GraphValidator {
    /// Check the whole registry, failing on the first violation
    ///
    /// Dependency references of every stage are checked before artifact
    /// cardinality, so an unknown dependency wins over a second artifact.
    pub fn validate(registry: &StageRegistry) -> StagecraftResult<()> {
        for stage in registry.stages() {
            if let Some(err) = Self::check_dependencies(stage, registry).into_iter().next() {
                return Err(err);
            }
        }

        for stage in registry.stages() {
            Self::check_artifacts(stage)?;
        }

        Ok(())
    }

    /// Collect every violation, cycles included, plus warnings
    pub fn validate_all(registry: &StageRegistry) -> ValidationReport {
        let mut report = ValidationReport::new();

        if registry.is_empty() {
            report.add_warning("Pipeline has no stages defined");
        }

        for stage in registry.stages() {
            report.errors.extend(Self::check_dependencies(stage, registry));

            let mut seen = HashSet::new();
            for dep in &stage.dependencies {
                if !seen.insert(dep.name.as_str()) {
                    report.add_warning(&format!(
                        "Stage '{}' declares dependency '{}' more than once (again at {})",
                        stage.name, dep.name, dep.site
                    ));
                }
            }
        }

        for stage in registry.stages() {
            if let Err(e) = Self::check_artifacts(stage) {
                report.errors.push(e);
            }
        }

        // Only resolvable edges go into the graph; dangling ones are reported above
        if let Err(e) = Self::build_graph(registry).topological_order() {
            report.errors.push(StagecraftError::CycleDetected {
                stages: e.members,
            });
        }

        report
    }

    /// Build the dependency graph over registered stages
    ///
    /// Nodes follow registration order and edges follow declaration order.
    /// References to unregistered stages are skipped.
    pub fn build_graph(registry: &StageRegistry) -> DependencyGraph<String> {
        let mut graph = DependencyGraph::with_nodes(registry.names().into_iter().map(String::from));

        for stage in registry.stages() {
            for dep in &stage.dependencies {
                if registry.contains(&dep.name) {
                    graph.add_edge(stage.name.clone(), dep.name.clone());
                }
            }
        }

        graph
    }

    fn check_dependencies(stage: &Stage, registry: &StageRegistry) -> Vec<StagecraftError> {
        stage
            .dependencies
            .iter()
            .filter(|dep| !registry.contains(&dep.name))
            .map(|dep| StagecraftError::DependencyNotFound {
                stage: stage.name.clone(),
                dependency: dep.name.clone(),
                site: dep.site.clone(),
            })
            .collect()
    }

    fn check_artifacts(stage: &Stage) -> StagecraftResult<()> {
        if stage.artifacts.len() > 1 {
            return Err(StagecraftError::TooManyArtifacts {
                stage: stage.name.clone(),
                count: stage.artifacts.len(),
            });
        }

        Ok(())
    }
}

/// Result of a full validation pass
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<StagecraftError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
