// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Graph command - visualize pipeline as a graph

use miette::Result;
use std::path::PathBuf;

use super::{load_pipeline, report, GraphFormat};
use crate::errors::StagecraftError;
use crate::pipeline::{GraphValidator, StageRegistry};

/// Run the graph command
pub async fn run(pipeline_path: PathBuf, format: GraphFormat, _verbose: bool) -> Result<()> {
    let (_, registry) = load_pipeline(&pipeline_path)?;

    GraphValidator::validate(&registry).map_err(report)?;
    let graph = GraphValidator::build_graph(&registry);

    let output = match format {
        GraphFormat::Text => {
            let order = graph
                .topological_order()
                .map_err(|cycle| {
                    report(StagecraftError::CycleDetected {
                        stages: cycle.members,
                    })
                })?;
            execution_table(&registry, &order)
        }
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}

/// Numbered execution order with each stage's dependencies
pub fn execution_table(registry: &StageRegistry, order: &[String]) -> String {
    let mut out = String::from("Execution order:\n");

    for (i, name) in order.iter().enumerate() {
        let Ok(stage) = registry.get(name) else {
            continue;
        };

        out.push_str(&format!("  {}. {} ({})", i + 1, name, stage.kind()));
        if !stage.dependencies.is_empty() {
            out.push_str(&format!(" [depends: {}]", stage.dependency_names().join(", ")));
        }
        if let Some(decl) = stage.artifact_decl() {
            out.push_str(&format!(" -> {}", decl.directory.display()));
        }
        out.push('\n');
    }

    out
}
