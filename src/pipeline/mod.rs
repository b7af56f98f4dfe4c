// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Pipeline engine
//!
//! Stage declarations, the registry holding them, graph validation and
//! ordering, and the executor running a registry end to end.

mod definition;
mod executor;
mod graph;
mod registry;
mod stage;
mod validation;

pub use definition::{ArtifactConfig, ArtifactSpec, Pipeline, StageDefinition, DEFAULT_PIPELINE_FILE};
pub use executor::{ExecutionOptions, Executor, RunReport, RunState, StageOutcome};
pub use graph::{Cycle, DependencyGraph};
pub use registry::StageRegistry;
pub use stage::{ArtifactDecl, DeclarationSite, Dependency, Stage, StageHandle};
pub use validation::{GraphValidator, ValidationReport};
