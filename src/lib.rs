// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! # stagecraft - Minimal build-pipeline engine
//!
//! `stagecraft` runs named build stages in dependency order and hands each
//! stage's output directory to the stages that depend on it.
//!
//! ## Features
//!
//! - **Declarative stages** - Name, action, dependencies, one artifact directory
//! - **Validation first** - Missing dependencies, extra artifacts and cycles
//!   are reported before any stage runs
//! - **Deterministic order** - Dependencies always run before their dependents
//! - **Artifact hand-off** - Dependents find upstream output through
//!   `STAGE_<NAME>_BIN` keys in their context
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter pipeline
//! stagecraft init
//!
//! # Run every stage
//! stagecraft run
//!
//! # Run a single stage
//! stagecraft run --stage exe
//! ```
//!
//! Stages can also be declared in code:
//!
//! ```no_run
//! use std::sync::Arc;
//! use stagecraft::{ExecutionOptions, Executor, LocalArtifactStore, Stage, StageRegistry};
//!
//! # async fn demo() -> stagecraft::StagecraftResult<()> {
//! let mut registry = StageRegistry::new();
//! registry.register(Stage::from_fn("lib", |_| Ok(())).artifact("out/lib"))?;
//! registry.register(Stage::from_fn("exe", |ctx| {
//!     println!("lib is at {:?}", ctx.var("STAGE_LIB_BIN"));
//!     Ok(())
//! }).depends_on("lib"))?;
//!
//! let store = LocalArtifactStore::new(".stagecraft/artifacts");
//! Executor::new(Arc::new(store), ".")
//!     .run(&registry, &ExecutionOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod artifacts;
pub mod cli;
pub mod errors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use actions::{ShellAction, StageAction, StageContext};
pub use artifacts::{ArtifactStore, LocalArtifactStore};
pub use errors::{StagecraftError, StagecraftResult};
pub use pipeline::{
    DependencyGraph, ExecutionOptions, Executor, GraphValidator, Pipeline, RunReport, Stage,
    StageRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
