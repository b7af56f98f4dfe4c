// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Entry point for programs that declare their stages in code
//!
//! ```no_run
//! use stagecraft::{Stage, StageRegistry};
//!
//! fn main() -> miette::Result<()> {
//!     let mut registry = StageRegistry::new();
//!     registry.register(Stage::from_fn("lib", |_| Ok(())))?;
//!     registry.register(Stage::from_fn("exe", |_| Ok(())).depends_on("lib"))?;
//!
//!     stagecraft::cli::host::main(registry)
//! }
//! ```

use clap::Parser;
use miette::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{artifact_root, print_dependency_tree, report};
use crate::artifacts::LocalArtifactStore;
use crate::pipeline::{ExecutionOptions, Executor, GraphValidator, RunReport, StageRegistry};

/// Command-line surface of a stage-declaring program
#[derive(Parser, Debug, Clone, Default)]
#[clap(about = "Run the registered build stages in dependency order")]
pub struct HostArgs {
    /// Run exactly this stage (its dependencies are not run)
    #[clap(short, long, value_name = "NAME")]
    pub stage: Option<String>,

    /// Print the dependency table before running
    #[clap(long)]
    pub show_dep_tree: bool,

    /// Only compute the execution order
    #[clap(long)]
    pub dry_run: bool,

    /// Artifact store root
    #[clap(long, env = "STAGECRAFT_ARTIFACT_ROOT", value_name = "DIR")]
    pub artifact_root: Option<PathBuf>,
}

/// Run `registry` from `working_dir` as `args` ask
pub async fn run_registry(
    registry: &StageRegistry,
    args: &HostArgs,
    working_dir: &Path,
) -> Result<RunReport> {
    if args.show_dep_tree {
        GraphValidator::validate(registry).map_err(report)?;
        print_dependency_tree(registry);
    }

    let root = artifact_root(working_dir, None, args.artifact_root.as_deref());
    let executor = Executor::new(Arc::new(LocalArtifactStore::new(root)), working_dir);

    let options = ExecutionOptions {
        target: args.stage.clone(),
        dry_run: args.dry_run,
        progress: true,
    };

    executor.run(registry, &options).await.map_err(report)
}

/// Parse the process arguments and run `registry` from the current directory
pub fn main(registry: StageRegistry) -> Result<()> {
    crate::utils::init_tracing(false);

    let args = HostArgs::parse();
    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    let report = runtime.block_on(run_registry(&registry, &args, &working_dir))?;

    if args.dry_run {
        for name in &report.order {
            println!("{}", name);
        }
    }

    Ok(())
}
