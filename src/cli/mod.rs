// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stagecraft.

pub mod artifacts;
pub mod graph;
pub mod host;
pub mod init;
pub mod run;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::artifacts::LocalArtifactStore;
use crate::errors::StagecraftError;
use crate::pipeline::{Executor, Pipeline, StageRegistry};

/// Minimal build-pipeline engine
///
/// Declare stages, resolve their dependencies, run them in order.
#[derive(Parser, Debug)]
#[clap(
    name = "stagecraft",
    version,
    about = "Run build stages in dependency order and hand their artifacts downstream",
    long_about = None,
    after_help = "Examples:\n\
        stagecraft init                       Write a starter pipeline\n\
        stagecraft run                        Run every stage in dependency order\n\
        stagecraft run --stage exe            Run only the 'exe' stage\n\
        stagecraft run --show-dep-tree        Print the dependency table first\n\n\
        See 'stagecraft <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter pipeline file
    Init {
        /// Overwrite an existing pipeline file
        #[clap(long)]
        force: bool,
    },

    /// Run the pipeline
    Run {
        /// Pipeline file
        #[clap(short, long, default_value = crate::pipeline::DEFAULT_PIPELINE_FILE)]
        pipeline: PathBuf,

        /// Run exactly this stage (its dependencies are not run)
        #[clap(short, long, value_name = "NAME")]
        stage: Option<String>,

        /// Print the dependency table before running
        #[clap(long)]
        show_dep_tree: bool,

        /// Only show the execution order
        #[clap(long)]
        dry_run: bool,

        /// Artifact store root (overrides the pipeline file)
        #[clap(long, env = "STAGECRAFT_ARTIFACT_ROOT", value_name = "DIR")]
        artifact_root: Option<PathBuf>,
    },

    /// Validate pipeline configuration
    Validate {
        /// Pipeline file to validate
        #[clap(default_value = crate::pipeline::DEFAULT_PIPELINE_FILE)]
        pipeline: PathBuf,
    },

    /// Show the dependency graph
    Graph {
        /// Pipeline file
        #[clap(default_value = crate::pipeline::DEFAULT_PIPELINE_FILE)]
        pipeline: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Inspect or clean stored artifacts
    Artifacts {
        #[clap(subcommand)]
        action: ArtifactAction,

        /// Pipeline file the store root is read from
        #[clap(short, long, default_value = crate::pipeline::DEFAULT_PIPELINE_FILE)]
        pipeline: PathBuf,

        /// Artifact store root (overrides the pipeline file)
        #[clap(long, env = "STAGECRAFT_ARTIFACT_ROOT", value_name = "DIR")]
        artifact_root: Option<PathBuf>,
    },
}

/// Artifact management actions
#[derive(Subcommand, Debug, Clone)]
pub enum ArtifactAction {
    /// List stored artifacts
    List,

    /// Print where the artifact of a stage is stored
    Path {
        /// Stage name
        stage: String,
    },

    /// Delete stored artifacts
    Clear {
        /// Only this stage
        #[clap(short, long)]
        stage: Option<String>,

        /// Skip confirmation
        #[clap(short, long)]
        yes: bool,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// Numbered execution order
    Text,
    /// Graphviz
    Dot,
    /// Mermaid flowchart
    Mermaid,
}

/// Load a pipeline file and register its stages
pub fn load_pipeline(path: &Path) -> Result<(Pipeline, StageRegistry)> {
    let pipeline = Pipeline::from_file(path).map_err(report)?;
    let registry = pipeline.to_registry(path).map_err(report)?;
    Ok((pipeline, registry))
}

/// Resolve the artifact root: explicit override, else the pipeline setting
pub fn artifact_root(
    working_dir: &Path,
    pipeline: Option<&Pipeline>,
    override_root: Option<&Path>,
) -> PathBuf {
    let root = match (override_root, pipeline) {
        (Some(root), _) => root.to_path_buf(),
        (None, Some(pipeline)) => pipeline.artifacts.root.clone(),
        (None, None) => PathBuf::from(crate::artifacts::DEFAULT_ARTIFACT_ROOT),
    };

    working_dir.join(root)
}

/// Build the executor for a pipeline file
pub fn executor_for(pipeline: &Pipeline, working_dir: &Path, override_root: Option<&Path>) -> Executor {
    let root = artifact_root(working_dir, Some(pipeline), override_root);

    Executor::new(Arc::new(LocalArtifactStore::new(root)), working_dir)
        .with_convention(pipeline.convention())
        .with_env(pipeline.env.clone())
}

/// Dependency table, one `stage -> [deps]` row per stage in registration order
pub fn dependency_tree(registry: &StageRegistry) -> String {
    let mut out = String::new();

    for (stage, deps) in registry.dependency_table() {
        out.push_str(&format!("{} -> [{}]\n", stage, deps.join(", ")));
    }

    out
}

/// Print the dependency table between separators
pub fn print_dependency_tree(registry: &StageRegistry) {
    println!("-------- DEPS --------");
    print!("{}", dependency_tree(registry));
    println!("-------- ---- --------");
}

/// Print an error with its recovery suggestion, then hand it back
pub fn report(error: StagecraftError) -> miette::Report {
    if let Some(suggestion) = error.suggestion() {
        eprintln!();
        eprint!("{}", suggestion);
    }
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    #[test]
    fn test_dependency_tree() {
        let mut registry = StageRegistry::new();
        registry.register(Stage::from_fn("lib", |_| Ok(()))).unwrap();
        registry
            .register(Stage::from_fn("lib_dyn", |_| Ok(())).depends_on("lib"))
            .unwrap();
        registry
            .register(
                Stage::from_fn("exe", |_| Ok(()))
                    .depends_on("lib")
                    .depends_on("lib_dyn"),
            )
            .unwrap();

        insta::assert_snapshot!(dependency_tree(&registry), @r###"
        lib -> []
        lib_dyn -> [lib]
        exe -> [lib, lib_dyn]
        "###);
    }

    #[test]
    fn test_artifact_root_precedence() {
        let pipeline = Pipeline::from_yaml("name: p\nartifacts:\n  root: build/store\nstages: []\n").unwrap();
        let wd = Path::new("/work");

        assert_eq!(
            artifact_root(wd, Some(&pipeline), Some(Path::new("/tmp/override"))),
            PathBuf::from("/tmp/override")
        );
        assert_eq!(
            artifact_root(wd, Some(&pipeline), None),
            PathBuf::from("/work/build/store")
        );
        assert_eq!(
            artifact_root(wd, None, None),
            PathBuf::from("/work/.stagecraft/artifacts")
        );
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "stagecraft",
            "run",
            "--stage",
            "lib_dyn",
            "--show-dep-tree",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                stage,
                show_dep_tree,
                dry_run,
                ..
            } => {
                assert_eq!(stage.as_deref(), Some("lib_dyn"));
                assert!(show_dep_tree);
                assert!(!dry_run);
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }
}
