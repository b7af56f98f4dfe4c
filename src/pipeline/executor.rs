// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Pipeline executor
//!
//! Orchestrates the execution of registered stages in dependency order.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::actions::{EnvConvention, StageContext};
use crate::artifacts::ArtifactStore;
use crate::errors::{StagecraftError, StagecraftResult};
use crate::pipeline::{GraphValidator, Stage, StageRegistry};

/// Execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Run exactly this stage; its dependencies are not run first
    pub target: Option<String>,
    /// Only compute and return the plan
    pub dry_run: bool,
    /// Print progress lines
    pub progress: bool,
}

/// Where a run currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validated,
    Ordered,
    Running(String),
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validated => write!(f, "validated"),
            Self::Ordered => write!(f, "ordered"),
            Self::Running(stage) => write!(f, "running({})", stage),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one invoked stage
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: String,
    pub duration: Duration,
    /// Where the stage's artifact was stored, if it declares one
    pub artifact: Option<PathBuf>,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Stages in scope, in execution order
    pub order: Vec<String>,
    /// Invoked stages, in execution order
    pub outcomes: Vec<StageOutcome>,
    /// Total execution time
    pub duration: Duration,
    /// Final state
    pub state: RunState,
}

/// Pipeline executor
pub struct Executor {
    store: Arc<dyn ArtifactStore>,
    convention: EnvConvention,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
}

impl Executor {
    /// Create an executor persisting artifacts into `store`
    pub fn new(store: Arc<dyn ArtifactStore>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            convention: EnvConvention::default(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
        }
    }

    /// Use a different naming convention for dependency keys
    pub fn with_convention(mut self, convention: EnvConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Environment handed to every stage
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Validate and compute the stages in scope, in execution order
    ///
    /// The full graph is ordered even when a target is given, so a cycle
    /// anywhere in the registry is reported before anything runs.
    pub fn plan(&self, registry: &StageRegistry, target: Option<&str>) -> StagecraftResult<Vec<String>> {
        GraphValidator::validate(registry)?;
        tracing::debug!(state = %RunState::Validated, stages = registry.len());

        let order = GraphValidator::build_graph(registry)
            .topological_order()
            .map_err(|cycle| StagecraftError::CycleDetected {
                stages: cycle.members,
            })?;

        let scope = match target {
            Some(name) => vec![registry.get(name)?.name.clone()],
            None => order,
        };
        tracing::debug!(state = %RunState::Ordered, scope = ?scope);

        Ok(scope)
    }

    /// Run a registry
    pub async fn run(
        &self,
        registry: &StageRegistry,
        options: &ExecutionOptions,
    ) -> StagecraftResult<RunReport> {
        let start = Instant::now();

        let order = self.plan(registry, options.target.as_deref())?;

        if options.dry_run {
            return Ok(RunReport {
                order,
                outcomes: Vec::new(),
                duration: start.elapsed(),
                state: RunState::Ordered,
            });
        }

        let mut outcomes = Vec::with_capacity(order.len());

        for name in &order {
            let stage = registry.get(name)?;
            tracing::info!(state = %RunState::Running(name.clone()), "running stage");

            match self.run_stage(stage, options.progress).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(stage = %name, state = %RunState::Failed, error = %e, "run aborted");
                    return Err(e);
                }
            }
        }

        let duration = start.elapsed();
        tracing::info!(state = %RunState::Done, stages = outcomes.len(), elapsed_ms = duration.as_millis() as u64, "run finished");

        Ok(RunReport {
            order,
            outcomes,
            duration,
            state: RunState::Done,
        })
    }

    /// Build the invocation context of a stage
    pub fn context_for(&self, stage: &Stage) -> StageContext {
        let mut ctx = StageContext::new(&stage.name, &self.working_dir)
            .with_env(self.env.clone())
            .with_env(stage.env.clone());

        for dep in &stage.dependencies {
            ctx = ctx.with_dependency(&self.convention, &dep.name, self.store.locate(&dep.name));
        }

        ctx
    }

    async fn run_stage(&self, stage: &Stage, progress: bool) -> StagecraftResult<StageOutcome> {
        let start = Instant::now();
        let ctx = self.context_for(stage);

        if progress {
            println!("  {} {}", "→".blue(), stage.name.bold());
        }

        if let Err(e) = stage.action.run(&ctx).await {
            if progress {
                println!("  {} {} failed", "✗".red(), stage.name.bold());
            }
            return Err(StagecraftError::stage_failed(&stage.name, &e));
        }

        let artifact = match stage.artifact_decl() {
            Some(decl) => {
                let source = self.working_dir.join(&decl.directory);
                let record = self.store.save(&stage.name, &source).await?;
                Some(record.location)
            }
            None => None,
        };

        let duration = start.elapsed();
        if progress {
            println!(
                "  {} {} ({:.2}s)",
                "✓".green(),
                stage.name.bold(),
                duration.as_secs_f64()
            );
        }

        Ok(StageOutcome {
            stage: stage.name.clone(),
            duration,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::LocalArtifactStore;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(name: &str, log: &Log) -> Stage {
        let log = log.clone();
        let stage_name = name.to_string();
        Stage::from_fn(name, move |_| {
            log.lock().unwrap().push(stage_name.clone());
            Ok(())
        })
    }

    fn executor(temp_dir: &TempDir) -> Executor {
        let store = LocalArtifactStore::new(temp_dir.path().join("store"));
        Executor::new(Arc::new(store), temp_dir.path())
    }

    fn registry(stages: Vec<Stage>) -> StageRegistry {
        let mut registry = StageRegistry::new();
        for stage in stages {
            registry.register(stage).unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_runs_in_dependency_order() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![
            recording("exe", &log).depends_on("lib").depends_on("lib_dyn"),
            recording("lib_dyn", &log).depends_on("lib"),
            recording("lib", &log),
        ]);

        let report = executor(&temp_dir)
            .run(&registry, &ExecutionOptions::default())
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["lib", "lib_dyn", "exe"]);
        assert_eq!(report.order, vec!["lib", "lib_dyn", "exe"]);
        assert_eq!(report.state, RunState::Done);
    }

    #[tokio::test]
    async fn test_cycle_runs_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![
            recording("free", &log),
            recording("a", &log).depends_on("b"),
            recording("b", &log).depends_on("a"),
        ]);

        let err = executor(&temp_dir)
            .run(&registry, &ExecutionOptions::default())
            .await
            .unwrap_err();

        match err {
            StagecraftError::CycleDetected { stages } => assert_eq!(stages, vec!["a", "b", "a"]),
            other => panic!("Expected CycleDetected, got {:?}", other),
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_reported_in_target_mode() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![
            recording("free", &log),
            recording("a", &log).depends_on("a"),
        ]);

        let options = ExecutionOptions {
            target: Some("free".into()),
            ..Default::default()
        };
        let err = executor(&temp_dir).run(&registry, &options).await.unwrap_err();

        assert!(matches!(err, StagecraftError::CycleDetected { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_target_runs_only_that_stage() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![
            recording("lib", &log),
            recording("lib_dyn", &log).depends_on("lib"),
            recording("exe", &log).depends_on("lib_dyn"),
        ]);

        let options = ExecutionOptions {
            target: Some("lib_dyn".into()),
            ..Default::default()
        };
        let report = executor(&temp_dir).run(&registry, &options).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["lib_dyn"]);
        assert_eq!(report.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![recording("lib", &log)]);

        let options = ExecutionOptions {
            target: Some("docs".into()),
            ..Default::default()
        };
        let err = executor(&temp_dir).run(&registry, &options).await.unwrap_err();

        assert!(matches!(err, StagecraftError::UnknownStage { ref stage } if stage == "docs"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_stages() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![
            recording("lib", &log),
            Stage::from_fn("broken", |_| anyhow::bail!("compiler exploded")),
            recording("exe", &log).depends_on("broken"),
        ]);

        let err = executor(&temp_dir)
            .run(&registry, &ExecutionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StagecraftError::StageFailed { ref stage, .. } if stage == "broken"));
        assert_eq!(*log.lock().unwrap(), vec!["lib"]);
    }

    #[tokio::test]
    async fn test_missing_artifact_dir_aborts_before_dependents() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![
            recording("lib", &log).artifact("out/lib"),
            recording("exe", &log).depends_on("lib"),
        ]);

        let err = executor(&temp_dir)
            .run(&registry, &ExecutionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StagecraftError::ArtifactWriteError { ref stage, .. } if stage == "lib"));
        assert_eq!(*log.lock().unwrap(), vec!["lib"]);
    }

    #[tokio::test]
    async fn test_context_exposes_dependency_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(&temp_dir);
        let stage = Stage::from_fn("exe", |_| Ok(()))
            .depends_on("lib")
            .depends_on("lib_dyn")
            .env("CC", "clang");

        let ctx = executor.context_for(&stage);

        let store_root = temp_dir.path().join("store");
        assert_eq!(
            ctx.var("STAGE_LIB_BIN"),
            Some(store_root.join("lib").to_str().unwrap())
        );
        assert_eq!(ctx.artifact("lib_dyn"), Some(store_root.join("lib_dyn").as_path()));
        assert_eq!(ctx.var("CC"), Some("clang"));
        assert_eq!(ctx.working_dir(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_dry_run_invokes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let log = Log::default();
        let registry = registry(vec![recording("b", &log).depends_on("a"), recording("a", &log)]);

        let options = ExecutionOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = executor(&temp_dir).run(&registry, &options).await.unwrap();

        assert_eq!(report.order, vec!["a", "b"]);
        assert_eq!(report.state, RunState::Ordered);
        assert!(log.lock().unwrap().is_empty());
    }
}
