// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Error types
//!
//! Every error carries enough context (stage, offending dependency or
//! artifact, declaration site) to locate the faulty declaration.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::DeclarationSite;

/// Result type for stagecraft operations
pub type StagecraftResult<T> = Result<T, StagecraftError>;

/// Main error type for stagecraft
#[derive(Error, Debug, Diagnostic)]
pub enum StagecraftError {
    // ─────────────────────────────────────────────────────────────────────────
    // Registration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' is already registered")]
    #[diagnostic(
        code(stagecraft::duplicate_stage),
        help("Stage names must be unique; rename one of the declarations")
    )]
    DuplicateStage { stage: String },

    #[error("Stage '{stage}' is invalid: {reason}")]
    #[diagnostic(code(stagecraft::invalid_stage))]
    InvalidStage { stage: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}', no such dependency: {dependency} (declared at {site})")]
    #[diagnostic(
        code(stagecraft::dependency_not_found),
        help("Check that a stage named '{dependency}' is registered")
    )]
    DependencyNotFound {
        stage: String,
        dependency: String,
        site: DeclarationSite,
    },

    #[error("Stage '{stage}', only one artifact allowed, found: {count}")]
    #[diagnostic(
        code(stagecraft::too_many_artifacts),
        help("Declare a single output directory per stage")
    )]
    TooManyArtifacts { stage: String, count: usize },

    #[error("Dependency cycle detected: {}", .stages.join(" -> "))]
    #[diagnostic(
        code(stagecraft::cycle_detected),
        help("Review your stage dependencies to remove the cycle")
    )]
    CycleDetected { stages: Vec<String> },

    #[error("Unknown stage: '{stage}'")]
    #[diagnostic(
        code(stagecraft::unknown_stage),
        help("Run 'stagecraft graph' to list the registered stages")
    )]
    UnknownStage { stage: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' failed: {message}")]
    #[diagnostic(code(stagecraft::stage_failed))]
    StageFailed { stage: String, message: String },

    #[error("Failed to save artifact of stage '{stage}' from '{path}': {error}")]
    #[diagnostic(
        code(stagecraft::artifact_write_error),
        help("Make sure the stage creates its declared output directory")
    )]
    ArtifactWriteError {
        stage: String,
        path: PathBuf,
        error: String,
    },

    #[error("Artifact store error: {message}")]
    #[diagnostic(code(stagecraft::artifact_store_error))]
    ArtifactStore { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline file not found: {path}")]
    #[diagnostic(
        code(stagecraft::pipeline_not_found),
        help("Create a pipeline with 'stagecraft init' or write stagecraft.yaml manually")
    )]
    PipelineNotFound { path: PathBuf },

    #[error("Invalid pipeline configuration: {reason}")]
    #[diagnostic(code(stagecraft::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(stagecraft::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(stagecraft::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(stagecraft::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(stagecraft::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(stagecraft::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for StagecraftError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for StagecraftError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for StagecraftError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for StagecraftError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl StagecraftError {
    /// Wrap a failed stage action, keeping the whole context chain
    pub fn stage_failed(stage: &str, error: &anyhow::Error) -> Self {
        Self::StageFailed {
            stage: stage.to_string(),
            message: format!("{:#}", error),
        }
    }

    /// Create an artifact write error for a stage
    pub fn artifact_write(stage: &str, path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::ArtifactWriteError {
            stage: stage.to_string(),
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Name of the stage this error is about, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::DuplicateStage { stage }
            | Self::InvalidStage { stage, .. }
            | Self::DependencyNotFound { stage, .. }
            | Self::TooManyArtifacts { stage, .. }
            | Self::UnknownStage { stage }
            | Self::StageFailed { stage, .. }
            | Self::ArtifactWriteError { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Actionable next steps for this error, if there are any
    pub fn suggestion(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::DependencyNotFound {
                stage,
                dependency,
                site,
            } => Some(RecoverySuggestion::fix_missing_dependency(stage, dependency, site)),
            Self::TooManyArtifacts { stage, count } => {
                Some(RecoverySuggestion::single_artifact(stage, *count))
            }
            Self::CycleDetected { stages } => {
                Some(RecoverySuggestion::fix_circular_dependency(stages))
            }
            Self::ArtifactWriteError { stage, path, .. } => {
                Some(RecoverySuggestion::fix_missing_artifact(stage, path))
            }
            Self::PipelineNotFound { .. } => Some(RecoverySuggestion::create_pipeline()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_not_found_names_site() {
        let err = StagecraftError::DependencyNotFound {
            stage: "B".into(),
            dependency: "Z".into(),
            site: DeclarationSite::code("build.rs", 12, 5),
        };

        let msg = err.to_string();
        assert!(msg.contains("Stage 'B'"));
        assert!(msg.contains("no such dependency: Z"));
        assert!(msg.contains("build.rs:12:5"));
        assert_eq!(err.stage(), Some("B"));
    }

    #[test]
    fn test_cycle_message_lists_members() {
        let err = StagecraftError::CycleDetected {
            stages: vec!["a".into(), "b".into(), "a".into()],
        };

        assert_eq!(err.to_string(), "Dependency cycle detected: a -> b -> a");
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_stage_failed_keeps_context_chain() {
        let source = anyhow::anyhow!("exit status 2").context("compiler crashed");
        let err = StagecraftError::stage_failed("exe", &source);

        assert_eq!(
            err.to_string(),
            "Stage 'exe' failed: compiler crashed: exit status 2"
        );
    }
}
