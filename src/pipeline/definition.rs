// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Pipeline file definitions
//!
//! Defines the schema for stagecraft.yaml (or .toml) files, whose stages run
//! shell commands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::actions::{
    EnvConvention, ShellAction, DEFAULT_ENV_PREFIX, DEFAULT_ENV_SUFFIX, DEFAULT_SHELL,
};
use crate::artifacts::DEFAULT_ARTIFACT_ROOT;
use crate::errors::{StagecraftError, StagecraftResult};
use crate::pipeline::{DeclarationSite, Stage, StageRegistry};

/// Default pipeline file name
pub const DEFAULT_PIPELINE_FILE: &str = "stagecraft.yaml";

/// Pipeline definition from stagecraft.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Environment variables for every stage
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Artifact storage configuration
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Stages, in declaration order
    pub stages: Vec<StageDefinition>,
}

fn default_version() -> String {
    "1".to_string()
}

impl Pipeline {
    /// Load a pipeline file; `.toml` files are parsed as TOML, anything else as YAML
    pub fn from_file(path: &Path) -> StagecraftResult<Self> {
        if !path.exists() {
            return Err(StagecraftError::PipelineNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| StagecraftError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse pipeline from YAML string
    pub fn from_yaml(yaml: &str) -> StagecraftResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse pipeline from TOML string
    pub fn from_toml(toml: &str) -> StagecraftResult<Self> {
        toml::from_str(toml).map_err(Into::into)
    }

    /// Serialize pipeline to YAML
    pub fn to_yaml(&self) -> StagecraftResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Get a stage by name
    pub fn get_stage(&self, name: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Get all stage names
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Naming convention for dependency artifact keys
    pub fn convention(&self) -> EnvConvention {
        EnvConvention::new(&self.artifacts.env_prefix, &self.artifacts.env_suffix)
    }

    /// Register every stage, recording `source` as the declaration site
    pub fn to_registry(&self, source: &Path) -> StagecraftResult<StageRegistry> {
        let mut registry = StageRegistry::new();

        for (i, def) in self.stages.iter().enumerate() {
            registry.register(def.to_stage(source, i)?)?;
        }

        Ok(registry)
    }
}

/// A stage as declared in a pipeline file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDefinition {
    /// Stage name (must be unique within pipeline)
    pub name: String,

    /// Stage description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Shell command to run
    pub run: String,

    /// Shell to use (sh, bash, etc.)
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Stage dependencies (other stage names)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Output directory captured once the stage succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactSpec>,

    /// Environment variables for this stage
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

impl StageDefinition {
    /// Turn the definition into a stage; `index` is its position in the file
    pub fn to_stage(&self, source: &Path, index: usize) -> StagecraftResult<Stage> {
        if self.run.trim().is_empty() {
            return Err(StagecraftError::InvalidStage {
                stage: self.name.clone(),
                reason: "Shell command is empty".to_string(),
            });
        }

        let key = format!("stages[{}]", index);
        let mut stage = Stage::new(&self.name, ShellAction::with_shell(&self.run, &self.shell))
            .declared_at(DeclarationSite::config(source, key.clone()));

        if let Some(ref description) = self.description {
            stage = stage.describe(description);
        }

        for (j, dep) in self.depends_on.iter().enumerate() {
            let site = DeclarationSite::config(source, format!("{}.depends_on[{}]", key, j));
            stage = stage.depends_on_at(dep, site);
        }

        if let Some(ref artifact) = self.artifact {
            let multiple = matches!(artifact, ArtifactSpec::Multiple(_));
            for (j, dir) in artifact.directories().into_iter().enumerate() {
                let site = if multiple {
                    DeclarationSite::config(source, format!("{}.artifact[{}]", key, j))
                } else {
                    DeclarationSite::config(source, format!("{}.artifact", key))
                };
                stage = stage.artifact_at(dir, site);
            }
        }

        for (k, v) in &self.env {
            stage = stage.env(k, v);
        }

        Ok(stage)
    }
}

/// Artifact declaration: one directory, or a list (only one is valid)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactSpec {
    /// Single directory
    Single(PathBuf),

    /// Several directories
    Multiple(Vec<PathBuf>),
}

impl ArtifactSpec {
    /// Declared directories
    pub fn directories(&self) -> Vec<&Path> {
        match self {
            Self::Single(p) => vec![p.as_path()],
            Self::Multiple(v) => v.iter().map(PathBuf::as_path).collect(),
        }
    }
}

/// Artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Root directory of the artifact store
    #[serde(default = "default_artifact_root")]
    pub root: PathBuf,

    /// Prefix of dependency artifact keys
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,

    /// Suffix of dependency artifact keys
    #[serde(default = "default_env_suffix")]
    pub env_suffix: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            root: default_artifact_root(),
            env_prefix: default_env_prefix(),
            env_suffix: default_env_suffix(),
        }
    }
}

fn default_artifact_root() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_ROOT)
}

fn default_env_prefix() -> String {
    DEFAULT_ENV_PREFIX.to_string()
}

fn default_env_suffix() -> String {
    DEFAULT_ENV_SUFFIX.to_string()
}
