// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Stage registry
//!
//! Holds every declared stage, keyed by name, in registration order.

use std::collections::HashMap;

use crate::errors::{StagecraftError, StagecraftResult};
use crate::pipeline::{Stage, StageHandle};

/// All declared stages of a pipeline
#[derive(Debug, Default)]
pub struct StageRegistry {
    stages: Vec<Stage>,
    by_name: HashMap<String, usize>,
}

impl StageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stage
    ///
    /// Names are unique: registering a name twice fails with
    /// [`StagecraftError::DuplicateStage`] and leaves the first declaration
    /// in place.
    pub fn register(&mut self, stage: Stage) -> StagecraftResult<StageHandle> {
        check_name(&stage.name)?;

        if self.by_name.contains_key(&stage.name) {
            return Err(StagecraftError::DuplicateStage {
                stage: stage.name.clone(),
            });
        }

        tracing::debug!(stage = %stage.name, dependencies = stage.dependencies.len(), "registered stage");

        let handle = StageHandle::new(stage.name.clone());
        self.by_name.insert(stage.name.clone(), self.stages.len());
        self.stages.push(stage);

        Ok(handle)
    }

    /// Get a stage by name
    pub fn get(&self, name: &str) -> StagecraftResult<&Stage> {
        self.by_name
            .get(name)
            .map(|&idx| &self.stages[idx])
            .ok_or_else(|| StagecraftError::UnknownStage {
                stage: name.to_string(),
            })
    }

    /// Check whether a stage is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All stage names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// All stages, in registration order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// `(stage, dependency names)` rows, in registration order
    pub fn dependency_table(&self) -> Vec<(&str, Vec<&str>)> {
        self.stages
            .iter()
            .map(|s| (s.name.as_str(), s.dependency_names()))
            .collect()
    }
}

// Stage names double as directory names in the artifact store.
fn check_name(name: &str) -> StagecraftResult<()> {
    let reason = if name.is_empty() {
        "name must not be empty"
    } else if name.contains('/') || name.contains('\\') {
        "name must not contain path separators"
    } else if name.starts_with('.') {
        "name must not start with '.'"
    } else if name.chars().any(char::is_control) {
        "name must not contain control characters"
    } else {
        return Ok(());
    };

    Err(StagecraftError::InvalidStage {
        stage: name.to_string(),
        reason: reason.to_string(),
    })
}
