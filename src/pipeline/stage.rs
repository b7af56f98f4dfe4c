// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Stage declarations
//!
//! A [`Stage`] is declared through ordinary builder calls. Dependencies are
//! references by name only; they are resolved against the registry at
//! validation time, so the order in which cooperating stages are declared
//! never matters.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use crate::actions::{FnAction, StageAction, StageContext};

/// Where a dependency or artifact was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationSite {
    /// Declared from Rust code
    Code {
        file: String,
        line: u32,
        column: u32,
    },
    /// Declared in a pipeline file
    Config {
        file: PathBuf,
        /// Key path inside the file, e.g. `stages[2].depends_on[0]`
        key: String,
    },
    /// No provenance recorded
    Unknown,
}

impl DeclarationSite {
    /// Site of a declaration in source code
    pub fn code(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Code {
            file: file.into(),
            line,
            column,
        }
    }

    /// Site of a declaration in a pipeline file
    pub fn config(file: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self::Config {
            file: file.into(),
            key: key.into(),
        }
    }

    /// Capture the caller of the current `#[track_caller]` function
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::code(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code { file, line, column } => write!(f, "{}:{}:{}", file, line, column),
            Self::Config { file, key } => write!(f, "{} ({})", file.display(), key),
            Self::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// A reference from one stage to another, by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the stage that must run first
    pub name: String,
    /// Where the reference was declared
    pub site: DeclarationSite,
}

/// A declared output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDecl {
    /// Directory to capture once the stage succeeds, relative to the working directory
    pub directory: PathBuf,
    /// Where the artifact was declared
    pub site: DeclarationSite,
}

/// A named unit of build work
pub struct Stage {
    /// Stage name (must be unique within a registry)
    pub name: String,

    /// Stage description
    pub description: Option<String>,

    /// Work performed when the stage is invoked
    pub action: Box<dyn StageAction>,

    /// Stages that must run before this one, in declaration order
    pub dependencies: Vec<Dependency>,

    /// Declared output directories; more than one fails validation
    pub artifacts: Vec<ArtifactDecl>,

    /// Extra environment variables for the action
    pub env: BTreeMap<String, String>,

    /// Where the stage itself was declared
    pub site: DeclarationSite,
}

impl Stage {
    /// Declare a stage running `action`
    #[track_caller]
    pub fn new(name: impl Into<String>, action: impl StageAction + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            action: Box::new(action),
            dependencies: Vec::new(),
            artifacts: Vec::new(),
            env: BTreeMap::new(),
            site: DeclarationSite::caller(),
        }
    }

    /// Declare a stage running a plain closure
    #[track_caller]
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&StageContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(name, FnAction::new(f))
    }

    /// Attach a description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Depend on another stage, by name or by handle
    #[track_caller]
    pub fn depends_on(self, stage: impl AsRef<str>) -> Self {
        let site = DeclarationSite::caller();
        self.depends_on_at(stage, site)
    }

    /// Depend on another stage, recording an explicit declaration site
    pub fn depends_on_at(mut self, stage: impl AsRef<str>, site: DeclarationSite) -> Self {
        self.dependencies.push(Dependency {
            name: stage.as_ref().to_string(),
            site,
        });
        self
    }

    /// Declare the directory this stage produces
    #[track_caller]
    pub fn artifact(self, directory: impl Into<PathBuf>) -> Self {
        let site = DeclarationSite::caller();
        self.artifact_at(directory, site)
    }

    /// Declare an artifact, recording an explicit declaration site
    pub fn artifact_at(mut self, directory: impl Into<PathBuf>, site: DeclarationSite) -> Self {
        self.artifacts.push(ArtifactDecl {
            directory: directory.into(),
            site,
        });
        self
    }

    /// Set an environment variable for this stage's action
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override where the stage counts as declared
    pub fn declared_at(mut self, site: DeclarationSite) -> Self {
        self.site = site;
        self
    }

    /// Names of the declared dependencies, in declaration order
    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.iter().map(|d| d.name.as_str()).collect()
    }

    /// The declared artifact, if there is exactly one
    pub fn artifact_decl(&self) -> Option<&ArtifactDecl> {
        match self.artifacts.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Short label of the action kind (`shell`, `fn`, ...)
    pub fn kind(&self) -> &str {
        self.action.kind()
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("action", &self.kind())
            .field("dependencies", &self.dependencies)
            .field("artifacts", &self.artifacts)
            .field("env", &self.env)
            .field("site", &self.site)
            .finish()
    }
}

impl AsRef<str> for Stage {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Cheap handle to a registered stage, usable as a dependency reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageHandle {
    name: String,
}

impl StageHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name of the referenced stage
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for StageHandle {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
