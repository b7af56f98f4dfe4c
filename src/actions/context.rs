// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Invocation context
//!
//! Dependency artifacts are exposed to actions under
//! `PREFIX + upper(name) + SUFFIX` keys, `STAGE_LIB_BIN` for a dependency
//! named `lib` with the default convention.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default prefix of dependency artifact keys
pub const DEFAULT_ENV_PREFIX: &str = "STAGE_";

/// Default suffix of dependency artifact keys
pub const DEFAULT_ENV_SUFFIX: &str = "_BIN";

/// Naming convention for dependency artifact keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConvention {
    pub prefix: String,
    pub suffix: String,
}

impl EnvConvention {
    /// Create a convention with a custom prefix and suffix
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Key under which the artifact of `stage` is exposed
    pub fn key_for(&self, stage: &str) -> String {
        format!("{}{}{}", self.prefix, stage.to_uppercase(), self.suffix)
    }
}

impl Default for EnvConvention {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX, DEFAULT_ENV_SUFFIX)
    }
}

/// Everything a stage action gets to see about its invocation
#[derive(Debug, Clone)]
pub struct StageContext {
    stage: String,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
    artifacts: BTreeMap<String, PathBuf>,
}

impl StageContext {
    /// Create an empty context for `stage`
    pub fn new(stage: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            stage: stage.into(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            artifacts: BTreeMap::new(),
        }
    }

    /// Add plain environment variables; later calls override earlier ones
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Expose the artifact location of dependency `stage`
    pub fn with_dependency(
        mut self,
        convention: &EnvConvention,
        stage: &str,
        location: impl Into<PathBuf>,
    ) -> Self {
        let location = location.into();
        self.env.insert(
            convention.key_for(stage),
            location.to_string_lossy().into_owned(),
        );
        self.artifacts.insert(stage.to_string(), location);
        self
    }

    /// Name of the invoked stage
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Directory the action runs in
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Environment handed to the action, dependency keys included
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Look up a single variable
    pub fn var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Artifact location of a declared dependency
    pub fn artifact(&self, dependency: &str) -> Option<&Path> {
        self.artifacts.get(dependency).map(PathBuf::as_path)
    }

    /// Dependency artifact locations, keyed by stage name
    pub fn artifacts(&self) -> &BTreeMap<String, PathBuf> {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key() {
        let convention = EnvConvention::default();
        assert_eq!(convention.key_for("lib_dyn"), "STAGE_LIB_DYN_BIN");
    }

    #[test]
    fn test_custom_key() {
        let convention = EnvConvention::new("DEP_", "_DIR");
        assert_eq!(convention.key_for("exe"), "DEP_EXE_DIR");
    }

    #[test]
    fn test_dependency_overrides_plain_env() {
        let convention = EnvConvention::default();
        let ctx = StageContext::new("exe", "/work")
            .with_env([("STAGE_LIB_BIN", "stale"), ("CC", "clang")])
            .with_dependency(&convention, "lib", "/store/lib");

        assert_eq!(ctx.var("STAGE_LIB_BIN"), Some("/store/lib"));
        assert_eq!(ctx.var("CC"), Some("clang"));
        assert_eq!(ctx.artifact("lib"), Some(Path::new("/store/lib")));
        assert!(ctx.artifact("lib_dyn").is_none());
    }
}
