// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Stage actions
//!
//! This module provides the action trait a stage runs when invoked, the
//! invocation context handed to it, and the built-in actions (closures and
//! shell commands).

mod context;
mod shell;

pub use context::{EnvConvention, StageContext, DEFAULT_ENV_PREFIX, DEFAULT_ENV_SUFFIX};
pub use shell::{ShellAction, DEFAULT_SHELL};

use async_trait::async_trait;

/// Work performed by a stage
///
/// Actions receive dependency artifact locations through the
/// [`StageContext`] rather than through the engine's own process
/// environment.
#[async_trait]
pub trait StageAction: Send + Sync {
    /// Run the action
    async fn run(&self, ctx: &StageContext) -> anyhow::Result<()>;

    /// Short label for listings
    fn kind(&self) -> &str {
        "action"
    }
}

/// Action backed by a plain closure
pub struct FnAction<F> {
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn(&StageContext) -> anyhow::Result<()> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> StageAction for FnAction<F>
where
    F: Fn(&StageContext) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &StageContext) -> anyhow::Result<()> {
        (self.f)(ctx)
    }

    fn kind(&self) -> &str {
        "fn"
    }
}
