// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Shell action
//!
//! Executes a shell command with the stage context as its environment.

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::process::Command;

use super::{StageAction, StageContext};

/// Default shell used by pipeline files
pub const DEFAULT_SHELL: &str = "sh";

/// Runs `<shell> -c <command>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellAction {
    command: String,
    shell: String,
}

impl ShellAction {
    /// Create a shell action using the default shell
    pub fn new(command: impl Into<String>) -> Self {
        Self::with_shell(command, DEFAULT_SHELL)
    }

    /// Create a shell action using a specific shell
    pub fn with_shell(command: impl Into<String>, shell: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: shell.into(),
        }
    }

    /// The command line
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The shell binary
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

#[async_trait]
impl StageAction for ShellAction {
    async fn run(&self, ctx: &StageContext) -> anyhow::Result<()> {
        tracing::debug!(stage = ctx.stage(), shell = %self.shell, command = %self.command, "spawning shell");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(&self.command);
        cmd.current_dir(ctx.working_dir());
        cmd.envs(ctx.env());

        let status = cmd
            .status()
            .await
            .with_context(|| format!("Shell '{}' may not be available", self.shell))?;

        if !status.success() {
            match status.code() {
                Some(code) => bail!("command `{}` exited with code {}", self.command, code),
                None => bail!("command `{}` was terminated by a signal", self.command),
            }
        }

        Ok(())
    }

    fn kind(&self) -> &str {
        "shell"
    }
}
