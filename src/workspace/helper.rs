//! Dispatch to the external workspace helper
//!
//! The helper does the actual file work. Each invocation passes the sub-command as
//! the first argument and every parameter as an upper-cased environment variable.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use super::manifest::Capability;
use super::WorkspaceError;

pub const HELPER_BIN_ENV: &str = "WORKSPACE_HELPER_BIN";
pub const TOOL_DIR_ENV: &str = "GPTSCRIPT_TOOL_DIR";
const DEFAULT_HELPER: &str = "bin/gptscript-go-tool";

/// One capability call with its parameter values, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub capability: Capability,
    pub values: Vec<String>,
}

impl Invocation {
    pub fn new(capability: Capability, values: Vec<String>) -> Result<Self, WorkspaceError> {
        let expected = capability.params().len();
        if values.len() != expected {
            return Err(WorkspaceError::Arity {
                subcommand: capability.subcommand(),
                expected,
                got: values.len(),
            });
        }
        Ok(Invocation { capability, values })
    }

    /// `(ENV_VAR, value)` pairs handed to the helper
    pub fn env(&self) -> Vec<(String, &str)> {
        self.capability
            .params()
            .iter()
            .zip(&self.values)
            .map(|(param, value)| (param.env_var(), value.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helper {
    program: PathBuf,
}

impl Helper {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Helper {
            program: program.into(),
        }
    }

    pub fn from_env() -> Result<Self, WorkspaceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the helper path from an explicit binary or the tool directory
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkspaceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(bin) = non_empty(HELPER_BIN_ENV) {
            return Ok(Helper::new(bin));
        }
        match non_empty(TOOL_DIR_ENV) {
            Some(dir) => Ok(Helper::new(PathBuf::from(dir).join(DEFAULT_HELPER))),
            None => Err(WorkspaceError::HelperNotConfigured),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(invocation.capability.subcommand())
            .envs(invocation.env());
        command
    }

    /// Run with inherited stdio and return the helper's exit status
    pub fn run(&self, invocation: &Invocation) -> Result<ExitStatus, WorkspaceError> {
        tracing::debug!(
            program = %self.program.display(),
            subcommand = invocation.capability.subcommand(),
            "Invoking workspace helper"
        );
        self.command(invocation)
            .status()
            .map_err(|source| WorkspaceError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    /// Run and capture stdout; a non-zero exit is an error
    pub fn output(&self, invocation: &Invocation) -> Result<String, WorkspaceError> {
        let output = self
            .command(invocation)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| WorkspaceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(WorkspaceError::HelperFailed {
                subcommand: invocation.capability.subcommand(),
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
