//! Workspace file tools
//!
//! A static manifest of file capabilities backed by an external helper binary, plus
//! the rendered usage instructions an agent receives alongside the tools.

pub mod helper;
pub mod instructions;
pub mod manifest;

pub use helper::{Helper, Invocation};
pub use instructions::render_instructions;
pub use manifest::{manifest, Capability};

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Environment variable carrying the pre-computed workspace listing
pub const FILES_ENV: &str = "WORKSPACE_FILES";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace helper not configured: set WORKSPACE_HELPER_BIN or GPTSCRIPT_TOOL_DIR")]
    HelperNotConfigured,

    #[error("failed to run workspace helper {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workspace helper `{subcommand}` failed: {status}")]
    HelperFailed {
        subcommand: &'static str,
        status: ExitStatus,
    },

    #[error("{subcommand} expects {expected} parameter(s), got {got}")]
    Arity {
        subcommand: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("failed to render instructions: {0}")]
    Render(#[from] askama::Error),
}

/// Instructions for the current workspace
///
/// Uses `WORKSPACE_FILES` when it is set, otherwise asks the helper for a listing.
pub fn instructions<F>(lookup: F) -> Result<String, WorkspaceError>
where
    F: Fn(&str) -> Option<String>,
{
    let listing = match lookup(FILES_ENV) {
        Some(listing) => listing,
        None => {
            let helper = Helper::from_lookup(&lookup)?;
            helper.output(&Invocation::new(Capability::List, Vec::new())?)?
        }
    };
    render_instructions(&listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_from_env_listing() {
        let rendered = instructions(|key| match key {
            FILES_ENV => Some("a.txt\nb.txt".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(rendered.contains("a.txt\nb.txt"));
    }

    #[test]
    fn test_instructions_empty_env_listing() {
        let rendered = instructions(|key| match key {
            FILES_ENV => Some(String::new()),
            _ => None,
        })
        .unwrap();
        assert!(rendered.contains(instructions::NO_FILES));
    }

    #[test]
    fn test_instructions_without_listing_or_helper() {
        let err = instructions(|_| None).unwrap_err();
        assert!(matches!(err, WorkspaceError::HelperNotConfigured));
    }
}
