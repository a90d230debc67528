//! Workspace file tool entry point
//!
//! Usage:
//!   workspace-files manifest
//!   workspace-files instructions
//!   workspace-files read --filename notes.md
//!
//! Parameters fall back to the FILENAME, CONTENT, TO_FILENAME and INPUT environment
//! variables, which is how the tool runner passes them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use github_auth_provider::workspace::{self, Capability, Helper, Invocation};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "workspace-files", about = "Workspace file tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List files in the workspace
    List,
    /// Print a file's contents
    Read {
        #[arg(long, env = "FILENAME")]
        filename: String,
    },
    /// Write content to a file
    Write {
        #[arg(long, env = "FILENAME")]
        filename: String,
        #[arg(long, env = "CONTENT")]
        content: String,
    },
    /// Copy a file to a new path
    Copy {
        #[arg(long, env = "FILENAME")]
        filename: String,
        #[arg(long, env = "TO_FILENAME")]
        to_filename: String,
    },
    /// Parse raw tool input
    Input {
        #[arg(long, env = "INPUT")]
        input: String,
    },
    /// Print usage instructions with the current file listing
    Instructions,
    /// Print the tool manifest as JSON
    Manifest,
}

fn main() -> Result<ExitCode> {
    // Stdout carries tool output, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let (capability, values) = match cli.command {
        Command::Manifest => {
            let json = serde_json::to_string_pretty(&workspace::manifest())
                .context("failed to serialize manifest")?;
            println!("{}", json);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Instructions => {
            let rendered = workspace::instructions(|key| std::env::var(key).ok())?;
            println!("{}", rendered);
            return Ok(ExitCode::SUCCESS);
        }
        Command::List => (Capability::List, vec![]),
        Command::Read { filename } => (Capability::Read, vec![filename]),
        Command::Write { filename, content } => (Capability::Write, vec![filename, content]),
        Command::Copy {
            filename,
            to_filename,
        } => (Capability::Copy, vec![filename, to_filename]),
        Command::Input { input } => (Capability::Input, vec![input]),
    };

    let invocation = Invocation::new(capability, values)?;
    let helper = Helper::from_env()?;
    let status = helper.run(&invocation)?;
    let code = status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
    Ok(ExitCode::from(code))
}
