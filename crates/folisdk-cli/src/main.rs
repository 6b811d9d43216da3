use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use folisdk_core::LayoutKind;
use tracing_subscriber::EnvFilter;

mod command_flows;
mod dispatch;
mod render;
mod session;
mod shell_script;

use dispatch::run_cli;

#[derive(Parser, Debug)]
#[command(name = "folisdk")]
#[command(about = "foliSDK cross-toolchain environment manager", long_about = None)]
struct Cli {
    /// SDK install prefix (host package for split installs).
    #[arg(long, global = true)]
    prefix: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    layout: Option<CliLayout>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session that can activate and deactivate toolchains.
    Shell {
        /// Activation applied when the session starts, e.g. `x86_64 --path-only`.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        activate: Vec<String>,
    },
    /// Run one command with a toolchain activated.
    Exec {
        #[arg(long)]
        path_only: bool,
        arch: String,
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Print the activation, or with `--deactivate` its undo, as a script for `eval`.
    Env {
        #[arg(long, value_enum)]
        shell: Option<CliShell>,
        #[arg(long, conflicts_with = "args")]
        deactivate: bool,
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            required_unless_present = "deactivate"
        )]
        args: Vec<String>,
    },
    Status {
        #[arg(long)]
        json: bool,
    },
    Doctor,
    Completions {
        #[arg(value_enum)]
        shell: CliShell,
    },
    Version,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLayout {
    Split,
    Unified,
}

impl From<CliLayout> for LayoutKind {
    fn from(value: CliLayout) -> Self {
        match value {
            CliLayout::Split => LayoutKind::Split,
            CliLayout::Unified => LayoutKind::Unified,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl From<CliShell> for Shell {
    fn from(value: CliShell) -> Self {
        match value {
            CliShell::Bash => Shell::Bash,
            CliShell::Zsh => Shell::Zsh,
            CliShell::Fish => Shell::Fish,
            CliShell::Powershell => Shell::PowerShell,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FOLISDK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let code = run_cli(cli)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
