use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use folisdk_core::{ArchitectureId, VarValue};

use crate::{Cli, CliShell};

const PROMPT_BACKUP: &str = "_FOLISDK_PS1";
const PROMPT_SAVED: &str = "_FOLISDK_PS1_SAVED";

pub(crate) fn write_completions_script<W: Write>(shell: CliShell, writer: &mut W) -> Result<()> {
    let mut command = Cli::command();
    let generator: Shell = shell.into();
    let mut generated = Vec::new();
    clap_complete::generate(generator, &mut command, "folisdk", &mut generated);

    writer
        .write_all(&generated)
        .with_context(|| "failed writing generated completion script")?;
    Ok(())
}

/// Prompt handling appended to an `eval` script. The prompt is usually a
/// shell-local variable the tool cannot read, so it is saved and restored by
/// the shell itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptUpdate<'a> {
    Mark(&'a ArchitectureId),
    Restore,
}

/// Script that applies `changes` to the calling shell when evaluated.
pub(crate) fn render_env_script(
    shell: CliShell,
    title: &str,
    changes: &[(String, VarValue)],
    prompt: PromptUpdate<'_>,
) -> Vec<String> {
    let mut lines = vec![format!("# {title}")];
    for (name, value) in changes {
        lines.push(render_assignment(shell, name, value));
    }
    lines.extend(render_prompt_update(shell, prompt));
    lines
}

fn render_assignment(shell: CliShell, name: &str, value: &VarValue) -> String {
    match value.as_os_str() {
        Some(value) => {
            let value = value.to_string_lossy();
            match shell {
                CliShell::Bash | CliShell::Zsh => {
                    format!("export {name}='{}'", escape_single_quote_shell(&value))
                }
                CliShell::Fish => {
                    format!("set -gx {name} '{}'", escape_fish_single_quote(&value))
                }
                CliShell::Powershell => {
                    format!("$env:{name} = '{}'", escape_ps_single_quote(&value))
                }
            }
        }
        None => match shell {
            CliShell::Bash | CliShell::Zsh => format!("unset {name}"),
            CliShell::Fish => format!("set -e {name}"),
            CliShell::Powershell => {
                format!("Remove-Item Env:{name} -ErrorAction SilentlyContinue")
            }
        },
    }
}

// fish and PowerShell draw their prompt from a function, so only POSIX-style
// shells get prompt lines.
fn render_prompt_update(shell: CliShell, prompt: PromptUpdate<'_>) -> Vec<String> {
    if !matches!(shell, CliShell::Bash | CliShell::Zsh) {
        return Vec::new();
    }
    match prompt {
        PromptUpdate::Mark(arch) => vec![
            format!(
                "if [ -z \"${{{PROMPT_SAVED}+x}}\" ]; then {PROMPT_SAVED}=1; \
                 if [ -n \"${{PS1+x}}\" ]; then {PROMPT_BACKUP}=\"$PS1\"; else unset {PROMPT_BACKUP}; fi; fi"
            ),
            format!(
                "PS1='{}'\"${{{PROMPT_BACKUP}-}}\"",
                escape_single_quote_shell(&arch.prompt_marker())
            ),
        ],
        PromptUpdate::Restore => vec![format!(
            "if [ -n \"${{{PROMPT_SAVED}+x}}\" ]; then \
             if [ -n \"${{{PROMPT_BACKUP}+x}}\" ]; then PS1=\"${PROMPT_BACKUP}\"; else unset PS1; fi; \
             unset {PROMPT_BACKUP} {PROMPT_SAVED}; fi"
        )],
    }
}

fn escape_single_quote_shell(value: &str) -> String {
    value.replace('\'', "'\"'\"'")
}

fn escape_fish_single_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_ps_single_quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn detect_shell_from_env(shell_env: Option<&str>) -> Option<CliShell> {
    let shell_value = shell_env?;
    let shell_token = Path::new(shell_value)
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or(shell_value)
        .to_ascii_lowercase();
    match shell_token.as_str() {
        "bash" | "sh" | "dash" => Some(CliShell::Bash),
        "zsh" => Some(CliShell::Zsh),
        "fish" => Some(CliShell::Fish),
        "powershell" | "pwsh" | "powershell.exe" | "pwsh.exe" => Some(CliShell::Powershell),
        _ => None,
    }
}

pub(crate) fn resolve_script_shell(
    requested_shell: Option<CliShell>,
    shell_env: Option<&str>,
    is_windows: bool,
) -> CliShell {
    if let Some(shell) = requested_shell {
        return shell;
    }
    if let Some(shell) = detect_shell_from_env(shell_env) {
        return shell;
    }
    if is_windows {
        CliShell::Powershell
    } else {
        CliShell::Bash
    }
}
