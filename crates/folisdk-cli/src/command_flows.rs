use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use folisdk_core::{ArchitectureId, LayoutKind, ManagedVar, SdkConfig};
use folisdk_env::{
    carried_names, parse_activate_args, ActivationError, ActivationManager, ActivationOptions,
    ActivationRequest, ActivationState, Environment, MemoryEnvironment, ProcessEnvironment,
};
use folisdk_locator::{
    default_config_path, default_sdk_prefix, load_config, SdkLayout, ToolchainLocator,
};
use serde::Serialize;
use tracing::debug;

use crate::render::{
    format_activation_error, format_activation_lines, format_deactivation_line,
    paint_status_line, render_status_line, OutputStyle,
};
use crate::session::{Session, ShellRunner};
use crate::shell_script::{render_env_script, resolve_script_shell, PromptUpdate};
use crate::CliShell;

/// Layout-related options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutSettings {
    pub(crate) prefix: Option<PathBuf>,
    pub(crate) layout: Option<LayoutKind>,
    pub(crate) config: Option<PathBuf>,
}

pub(crate) fn load_settings_config(settings: &LayoutSettings) -> Result<(PathBuf, SdkConfig)> {
    let path = match &settings.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = load_config(&path)?;
    Ok((path, config))
}

/// Prefix precedence: flag, then `FOLISDK_PREFIX`, then config, then the default.
pub(crate) fn select_prefix(
    flag: Option<&Path>,
    env_prefix: Option<OsString>,
    config: &SdkConfig,
) -> Option<PathBuf> {
    if let Some(prefix) = flag {
        return Some(prefix.to_path_buf());
    }
    if let Some(prefix) = env_prefix.filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(prefix));
    }
    config.prefix.clone()
}

pub(crate) fn build_layout(settings: &LayoutSettings, config: &SdkConfig) -> Result<SdkLayout> {
    let prefix = match select_prefix(
        settings.prefix.as_deref(),
        std::env::var_os("FOLISDK_PREFIX"),
        config,
    ) {
        Some(prefix) => prefix,
        None => default_sdk_prefix()?,
    };
    let mut config = config.clone();
    if let Some(layout) = settings.layout {
        config.layout = layout;
    }
    Ok(SdkLayout::from_config(prefix, &config))
}

pub(crate) fn run_shell_command(
    layout: SdkLayout,
    activate: &[String],
    style: OutputStyle,
) -> Result<()> {
    let manager = ActivationManager::new(layout);
    let mut env = ProcessEnvironment;
    let state = ActivationState::recover(&env)?;
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = io::stdout();

    let mut session =
        Session::new(&manager, &mut env, ShellRunner, style, interactive).resume(state);
    if !activate.is_empty() {
        session.activate(activate, &mut stdout)?;
    }
    session.run(stdin.lock(), &mut stdout)
}

pub(crate) fn run_exec_command(
    layout: SdkLayout,
    arch: &str,
    path_only: bool,
    command: &[String],
    style: OutputStyle,
) -> Result<i32> {
    let manager = ActivationManager::new(layout);
    let options = ActivationOptions {
        path_only,
        ..ActivationOptions::default()
    };
    let request = ActivationRequest::new(arch, options)?;
    let mut env = ProcessEnvironment;
    let mut stderr = io::stderr();
    exec_with_environment(&manager, &mut env, &request, command, style, &mut stderr)
}

/// Activates over whatever `env` already carries, runs `command` with the
/// result, deactivates, and returns the command's exit code.
pub(crate) fn exec_with_environment<L, E, W>(
    manager: &ActivationManager<L>,
    env: &mut E,
    request: &ActivationRequest,
    command: &[String],
    style: OutputStyle,
    status_out: &mut W,
) -> Result<i32>
where
    L: ToolchainLocator,
    E: Environment,
    W: Write,
{
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("exec requires a command to run");
    };

    let mut state = ActivationState::recover(&*env)?;
    let activation = manager
        .activate(&mut state, &mut *env, request)
        .inspect_err(|err| debug!(kind = err.kind(), %err, "exec activation failed"))?;
    for (status, message) in format_activation_lines(&activation) {
        write_status_line(status_out, style, status, &message)?;
    }

    let outcome = child_command(program, args, &*env)
        .status()
        .with_context(|| format!("failed to run command: {program}"));

    match manager.deactivate(&mut state, &mut *env) {
        Ok(deactivation) => {
            let (status, message) = format_deactivation_line(&deactivation);
            write_status_line(status_out, style, status, &message)?;
        }
        Err(err) => {
            debug!(kind = err.kind(), %err, "exec deactivation failed");
            let (status, message) = format_activation_error(&err);
            write_status_line(status_out, style, status, &message)?;
            if err.is_fatal() {
                return Err(err.into());
            }
        }
    }

    Ok(outcome?.code().unwrap_or(1))
}

/// Child process seeing every managed and carried variable as `env` has it.
fn child_command<E>(program: &str, args: &[String], env: &E) -> Command
where
    E: Environment + ?Sized,
{
    let mut command = Command::new(program);
    command.args(args);
    let names = ManagedVar::all()
        .map(|var| var.name().to_string())
        .chain(carried_names());
    for name in names {
        match env.get(&name) {
            Some(value) => command.env(&name, value),
            None => command.env_remove(&name),
        };
    }
    command
}

pub(crate) fn run_env_command(
    layout: SdkLayout,
    shell: Option<CliShell>,
    deactivate: bool,
    args: &[String],
    style: OutputStyle,
) -> Result<Vec<String>> {
    let shell = resolve_script_shell(
        shell,
        std::env::var("SHELL").ok().as_deref(),
        cfg!(windows),
    );
    let manager = ActivationManager::new(layout);
    let env = MemoryEnvironment::from_process();
    let mut stderr = io::stderr();
    render_env_command(&manager, &env, shell, deactivate, args, style, &mut stderr)
}

/// Script for `eval` that moves the calling shell from `env` to the requested
/// state. An activation already carried in `env` is unwound in the same
/// script. The prompt is handled by the shell, since `PS1` is rarely exported.
pub(crate) fn render_env_command<L, W>(
    manager: &ActivationManager<L>,
    env: &MemoryEnvironment,
    shell: CliShell,
    deactivate: bool,
    args: &[String],
    style: OutputStyle,
    status_out: &mut W,
) -> Result<Vec<String>>
where
    L: ToolchainLocator,
    W: Write,
{
    if deactivate {
        return match manager.preview_deactivate(env) {
            Ok((deactivation, changes)) => Ok(render_env_script(
                shell,
                &format!("foliSDK deactivation of {}", deactivation.arch),
                &changes,
                PromptUpdate::Restore,
            )),
            Err(err @ ActivationError::NotActive) => {
                let (status, message) = format_activation_error(&err);
                write_status_line(status_out, style, status, &message)?;
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        };
    }

    let mut request = parse_activate_args(args)?;
    request.options.keep_prompt = true;
    let (activation, changes) = manager.preview(env, &request)?;
    Ok(render_env_script(
        shell,
        &format!("foliSDK activation for {}", activation.arch),
        &changes,
        PromptUpdate::Mark(&activation.arch),
    ))
}

fn write_status_line<W: Write>(
    out: &mut W,
    style: OutputStyle,
    status: &str,
    message: &str,
) -> Result<()> {
    writeln!(out, "{}", paint_status_line(style, status, message))
        .context("failed writing status output")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StatusReport {
    pub(crate) active: Option<String>,
    pub(crate) prefix: String,
    pub(crate) layout: String,
    pub(crate) installed: Vec<String>,
}

pub(crate) fn build_status_report(
    layout: &SdkLayout,
    active_marker: Option<String>,
) -> Result<StatusReport> {
    let installed = layout
        .installed_architectures()?
        .iter()
        .map(ArchitectureId::to_string)
        .collect();
    Ok(StatusReport {
        active: active_marker.filter(|value| !value.is_empty()),
        prefix: layout.prefix().display().to_string(),
        layout: layout.kind().to_string(),
        installed,
    })
}

pub(crate) fn format_status_lines(report: &StatusReport, style: OutputStyle) -> Vec<String> {
    let active = match &report.active {
        Some(arch) => render_status_line(style, "ok", &format!("active: {arch}")),
        None => render_status_line(style, "step", "active: none"),
    };
    let installed = if report.installed.is_empty() {
        render_status_line(style, "warn", "installed: none")
    } else {
        render_status_line(
            style,
            "step",
            &format!("installed: {}", report.installed.join(", ")),
        )
    };
    vec![
        active,
        render_status_line(style, "step", &format!("prefix: {}", report.prefix)),
        render_status_line(style, "step", &format!("layout: {}", report.layout)),
        installed,
    ]
}

pub(crate) fn run_status_command(layout: &SdkLayout, json: bool, style: OutputStyle) -> Result<()> {
    let report = build_status_report(layout, std::env::var("FOLISDK_ACTIVE").ok())?;
    let mut stdout = io::stdout();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &report)
            .context("failed writing status report")?;
        writeln!(stdout).context("failed writing status report")?;
        return Ok(());
    }
    for line in format_status_lines(&report, style) {
        writeln!(stdout, "{line}").context("failed writing status")?;
    }
    Ok(())
}

pub(crate) fn format_doctor_lines(
    layout: &SdkLayout,
    config_path: &Path,
    style: OutputStyle,
) -> Result<Vec<String>> {
    let mut lines = vec![
        render_status_line(
            style,
            "step",
            &format!("prefix: {}", layout.prefix().display()),
        ),
        render_status_line(style, "step", &format!("layout: {}", layout.kind())),
        render_status_line(
            style,
            "step",
            &format!("config: {}", config_path.display()),
        ),
    ];

    let host_bin = layout.host_bin_dir();
    if host_bin.is_dir() {
        lines.push(render_status_line(
            style,
            "ok",
            &format!("bin: {}", host_bin.display()),
        ));
    } else {
        lines.push(render_status_line(
            style,
            "err",
            &format!("bin: {} (missing)", host_bin.display()),
        ));
    }

    let arches = layout.installed_architectures()?;
    if arches.is_empty() {
        lines.push(render_status_line(
            style,
            "warn",
            "no architectures installed",
        ));
    }
    for arch in arches {
        lines.push(render_status_line(
            style,
            "ok",
            &format!(
                "{arch}: {} (sysroot {})",
                layout.triple(&arch),
                layout.sysroot_dir(&arch).display()
            ),
        ));
    }
    Ok(lines)
}
