use std::ffi::{OsStr, OsString};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::Parser;
use folisdk_core::{ArchitectureId, LayoutKind, ManagedVar, SdkConfig, VarValue};
use folisdk_env::{
    ActivationError, ActivationManager, ActivationOptions, ActivationRequest, ActivationState,
    Deactivation, Environment, MemoryEnvironment,
};
use folisdk_locator::SdkLayout;

use super::*;
use crate::command_flows::{
    build_status_report, exec_with_environment, format_doctor_lines, format_status_lines,
    render_env_command, select_prefix, StatusReport,
};
use crate::render::{
    format_activation_error, format_deactivation_line, output_style_for, paint_status_line,
    render_status_line, OutputStyle,
};
use crate::session::{parse_session_line, CommandRunner, Session, SessionCommand};
use crate::shell_script::{render_env_script, resolve_script_shell, PromptUpdate};

fn test_root(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "folisdk-cli-test-{label}-{}-{nanos}",
        std::process::id()
    ));
    path
}

fn split_install(root: &Path, arches: &[&str]) -> SdkLayout {
    let host = root.join("folisdk-host");
    std::fs::create_dir_all(host.join("bin")).expect("must create host bin");
    for value in arches {
        let arch_prefix = root.join(format!("folisdk-{value}"));
        std::fs::create_dir_all(arch_prefix.join("bin")).expect("must create arch bin");
        std::fs::create_dir_all(
            arch_prefix
                .join(format!("{value}-strata-folios"))
                .join("sysroot"),
        )
        .expect("must create sysroot");
    }
    SdkLayout::new(host, LayoutKind::Split)
}

fn arch(value: &str) -> ArchitectureId {
    ArchitectureId::parse(value).expect("architecture must parse")
}

/// Records the variables each command would have seen.
struct RecordingRunner<'a> {
    seen: &'a mut Vec<(String, Option<OsString>, Option<OsString>)>,
    exit_code: i32,
}

impl CommandRunner for RecordingRunner<'_> {
    fn run(&mut self, line: &str, env: &dyn Environment) -> anyhow::Result<i32> {
        self.seen.push((
            line.to_string(),
            env.get(ManagedVar::Path.name()),
            env.get(ManagedVar::Cc.name()),
        ));
        Ok(self.exit_code)
    }
}

fn run_session(
    layout: SdkLayout,
    env: &mut MemoryEnvironment,
    input: &str,
    exit_code: i32,
) -> (Vec<String>, Vec<(String, Option<OsString>, Option<OsString>)>) {
    let manager = ActivationManager::new(layout);
    let mut seen = Vec::new();
    let mut output = Vec::new();
    {
        let runner = RecordingRunner {
            seen: &mut seen,
            exit_code,
        };
        let mut session = Session::new(&manager, env, runner, OutputStyle::Plain, false);
        session
            .run(Cursor::new(input.as_bytes()), &mut output)
            .expect("session must run");
    }
    let text = String::from_utf8(output).expect("output must be utf-8");
    (text.lines().map(str::to_string).collect(), seen)
}

#[test]
fn cli_parses_exec_with_trailing_command() {
    let cli = Cli::try_parse_from([
        "folisdk",
        "exec",
        "--path-only",
        "x86_64",
        "--",
        "make",
        "-j4",
    ])
    .expect("command must parse");

    match cli.command {
        Commands::Exec {
            path_only,
            arch,
            command,
        } => {
            assert!(path_only);
            assert_eq!(arch, "x86_64");
            assert_eq!(command, vec!["make".to_string(), "-j4".to_string()]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_exec_requires_a_command() {
    let err = Cli::try_parse_from(["folisdk", "exec", "x86_64"])
        .expect_err("exec without a command must fail");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn cli_env_passes_activation_flags_through() {
    let cli = Cli::try_parse_from([
        "folisdk",
        "--layout",
        "unified",
        "env",
        "--shell",
        "fish",
        "--arch=i686",
        "--path-only",
    ])
    .expect("command must parse");

    assert_eq!(cli.layout, Some(CliLayout::Unified));
    match cli.command {
        Commands::Env {
            shell,
            deactivate,
            args,
        } => {
            assert_eq!(shell, Some(CliShell::Fish));
            assert!(!deactivate);
            assert_eq!(
                args,
                vec!["--arch=i686".to_string(), "--path-only".to_string()]
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_env_deactivate_takes_no_architecture() {
    let cli = Cli::try_parse_from(["folisdk", "env", "--deactivate"]).expect("command must parse");
    assert!(matches!(
        cli.command,
        Commands::Env { deactivate: true, args, .. } if args.is_empty()
    ));

    let err = Cli::try_parse_from(["folisdk", "env"]).expect_err("env needs an architecture");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

    let err = Cli::try_parse_from(["folisdk", "env", "--deactivate", "x86_64"])
        .expect_err("deactivate with an architecture must fail");
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn cli_shell_accepts_optional_initial_activation() {
    let cli = Cli::try_parse_from(["folisdk", "shell"]).expect("command must parse");
    assert!(matches!(cli.command, Commands::Shell { activate } if activate.is_empty()));

    let cli = Cli::try_parse_from(["folisdk", "--prefix", "/opt/sdk", "shell", "x86_64"])
        .expect("command must parse");
    assert_eq!(cli.prefix, Some(PathBuf::from("/opt/sdk")));
    assert!(
        matches!(cli.command, Commands::Shell { activate } if activate == vec!["x86_64".to_string()])
    );
}

#[test]
fn cli_rejects_unknown_layout() {
    let err = Cli::try_parse_from(["folisdk", "--layout", "flat", "status"])
        .expect_err("unknown layout must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn output_style_is_rich_only_on_color_terminals() {
    assert_eq!(output_style_for(true, false), OutputStyle::Rich);
    assert_eq!(output_style_for(true, true), OutputStyle::Plain);
    assert_eq!(output_style_for(false, false), OutputStyle::Plain);
}

#[test]
fn render_status_line_adds_badges_in_rich_mode() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "activated"),
        "activated"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "ok", "activated"),
        "[OK] activated"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "inactive"),
        "[WARN] inactive"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "err", "missing"),
        "[ERR] missing"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "step", "prefix"),
        "[..] prefix"
    );
}

#[test]
fn paint_status_line_keeps_message_after_colored_badge() {
    assert_eq!(paint_status_line(OutputStyle::Plain, "err", "boom"), "boom");
    let painted = paint_status_line(OutputStyle::Rich, "err", "boom");
    assert!(painted.contains("[ERR]"));
    assert!(painted.ends_with(" boom"));
    assert!(painted.starts_with('\u{1b}'));
}

#[test]
fn deactivation_and_error_lines_match_expected_wording() {
    let (status, message) = format_deactivation_line(&Deactivation { arch: arch("x86_64") });
    assert_eq!(status, "ok");
    assert_eq!(
        message,
        "deactivated foliSDK (x86_64); returned to host environment"
    );

    let (status, message) = format_activation_error(&ActivationError::NotActive);
    assert_eq!(status, "warn");
    assert_eq!(message, "foliSDK is not currently active");
}

#[test]
fn parse_session_line_recognizes_builtins() {
    assert_eq!(parse_session_line("   "), SessionCommand::Empty);
    assert_eq!(
        parse_session_line("activate --arch=i686 --path-only"),
        SessionCommand::Activate(vec!["--arch=i686".to_string(), "--path-only".to_string()])
    );
    assert_eq!(
        parse_session_line("folisdk_activate x86_64"),
        SessionCommand::Activate(vec!["x86_64".to_string()])
    );
    assert_eq!(
        parse_session_line("folisdk_deactivate"),
        SessionCommand::Deactivate
    );
    assert_eq!(parse_session_line("status"), SessionCommand::Status);
    assert_eq!(parse_session_line("quit"), SessionCommand::Exit);
    assert_eq!(
        parse_session_line("  make -C src all "),
        SessionCommand::Run("make -C src all".to_string())
    );
}

#[test]
fn session_activates_runs_reactivates_and_restores_host_environment() {
    let root = test_root("session");
    let layout = split_install(&root, &["x86_64", "i686"]);
    let host_bin = layout.host_bin_dir();
    let x86_bin = layout.arch_bin_dir(&arch("x86_64"));

    let mut env = MemoryEnvironment::new()
        .with_var("PATH", "/usr/bin")
        .with_var("PS1", "$ ");
    let original = env.clone();

    let input = "activate x86_64\n\
                 cc --version\n\
                 status\n\
                 activate --arch=i686 --path-only\n\
                 status\n\
                 deactivate\n\
                 deactivate\n\
                 exit\n";
    let (lines, seen) = run_session(layout, &mut env, input, 0);

    assert_eq!(
        lines,
        vec![
            "activated foliSDK for architecture: x86_64".to_string(),
            "active: x86_64".to_string(),
            "deactivated foliSDK for architecture: x86_64".to_string(),
            "activated foliSDK for architecture: i686 (path only)".to_string(),
            "active: i686 (path only)".to_string(),
            "deactivated foliSDK (i686); returned to host environment".to_string(),
            "foliSDK is not currently active".to_string(),
        ]
    );

    assert_eq!(seen.len(), 1);
    let (line, path, cc) = &seen[0];
    assert_eq!(line, "cc --version");
    let mut expected_path =
        std::env::join_paths([host_bin, x86_bin]).expect("test paths must join");
    expected_path.push(":/usr/bin");
    assert_eq!(path.as_ref(), Some(&expected_path));
    assert_eq!(
        cc.as_deref(),
        Some(OsStr::new("x86_64-strata-folios-gcc"))
    );

    assert_eq!(env, original);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn session_unwinds_activation_at_end_of_input() {
    let root = test_root("session-eof");
    let layout = split_install(&root, &["x86_64"]);

    let mut env = MemoryEnvironment::new().with_var("PATH", "/usr/bin");
    let original = env.clone();

    let (lines, _) = run_session(layout, &mut env, "activate x86_64\n", 0);
    assert_eq!(
        lines,
        vec![
            "activated foliSDK for architecture: x86_64".to_string(),
            "deactivated foliSDK (x86_64); returned to host environment".to_string(),
        ]
    );
    assert_eq!(env, original);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn session_reports_errors_and_keeps_going() {
    let root = test_root("session-errors");
    let layout = split_install(&root, &["x86_64"]);
    let missing = root.join("folisdk-arm");

    let mut env = MemoryEnvironment::new().with_var("PATH", "/usr/bin");
    let original = env.clone();

    let input = "activate\nactivate arm\nactivate --bogus x86_64\nfalse\nstatus\n";
    let (lines, seen) = run_session(layout, &mut env, input, 2);

    assert_eq!(
        lines,
        vec![
            "invalid argument: no architecture specified".to_string(),
            format!("foliSDK not found at {}", missing.display()),
            "invalid argument: unrecognized option '--bogus'".to_string(),
            "command exited with status 2".to_string(),
            "active: none".to_string(),
        ]
    );
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].2, None);
    assert_eq!(env, original);
    let _ = std::fs::remove_dir_all(&root);
}

const PROMPT_MARK_SAVE: &str = r#"if [ -z "${_FOLISDK_PS1_SAVED+x}" ]; then _FOLISDK_PS1_SAVED=1; if [ -n "${PS1+x}" ]; then _FOLISDK_PS1="$PS1"; else unset _FOLISDK_PS1; fi; fi"#;
const PROMPT_RESTORE: &str = r#"if [ -n "${_FOLISDK_PS1_SAVED+x}" ]; then if [ -n "${_FOLISDK_PS1+x}" ]; then PS1="$_FOLISDK_PS1"; else unset PS1; fi; unset _FOLISDK_PS1 _FOLISDK_PS1_SAVED; fi"#;

#[test]
fn activation_script_quotes_values_per_shell() {
    let changes = vec![
        (
            "CFLAGS".to_string(),
            VarValue::Value(OsString::from("--sysroot=/opt/it's here")),
        ),
        ("PKG_CONFIG_DIR".to_string(), VarValue::Empty),
        ("CC".to_string(), VarValue::Unset),
    ];
    let id = arch("x86_64");

    assert_eq!(
        render_env_script(CliShell::Bash, "title", &changes, PromptUpdate::Mark(&id)),
        vec![
            "# title".to_string(),
            "export CFLAGS='--sysroot=/opt/it'\"'\"'s here'".to_string(),
            "export PKG_CONFIG_DIR=''".to_string(),
            "unset CC".to_string(),
            PROMPT_MARK_SAVE.to_string(),
            r#"PS1='(folisdk-x86_64) '"${_FOLISDK_PS1-}""#.to_string(),
        ]
    );
    assert_eq!(
        render_env_script(CliShell::Fish, "title", &changes, PromptUpdate::Mark(&id))[1..],
        [
            "set -gx CFLAGS '--sysroot=/opt/it\\'s here'".to_string(),
            "set -gx PKG_CONFIG_DIR ''".to_string(),
            "set -e CC".to_string(),
        ]
    );
    assert_eq!(
        render_env_script(CliShell::Powershell, "title", &changes, PromptUpdate::Restore)[1..],
        [
            "$env:CFLAGS = '--sysroot=/opt/it''s here'".to_string(),
            "$env:PKG_CONFIG_DIR = ''".to_string(),
            "Remove-Item Env:CC -ErrorAction SilentlyContinue".to_string(),
        ]
    );
    assert_eq!(
        render_env_script(CliShell::Zsh, "title", &[], PromptUpdate::Restore),
        vec!["# title".to_string(), PROMPT_RESTORE.to_string()]
    );
}

#[test]
fn resolve_script_shell_prefers_flag_then_shell_env_then_platform() {
    assert_eq!(
        resolve_script_shell(Some(CliShell::Zsh), Some("/usr/bin/fish"), false),
        CliShell::Zsh
    );
    assert_eq!(
        resolve_script_shell(None, Some("/usr/bin/fish"), false),
        CliShell::Fish
    );
    assert_eq!(
        resolve_script_shell(None, Some("/opt/weird-shell"), true),
        CliShell::Powershell
    );
    assert_eq!(resolve_script_shell(None, None, false), CliShell::Bash);
}

fn render_env(
    layout: SdkLayout,
    env: &MemoryEnvironment,
    shell: CliShell,
    deactivate: bool,
    args: &[&str],
) -> (anyhow::Result<Vec<String>>, String) {
    let manager = ActivationManager::new(layout);
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    let mut status = Vec::new();
    let script = render_env_command(
        &manager,
        env,
        shell,
        deactivate,
        &args,
        OutputStyle::Plain,
        &mut status,
    );
    (script, String::from_utf8(status).expect("status must be utf-8"))
}

/// Environment a shell is left with after evaluating `env <arch>`.
fn evaluated_activation(
    layout: SdkLayout,
    baseline: &MemoryEnvironment,
    value: &str,
) -> MemoryEnvironment {
    let manager = ActivationManager::new(layout);
    let request = ActivationRequest::new(
        value,
        ActivationOptions {
            keep_prompt: true,
            ..ActivationOptions::default()
        },
    )
    .expect("request must build");
    let mut env = baseline.clone();
    manager
        .activate(&mut ActivationState::new(), &mut env, &request)
        .expect("activation must work");
    env
}

#[test]
fn env_script_lists_only_changed_variables_and_leaves_prompt_to_shell() {
    let root = test_root("env-script");
    let layout = split_install(&root, &["x86_64"]);
    let env = MemoryEnvironment::new()
        .with_var("PATH", "/usr/bin")
        .with_var("RANLIB", "true");

    let (script, status) = render_env(layout.clone(), &env, CliShell::Bash, false, &["x86_64"]);
    let script = script.expect("env must render");

    assert_eq!(script[0], "# foliSDK activation for x86_64");
    assert!(script.contains(&"export FOLISDK_ACTIVE='x86_64'".to_string()));
    assert!(script.contains(&"export CC='x86_64-strata-folios-gcc'".to_string()));
    assert!(script.contains(&"export PKG_CONFIG_DIR=''".to_string()));
    assert!(script.contains(&"export _OLD_FOLISDK_PATH='/usr/bin'".to_string()));
    assert!(!script.iter().any(|line| line.contains("RANLIB")));
    assert!(!script.iter().any(|line| line.starts_with("export PS1")));
    assert_eq!(
        script[script.len() - 2..],
        [
            PROMPT_MARK_SAVE.to_string(),
            r#"PS1='(folisdk-x86_64) '"${_FOLISDK_PS1-}""#.to_string(),
        ]
    );
    assert!(status.is_empty());

    let (script, _) = render_env(layout, &env, CliShell::Fish, false, &["x86_64"]);
    let script = script.expect("env must render");
    assert!(!script.iter().any(|line| line.contains("PS1")));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn env_script_over_evaluated_activation_replaces_it() {
    let root = test_root("env-stack");
    let layout = split_install(&root, &["x86_64", "i686"]);
    let host_bin = layout.host_bin_dir();
    let i686_bin = layout.arch_bin_dir(&arch("i686"));
    let baseline = MemoryEnvironment::new().with_var("PATH", "/usr/bin");
    let active = evaluated_activation(layout.clone(), &baseline, "x86_64");

    let (script, _) = render_env(layout, &active, CliShell::Bash, false, &["i686"]);
    let script = script.expect("env must render");

    let mut expected_path =
        std::env::join_paths([host_bin, i686_bin]).expect("test paths must join");
    expected_path.push(":/usr/bin");
    assert_eq!(script[0], "# foliSDK activation for i686");
    assert!(script.contains(&format!(
        "export PATH='{}'",
        expected_path.to_string_lossy()
    )));
    assert!(script.contains(&"export FOLISDK_ACTIVE='i686'".to_string()));
    assert!(script.contains(&"export CC='i686-strata-folios-gcc'".to_string()));
    assert!(!script.iter().any(|line| line.contains("folisdk-x86_64")));
    assert!(!script.iter().any(|line| line.contains("_OLD_FOLISDK_PATH")));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn env_deactivate_script_returns_to_baseline() {
    let root = test_root("env-deactivate");
    let layout = split_install(&root, &["x86_64"]);
    let baseline = MemoryEnvironment::new().with_var("PATH", "/usr/bin");
    let active = evaluated_activation(layout.clone(), &baseline, "x86_64");

    let (script, status) = render_env(layout, &active, CliShell::Bash, true, &[]);
    let script = script.expect("deactivate must render");

    assert_eq!(script[0], "# foliSDK deactivation of x86_64");
    for line in [
        "export PATH='/usr/bin'",
        "unset FOLISDK_ACTIVE",
        "unset CC",
        "unset PKG_CONFIG_DIR",
        "unset _OLD_FOLISDK_PATH",
        "unset _OLD_FOLISDK_VARS",
    ] {
        assert!(script.contains(&line.to_string()), "missing {line}");
    }
    assert_eq!(script.last().map(String::as_str), Some(PROMPT_RESTORE));
    assert!(status.is_empty());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn env_deactivate_without_activation_warns_and_prints_nothing() {
    let root = test_root("env-inactive");
    let layout = split_install(&root, &["x86_64"]);
    let env = MemoryEnvironment::new().with_var("PATH", "/usr/bin");

    let (script, status) = render_env(layout, &env, CliShell::Bash, true, &[]);
    assert!(script.expect("inactive deactivate is not an error").is_empty());
    assert_eq!(status, "foliSDK is not currently active\n");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn env_over_marker_without_saved_state_is_refused() {
    let root = test_root("env-bare-marker");
    let layout = split_install(&root, &["x86_64", "i686"]);
    let env = MemoryEnvironment::new()
        .with_var("PATH", "/opt/sdk/bin:/usr/bin")
        .with_var("PS1", "(folisdk-x86_64) $ ")
        .with_var("FOLISDK_ACTIVE", "x86_64");

    for deactivate in [false, true] {
        let args: &[&str] = if deactivate { &[] } else { &["i686"] };
        let (script, _) = render_env(layout.clone(), &env, CliShell::Bash, deactivate, args);
        let err = script.expect_err("a bare marker cannot be unwound");
        assert!(matches!(
            err.downcast_ref::<ActivationError>(),
            Some(ActivationError::StateMissing { marker }) if marker == "x86_64"
        ));
    }
    let _ = std::fs::remove_dir_all(&root);
}

fn exec_in(
    layout: SdkLayout,
    env: &mut MemoryEnvironment,
    command: &[&str],
) -> (i32, Vec<String>) {
    let manager = ActivationManager::new(layout);
    let request = folisdk_env::parse_activate_args(["x86_64"]).expect("args must parse");
    let command: Vec<String> = command.iter().map(|part| part.to_string()).collect();
    let mut status = Vec::new();
    let code = exec_with_environment(
        &manager,
        env,
        &request,
        &command,
        OutputStyle::Plain,
        &mut status,
    )
    .expect("exec must run");
    let status = String::from_utf8(status).expect("status must be utf-8");
    (code, status.lines().map(str::to_string).collect())
}

fn host_path() -> OsString {
    std::env::var_os("PATH")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| OsString::from("/usr/bin:/bin"))
}

#[cfg(unix)]
#[test]
fn exec_runs_command_in_activation_and_returns_its_exit_code() {
    let root = test_root("exec");
    let layout = split_install(&root, &["x86_64"]);
    let mut env = MemoryEnvironment::new().with_var("PATH", host_path());
    let original = env.clone();

    let (code, status) = exec_in(
        layout.clone(),
        &mut env,
        &[
            "sh",
            "-c",
            r#"test "$CC" = x86_64-strata-folios-gcc && test "$FOLISDK_ACTIVE" = x86_64 && test -n "$_OLD_FOLISDK_VARS""#,
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(
        status,
        vec![
            "activated foliSDK for architecture: x86_64".to_string(),
            "deactivated foliSDK (x86_64); returned to host environment".to_string(),
        ]
    );
    assert_eq!(env, original);

    let (code, _) = exec_in(layout.clone(), &mut env, &["true"]);
    assert_eq!(code, 0);
    let (code, _) = exec_in(layout, &mut env, &["false"]);
    assert_eq!(code, 1);
    assert_eq!(env, original);
    let _ = std::fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[test]
fn exec_unwinds_inherited_activation_before_running() {
    let root = test_root("exec-inherited");
    let layout = split_install(&root, &["x86_64", "i686"]);
    let baseline = MemoryEnvironment::new().with_var("PATH", host_path());
    let mut env = evaluated_activation(layout.clone(), &baseline, "i686");

    let (code, status) = exec_in(
        layout,
        &mut env,
        &[
            "sh",
            "-c",
            r#"case "$PATH" in *folisdk-i686*) exit 3;; esac; test "$CC" = x86_64-strata-folios-gcc"#,
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(
        status,
        vec![
            "deactivated foliSDK for architecture: i686".to_string(),
            "activated foliSDK for architecture: x86_64".to_string(),
            "deactivated foliSDK (x86_64); returned to host environment".to_string(),
        ]
    );
    assert_eq!(env, baseline);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn select_prefix_prefers_flag_then_env_then_config() {
    let config = SdkConfig {
        prefix: Some(PathBuf::from("/from/config")),
        ..SdkConfig::default()
    };

    assert_eq!(
        select_prefix(
            Some(Path::new("/from/flag")),
            Some(OsString::from("/from/env")),
            &config
        ),
        Some(PathBuf::from("/from/flag"))
    );
    assert_eq!(
        select_prefix(None, Some(OsString::from("/from/env")), &config),
        Some(PathBuf::from("/from/env"))
    );
    assert_eq!(
        select_prefix(None, Some(OsString::new()), &config),
        Some(PathBuf::from("/from/config"))
    );
    assert_eq!(select_prefix(None, None, &SdkConfig::default()), None);
}

#[test]
fn status_report_lists_installed_architectures() {
    let root = test_root("status");
    let layout = split_install(&root, &["x86_64", "i686"]);

    let report = build_status_report(&layout, Some("i686".to_string())).expect("must report");
    assert_eq!(
        report,
        StatusReport {
            active: Some("i686".to_string()),
            prefix: layout.prefix().display().to_string(),
            layout: "split".to_string(),
            installed: vec!["i686".to_string(), "x86_64".to_string()],
        }
    );

    let json = serde_json::to_value(&report).expect("must serialize");
    assert_eq!(json["active"], "i686");
    assert_eq!(json["installed"][1], "x86_64");

    let lines = format_status_lines(&report, OutputStyle::Plain);
    assert_eq!(lines[0], "active: i686");
    assert_eq!(lines[3], "installed: i686, x86_64");

    let inactive = build_status_report(&layout, Some(String::new())).expect("must report");
    assert_eq!(inactive.active, None);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn doctor_flags_missing_host_bin() {
    let root = test_root("doctor");
    let layout = SdkLayout::new(root.join("folisdk-host"), LayoutKind::Split);

    let lines = format_doctor_lines(&layout, Path::new("/etc/folisdk.toml"), OutputStyle::Rich)
        .expect("doctor must run");
    assert!(lines.contains(&"[..] config: /etc/folisdk.toml".to_string()));
    assert!(lines.iter().any(|line| line.starts_with("[ERR] bin: ") && line.ends_with("(missing)")));
    assert!(lines.contains(&"[WARN] no architectures installed".to_string()));
}
