use std::io::{BufRead, Write};
use std::process::Command;

use anyhow::{Context, Result};
use folisdk_env::{parse_activate_args, ActivationManager, ActivationState, Environment};
use folisdk_locator::ToolchainLocator;
use tracing::debug;

use crate::render::{
    format_activation_error, format_activation_lines, format_deactivation_line,
    paint_status_line, OutputStyle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    Activate(Vec<String>),
    Deactivate,
    Status,
    Help,
    Exit,
    Run(String),
    Empty,
}

pub(crate) fn parse_session_line(line: &str) -> SessionCommand {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let Some(first) = words.next() else {
        return SessionCommand::Empty;
    };
    match first {
        "activate" | "folisdk_activate" => {
            SessionCommand::Activate(words.map(str::to_string).collect())
        }
        "deactivate" | "folisdk_deactivate" => SessionCommand::Deactivate,
        "status" => SessionCommand::Status,
        "help" => SessionCommand::Help,
        "exit" | "quit" => SessionCommand::Exit,
        _ => SessionCommand::Run(trimmed.to_string()),
    }
}

/// Runs non-builtin session lines.
pub(crate) trait CommandRunner {
    fn run(&mut self, line: &str, env: &dyn Environment) -> Result<i32>;
}

/// Runs lines through `sh -c`; children inherit the process environment.
pub(crate) struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, line: &str, _env: &dyn Environment) -> Result<i32> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(line)
            .status()
            .with_context(|| format!("failed to run command: {line}"))?;
        Ok(status.code().unwrap_or(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive session owning the activation state for its whole lifetime.
pub(crate) struct Session<'a, L, E, R> {
    manager: &'a ActivationManager<L>,
    env: &'a mut E,
    runner: R,
    style: OutputStyle,
    interactive: bool,
    state: ActivationState,
}

impl<'a, L, E, R> Session<'a, L, E, R>
where
    L: ToolchainLocator,
    E: Environment,
    R: CommandRunner,
{
    pub(crate) fn new(
        manager: &'a ActivationManager<L>,
        env: &'a mut E,
        runner: R,
        style: OutputStyle,
        interactive: bool,
    ) -> Self {
        Self {
            manager,
            env,
            runner,
            style,
            interactive,
            state: ActivationState::new(),
        }
    }

    /// Continues from an activation inherited from the parent environment.
    pub(crate) fn resume(mut self, state: ActivationState) -> Self {
        self.state = state;
        self
    }

    /// Processes lines until `exit` or end of input, then unwinds any
    /// activation still in effect.
    pub(crate) fn run<I: BufRead, W: Write>(&mut self, input: I, out: &mut W) -> Result<()> {
        self.write_prompt(out)?;
        for line in input.lines() {
            let line = line.context("failed reading session input")?;
            if self.handle(parse_session_line(&line), out)? == Flow::Exit {
                break;
            }
            self.write_prompt(out)?;
        }

        if self.state.is_active() {
            self.deactivate(out)?;
        }
        Ok(())
    }

    pub(crate) fn activate<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let result = parse_activate_args(args).and_then(|request| {
            self.manager
                .activate(&mut self.state, &mut *self.env, &request)
        });
        match result {
            Ok(activation) => {
                for (status, message) in format_activation_lines(&activation) {
                    self.status(out, status, &message)?;
                }
                Ok(())
            }
            Err(err) => {
                debug!(kind = err.kind(), %err, "session command failed");
                let (status, message) = format_activation_error(&err);
                self.status(out, status, &message)?;
                if err.is_fatal() {
                    return Err(err.into());
                }
                Ok(())
            }
        }
    }

    fn deactivate<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.manager.deactivate(&mut self.state, &mut *self.env) {
            Ok(deactivation) => {
                let (status, message) = format_deactivation_line(&deactivation);
                self.status(out, status, &message)
            }
            Err(err) => {
                debug!(kind = err.kind(), %err, "session command failed");
                let (status, message) = format_activation_error(&err);
                self.status(out, status, &message)?;
                if err.is_fatal() {
                    return Err(err.into());
                }
                Ok(())
            }
        }
    }

    fn handle<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> Result<Flow> {
        match command {
            SessionCommand::Activate(args) => self.activate(&args, out)?,
            SessionCommand::Deactivate => self.deactivate(out)?,
            SessionCommand::Status => {
                let message = match (self.state.active_arch(), self.state.active_options()) {
                    (Some(arch), Some(options)) if options.path_only => {
                        format!("active: {arch} (path only)")
                    }
                    (Some(arch), _) => format!("active: {arch}"),
                    (None, _) => "active: none".to_string(),
                };
                self.status(out, "step", &message)?;
            }
            SessionCommand::Help => {
                for line in [
                    "activate <arch> [--path-only]   activate a toolchain (also --arch=<arch>)",
                    "deactivate                      restore the environment",
                    "status                          show the active toolchain",
                    "exit                            leave the session",
                    "<command>                       run a command through sh -c",
                ] {
                    writeln!(out, "{line}").context("failed writing session output")?;
                }
            }
            SessionCommand::Exit => return Ok(Flow::Exit),
            SessionCommand::Run(line) => {
                debug!(%line, "running session command");
                let code = self.runner.run(&line, &*self.env)?;
                if code != 0 {
                    self.status(out, "warn", &format!("command exited with status {code}"))?;
                }
            }
            SessionCommand::Empty => {}
        }
        Ok(Flow::Continue)
    }

    fn status<W: Write>(&self, out: &mut W, status: &str, message: &str) -> Result<()> {
        writeln!(out, "{}", paint_status_line(self.style, status, message))
            .context("failed writing session output")
    }

    fn write_prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let marker = self
            .state
            .active_arch()
            .map(|arch| arch.prompt_marker())
            .unwrap_or_default();
        write!(out, "{marker}folisdk> ").context("failed writing session prompt")?;
        out.flush().context("failed flushing session prompt")
    }
}
