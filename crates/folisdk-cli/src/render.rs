use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use folisdk_env::{Activation, ActivationError, Deactivation};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    output_style_for(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    )
}

pub(crate) fn output_style_for(is_terminal: bool, no_color: bool) -> OutputStyle {
    if is_terminal && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        _ => "[..]",
    }
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "ok" => AnsiColor::BrightGreen,
        "warn" => AnsiColor::BrightYellow,
        "err" => AnsiColor::BrightRed,
        _ => AnsiColor::BrightBlue,
    };
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

/// Status line with an ASCII badge in rich mode and no decoration in plain mode.
pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

/// Like [`render_status_line`] with the badge colored for a terminal.
pub(crate) fn paint_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!(
            "{} {message}",
            colorize(status_style(status), status_badge(status))
        ),
    }
}

pub(crate) fn format_activation_lines(activation: &Activation) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();
    if let Some(previous) = &activation.replaced {
        lines.push(("step", format!("deactivated foliSDK for architecture: {previous}")));
    }
    let mode = if activation.path_only {
        " (path only)"
    } else {
        ""
    };
    lines.push((
        "ok",
        format!(
            "activated foliSDK for architecture: {}{mode}",
            activation.arch
        ),
    ));
    lines
}

pub(crate) fn format_deactivation_line(deactivation: &Deactivation) -> (&'static str, String) {
    (
        "ok",
        format!(
            "deactivated foliSDK ({}); returned to host environment",
            deactivation.arch
        ),
    )
}

pub(crate) fn format_activation_error(err: &ActivationError) -> (&'static str, String) {
    match err {
        ActivationError::NotActive => ("warn", err.to_string()),
        _ => ("err", err.to_string()),
    }
}
