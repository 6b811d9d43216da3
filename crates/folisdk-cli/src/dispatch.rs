use std::io;

use anyhow::Result;
use tracing::debug;

use crate::command_flows::{
    build_layout, format_doctor_lines, load_settings_config, run_env_command, run_exec_command,
    run_shell_command, run_status_command, LayoutSettings,
};
use crate::render::current_output_style;
use crate::shell_script::write_completions_script;
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<i32> {
    let settings = LayoutSettings {
        prefix: cli.prefix,
        layout: cli.layout.map(Into::into),
        config: cli.config,
    };

    match cli.command {
        Commands::Shell { activate } => {
            let (_, config) = load_settings_config(&settings)?;
            let layout = build_layout(&settings, &config)?;
            debug!(prefix = %layout.prefix().display(), "starting session");
            run_shell_command(layout, &activate, current_output_style())?;
        }
        Commands::Exec {
            path_only,
            arch,
            command,
        } => {
            let (_, config) = load_settings_config(&settings)?;
            let layout = build_layout(&settings, &config)?;
            return run_exec_command(layout, &arch, path_only, &command, current_output_style());
        }
        Commands::Env {
            shell,
            deactivate,
            args,
        } => {
            let (_, config) = load_settings_config(&settings)?;
            let layout = build_layout(&settings, &config)?;
            let style = current_output_style();
            for line in run_env_command(layout, shell, deactivate, &args, style)? {
                println!("{line}");
            }
        }
        Commands::Status { json } => {
            let (_, config) = load_settings_config(&settings)?;
            let layout = build_layout(&settings, &config)?;
            run_status_command(&layout, json, current_output_style())?;
        }
        Commands::Doctor => {
            let (config_path, config) = load_settings_config(&settings)?;
            let layout = build_layout(&settings, &config)?;
            for line in format_doctor_lines(&layout, &config_path, current_output_style())? {
                println!("{line}");
            }
        }
        Commands::Completions { shell } => {
            let mut stdout = io::stdout();
            write_completions_script(shell, &mut stdout)?;
        }
        Commands::Version => {
            println!("folisdk {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(0)
}
