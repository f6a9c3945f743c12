// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Version | Options | Inis | Scan | Load | Reload
//! ```

use std::process::ExitCode;

use hotmod::cli::global::GlobalOptions;
use hotmod::cli::{self, Command};
use hotmod::cmd::config::{run_inis_command, run_options_command};
use hotmod::cmd::reload::{run_load_command, run_reload_command};
use hotmod::cmd::scan::run_scan_command;
use hotmod::config::{CONFIG_FILE_NAME, Config, ENV_PREFIX};
use hotmod::config::loader::ConfigLoader;
use hotmod::logging::init_logging;
use hotmod::logging::{LogConfig, LogLevel};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        handle_version_command();
        return ExitCode::SUCCESS;
    }

    let config = load_config(&cli.global);
    let console_progress = !shows_progress_bar(cli.command.as_ref());
    let log_config = build_log_config(&cli.global, config.as_ref().ok(), console_progress);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, config).await
}

/// Commands whose progress bar prints tracker messages itself.
const fn shows_progress_bar(command: Option<&Command>) -> bool {
    match command {
        Some(Command::Load(args)) => !args.no_progress,
        Some(Command::Reload(args)) => !args.no_progress,
        _ => false,
    }
}

/// Logging follows the loaded config; without one, only the CLI flags count.
fn build_log_config(
    global: &GlobalOptions,
    config: Option<&Config>,
    console_progress: bool,
) -> LogConfig {
    let Some(config) = config else {
        let console_level = global
            .log_level
            .and_then(LogLevel::from_u8)
            .unwrap_or(LogLevel::INFO);
        return LogConfig::builder()
            .with_console_level(console_level)
            .with_file_level(console_level)
            .with_console_progress(console_progress)
            .build();
    };

    let log_file = config.global.log_file.as_os_str();
    LogConfig::builder()
        .with_console_level(config.global.output_log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(
            (!log_file.is_empty()).then(|| config.global.log_file.display().to_string()),
        )
        .with_console_progress(console_progress)
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: hotmod::error::Result<Config>) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Options) => config.map(|config| run_options_command(&config)),
        Some(Command::Inis) => build_config_loader(&cli.global).map(|loader| {
            run_inis_command(&loader.format_loaded_files());
        }),
        Some(Command::Scan(args)) => config.and_then(|config| run_scan_command(args, &config)),
        Some(Command::Load(args)) => match config {
            Ok(config) => run_load_command(args, &config).await,
            Err(e) => Err(e),
        },
        Some(Command::Reload(args)) => match config {
            Ok(config) => run_reload_command(args, &config).await,
            Err(e) => Err(e),
        },
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> hotmod::error::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional(CONFIG_FILE_NAME);
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    let mut loader = loader.with_env_prefix(ENV_PREFIX);
    for assignment in global.to_config_overrides() {
        loader = loader.set_override(&assignment)?;
    }
    Ok(loader)
}

fn load_config(global: &GlobalOptions) -> hotmod::error::Result<Config> {
    build_config_loader(global)?.build().map_err(|e| {
        eprintln!("Failed to load config: {e}");
        e
    })
}
