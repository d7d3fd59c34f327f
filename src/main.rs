use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use sysinfo::System;

use calmee_audio::audio_system::{AudioManager, RodioBackend, TrackKey};
use calmee_audio::{AppResult, AudioCommand, CommandResult, Config};

const LOG_TARGET_STARTUP: &str = "calmee_audio::startup";
const FRAME: Duration = Duration::from_millis(16);

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/Calmee/logs/calmee-audio.YYYY-MM-DD.log`.
/// Debug builds also log to the console.
fn initialize_tracing(default_filter: &str) {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("Calmee").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "calmee-audio.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting calmee-audio v{} on ({})",
        version,
        std::env::consts::ARCH
    );
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
}

fn print_usage() {
    println!("Usage:");
    println!("  calmee-audio list");
    println!("  calmee-audio play <track> [seconds]");
    println!("  calmee-audio fade <from> <to> [fade-ms] [seconds]");
}

fn parse_key(arg: Option<&String>) -> AppResult<TrackKey> {
    let arg = arg.context("missing track name (see `calmee-audio list`)")?;
    Ok(arg.parse::<TrackKey>()?)
}

fn parse_number(arg: Option<&String>, default: u64, what: &str) -> AppResult<u64> {
    match arg {
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid {what}: {value}")),
        None => Ok(default),
    }
}

fn list_tracks(config: &Config) {
    println!("Tracks (assets under {}):", config.asset_root.display());
    for entry in config.catalog() {
        println!(
            "  {:<22} {:<20} vol {:.2}{}",
            entry.key.as_str(),
            entry.key.display_name(),
            entry.volume,
            if entry.looping { "  (loop)" } else { "" }
        );
    }
}

/// Keep fades moving in real time for a while
fn run_for(manager: &mut AudioManager, total: Duration) {
    let start = Instant::now();
    while start.elapsed() < total {
        manager.pump();
        thread::sleep(FRAME);
    }
}

fn execute(manager: &mut AudioManager, command: AudioCommand) -> AppResult<()> {
    let description = command.description();
    match command.apply(manager) {
        CommandResult::Success => {
            println!("✓ {}", description);
            Ok(())
        }
        CommandResult::Error(message) => bail!("{}: {}", description, message),
    }
}

fn open_manager(config: &Config) -> AppResult<AudioManager> {
    let backend = RodioBackend::try_default().context("no audio output device")?;
    let mut manager = AudioManager::from_config(Box::new(backend), config);

    // Launching from a terminal is the user's gesture
    manager.gate().open();

    for (key, err) in manager.register_multiple(config.catalog()) {
        eprintln!("✗ Failed to register {}: {}", key, err);
    }
    Ok(manager)
}

fn main() -> AppResult<()> {
    // Tracing needs the config's filter, so report how it was loaded afterwards
    let (config, first_run) = Config::load_or_create().with_context(|| {
        format!("failed to load config from {}", Config::config_path_display())
    })?;

    initialize_tracing(&config.log_filter);
    log_runtime_environment();
    if first_run {
        tracing::info!(
            target: LOG_TARGET_STARTUP,
            "Created default config at {}",
            Config::config_path_display()
        );
    } else {
        tracing::info!(
            target: LOG_TARGET_STARTUP,
            "Loaded config from {}",
            Config::config_path_display()
        );
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("list") => {
            list_tracks(&config);
        }
        Some("play") => {
            let key = parse_key(args.get(1))?;
            let seconds = parse_number(args.get(2), 10, "seconds")?;

            let mut manager = open_manager(&config)?;
            execute(&mut manager, AudioCommand::Play { key })?;
            run_for(&mut manager, Duration::from_secs(seconds));
            manager.cleanup();
        }
        Some("fade") => {
            let from = parse_key(args.get(1))?;
            let to = parse_key(args.get(2))?;
            let fade_ms = parse_number(args.get(3), config.fade.default_duration_ms, "fade-ms")?;
            let seconds = parse_number(args.get(4), 10, "seconds")?;

            let mut manager = open_manager(&config)?;
            execute(&mut manager, AudioCommand::Play { key: from })?;
            run_for(&mut manager, Duration::from_secs(seconds) / 2);
            execute(
                &mut manager,
                AudioCommand::Fade {
                    from,
                    to,
                    duration: Some(Duration::from_millis(fade_ms)),
                },
            )?;
            run_for(&mut manager, Duration::from_secs(seconds) / 2);
            manager.cleanup();
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}
