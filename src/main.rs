//! RA Event Log CLI
//!
//! Replays tagged sample batches through the event logger.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ra_event_log::{
    config::{Config, WriteFailurePolicy},
    core::{EVENT_LEGEND, VECTOR_LEGEND},
    source::{ReplayConfig, ReplaySource},
    stats::create_shared_log_with_persistence,
    EventLogger, LoggerSettings, COLUMN_LEGEND, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ra-event-log")]
#[command(version = VERSION)]
#[command(about = "Log detected events and vector timestamps to a text file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay tagged batches through the logger
    Run {
        /// JSON Lines batch file, `-` for stdin
        #[arg(long, short, default_value = "-")]
        input: PathBuf,

        /// Log file name (derived from the start time if empty)
        #[arg(long)]
        log_name: Option<String>,

        /// Directory for derived log file names
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Note written into the log header
        #[arg(long)]
        note: Option<String>,

        /// Channels per sample vector
        #[arg(long)]
        vlen: Option<usize>,

        /// Bandwidth recorded in the log header
        #[arg(long)]
        bandwidth: Option<f64>,

        /// Keep the watermark when a row cannot be written, so it is retried
        #[arg(long)]
        hold_on_write_failure: bool,
    },

    /// Show cumulative session statistics
    Status {
        /// Clear the stored statistics
        #[arg(long)]
        reset: bool,
    },

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },

    /// Describe the log columns
    Legend,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ra_event_log=info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            log_name,
            log_dir,
            note,
            vlen,
            bandwidth,
            hold_on_write_failure,
        } => {
            let mut config = Config::load().unwrap_or_else(|e| {
                tracing::warn!("Could not load config, using defaults: {e}");
                Config::default()
            });
            if let Some(log_name) = log_name {
                config.log_name = log_name;
            }
            if let Some(log_dir) = log_dir {
                config.log_dir = log_dir;
            }
            if let Some(note) = note {
                config.note = note;
            }
            if let Some(vlen) = vlen {
                config.vlen = vlen;
            }
            if let Some(bandwidth) = bandwidth {
                config.bandwidth = bandwidth;
            }
            if hold_on_write_failure {
                config.write_failure = WriteFailurePolicy::HoldWatermark;
            }
            cmd_run(&config, input)
        }
        Commands::Status { reset } => cmd_status(reset),
        Commands::Config { save } => cmd_config(save),
        Commands::Legend => {
            println!("{EVENT_LEGEND}");
            println!("{VECTOR_LEGEND}");
            println!("{COLUMN_LEGEND}");
            Ok(())
        }
    }
}

fn cmd_run(config: &Config, input: PathBuf) -> Result<()> {
    if config.vlen == 0 {
        anyhow::bail!("vector length must be positive");
    }
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create directories: {e}");
    }

    let session = create_shared_log_with_persistence(config.stats_path());
    let mut logger = EventLogger::with_session(LoggerSettings::from(config), Arc::clone(&session))
        .context("opening event log")?;

    let mut source = ReplaySource::new(ReplayConfig {
        input,
        vlen: config.vlen,
        channel_capacity: config.channel_capacity,
    });
    source.start().context("starting replay")?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")?;

    eprintln!("RA Event Log v{VERSION}");
    if let Some(path) = logger.log_path() {
        eprintln!("Logging to {}", path.display());
    }
    eprintln!("Press Ctrl+C to stop");

    let receiver = source.receiver().clone();
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(tagged) => {
                logger.work(&tagged.batch, &tagged.tags);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    source.stop();

    if let Err(e) = session.save() {
        tracing::warn!("Could not save session stats: {e}");
    }

    eprintln!();
    eprintln!("Events logged this run: {}", logger.event_count());
    eprintln!("{}", session.summary());
    Ok(())
}

fn cmd_status(reset: bool) -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("RA Event Log Status");
    println!("===================");
    println!();

    let stats_path = config.stats_path();
    if reset {
        let session = create_shared_log_with_persistence(stats_path.clone());
        session.reset();
        session
            .save()
            .with_context(|| format!("writing {}", stats_path.display()))?;
        println!("Session statistics cleared.");
        return Ok(());
    }

    if !stats_path.exists() {
        println!("No previous session data found.");
        return Ok(());
    }

    let content = std::fs::read_to_string(&stats_path)
        .with_context(|| format!("reading {}", stats_path.display()))?;
    let stats: serde_json::Value = serde_json::from_str(&content)?;

    println!("Cumulative Statistics:");
    for key in [
        "batches",
        "vectors",
        "tags_merged",
        "events_logged",
        "vectors_logged",
        "unknown_tags",
        "write_failures",
        "last_updated",
    ] {
        if let Some(value) = stats.get(key) {
            println!("  {key}: {value}");
        }
    }
    Ok(())
}

fn cmd_config(save: bool) -> Result<()> {
    let config = Config::load()?;
    if save {
        config.save().context("saving configuration")?;
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
