//! COSMIC Taildrop
//!
//! Desktop window for Tailscale's Taildrop: pick or drop files, choose an
//! online device from the tailnet and send them, or collect files waiting in
//! the local inbox.
//!
//! ```text
//!   ┌──────────────┐  Show/Hide/Quit  ┌───────────────────────┐
//!   │ panel applet │─────────────────▶│  cosmic-ext-taildrop  │
//!   └──────────────┘      D-Bus       │                       │
//!                                     │   tailscale status    │
//!                                     │   tailscale file cp   │
//!                                     │   tailscale file get  │
//!                                     └───────────────────────┘
//! ```
//!
//! Closing the window only hides it; the process exits through **Quit**.

use anyhow::{Context, Result};
use clap::Parser;
use cosmic::iced::{Limits, Size};
use cosmic_ext_taildrop_core::Preferences;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod dbus;
mod notifications;
mod portal;
mod views;

use app::{Flags, TaildropApp};

/// COSMIC Taildrop - send and receive files over Tailscale
#[derive(Parser, Debug)]
#[command(name = "cosmic-ext-taildrop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON structured logging
    #[arg(long)]
    json_logs: bool,

    /// Start with the window hidden
    #[arg(long)]
    hidden: bool,
}

/// Initialize logging; `RUST_LOG` wins over `--log-level`
fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = cli.log_level.parse::<Level>().with_context(|| {
        format!(
            "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
            cli.log_level
        )
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.as_str()))
        .context("Failed to create log filter")?;

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(
        "Logging initialized: level={}, json={}",
        log_level, cli.json_logs
    );
    Ok(())
}

fn main() -> cosmic::iced::Result {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{:#}", e);
    }

    info!("Starting COSMIC Taildrop {}", env!("CARGO_PKG_VERSION"));

    let preferences = Preferences::load().unwrap_or_else(|e| {
        warn!("Using default preferences: {}", e);
        Preferences::default()
    });

    let settings = cosmic::app::Settings::default()
        .size(Size::new(560.0, 680.0))
        .size_limits(Limits::NONE.min_width(420.0).min_height(520.0))
        .exit_on_close(false);

    cosmic::app::run::<TaildropApp>(
        settings,
        Flags {
            hidden: cli.hidden,
            preferences,
        },
    )
}
