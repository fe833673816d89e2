//! DBus Client for the Taildrop Applet
//!
//! Talks to the window's session bus service; starts the window when
//! nothing answers.

use anyhow::{Context, Result};
use cosmic_ext_taildrop_core::APP_ID;
use tracing::{debug, info, warn};
use zbus::{proxy, Connection};

/// Binary started when the service is not running
pub const GUI_BINARY: &str = "cosmic-ext-taildrop";

/// DBus proxy for the Taildrop window
#[proxy(
    interface = "org.cosmicde.Taildrop",
    default_service = "org.cosmicde.Taildrop",
    default_path = "/org/cosmicde/Taildrop"
)]
trait Taildrop {
    /// Show and focus the window
    async fn show(&self) -> zbus::Result<()>;

    /// Exit the application
    async fn quit(&self) -> zbus::Result<()>;

    /// Liveness check
    async fn ping(&self) -> zbus::Result<String>;
}

/// DBus client for the window service
pub struct DbusClient {
    proxy: TaildropProxy<'static>,
}

impl DbusClient {
    pub async fn connect() -> Result<Self> {
        let connection = Connection::session()
            .await
            .context("Failed to connect to session bus")?;

        let proxy = TaildropProxy::new(&connection)
            .await
            .context("Failed to create proxy")?;

        Ok(Self { proxy })
    }

    /// Whether the window process is running
    pub async fn is_running(&self) -> bool {
        match self.proxy.ping().await {
            Ok(reply) => reply == "pong",
            Err(e) => {
                debug!("{} is not answering: {}", APP_ID, e);
                false
            }
        }
    }

    pub async fn show(&self) -> Result<()> {
        self.proxy.show().await.context("Show failed")
    }

    pub async fn quit(&self) -> Result<()> {
        self.proxy.quit().await.context("Quit failed")
    }
}

/// Check whether the window service is up
pub async fn is_running() -> bool {
    match DbusClient::connect().await {
        Ok(client) => client.is_running().await,
        Err(e) => {
            warn!("{:#}", e);
            false
        }
    }
}

/// Show the window, starting it first if needed
pub async fn show_window() -> Result<()> {
    let client = DbusClient::connect().await?;

    if client.is_running().await {
        return client.show().await;
    }

    info!("Starting {}", GUI_BINARY);
    tokio::process::Command::new(GUI_BINARY)
        .spawn()
        .with_context(|| format!("Failed to start {}", GUI_BINARY))?;
    Ok(())
}

/// Quit the window process if it is running
pub async fn quit_window() -> Result<()> {
    let client = DbusClient::connect().await?;

    if !client.is_running().await {
        debug!("Nothing to quit");
        return Ok(());
    }

    client.quit().await
}
