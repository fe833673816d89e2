//! D-Bus Service Module
//!
//! Lets the panel applet (or anything on the session bus) show, hide and quit
//! the running window.

use cosmic_ext_taildrop_core::APP_ID;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use zbus::{connection, interface, Connection};

/// Object path of the service
pub const OBJECT_PATH: &str = "/org/cosmicde/Taildrop";

/// Commands delivered to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbusCommand {
    Show,
    Hide,
    Quit,
}

/// D-Bus service for the Taildrop window
pub struct TaildropService {
    sender: mpsc::Sender<DbusCommand>,
}

impl TaildropService {
    pub fn new(sender: mpsc::Sender<DbusCommand>) -> Self {
        Self { sender }
    }

    async fn forward(&self, command: DbusCommand) {
        if let Err(e) = self.sender.send(command).await {
            error!("Failed to forward {:?} to the window: {}", command, e);
        }
    }
}

#[interface(name = "org.cosmicde.Taildrop")]
impl TaildropService {
    /// Show and focus the window
    async fn show(&self) {
        debug!("D-Bus: show");
        self.forward(DbusCommand::Show).await;
    }

    /// Hide the window, keeping the process alive
    async fn hide(&self) {
        debug!("D-Bus: hide");
        self.forward(DbusCommand::Hide).await;
    }

    /// Exit the application
    async fn quit(&self) {
        debug!("D-Bus: quit");
        self.forward(DbusCommand::Quit).await;
    }

    /// Ping to check if service is alive
    fn ping(&self) -> String {
        "pong".to_string()
    }
}

/// Claim the bus name and start serving
pub async fn start_dbus_service(sender: mpsc::Sender<DbusCommand>) -> zbus::Result<Connection> {
    let service = TaildropService::new(sender);

    let connection = connection::Builder::session()?
        .name(APP_ID)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await?;

    info!("D-Bus service started: {}", APP_ID);

    Ok(connection)
}
