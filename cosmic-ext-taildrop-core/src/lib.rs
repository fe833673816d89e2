//! COSMIC Taildrop core
//!
//! Everything behind the Taildrop window that does not need a display:
//! listing online tailnet devices, building and running `tailscale file`
//! commands, and the send/receive state machine that decides when a transfer
//! may start.
//!
//! ```text
//!  Orchestrator ──begin_send/receive──▶ TransferRequest ──▶ TransferInvoker
//!       ▲                                                       │
//!       └──────────────── complete(TransferOutcome) ◀───────────┘
//! ```

pub mod command;
pub mod orchestrator;
pub mod peers;
pub mod pending;
pub mod preferences;
pub mod transfer;

mod error;

pub use command::{CommandOutput, CommandRunner, ProcessRunner, TailscaleCli, ToolCommand};
pub use error::{QueryError, Result, TaildropError, TransferError, ValidationError};
pub use orchestrator::{Completion, Orchestrator, RefreshGeneration, SlotState};
pub use peers::{parse_status, Peer, PeerDirectory, PeerListing, PeerWarning};
pub use pending::PendingFiles;
pub use preferences::Preferences;
pub use transfer::{TransferEvent, TransferInvoker, TransferMode, TransferOutcome, TransferRequest};

/// Application ID shared by the window, the applet and the D-Bus service
pub const APP_ID: &str = "org.cosmicde.Taildrop";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_id() {
        assert_eq!(APP_ID, "org.cosmicde.Taildrop");
    }
}
