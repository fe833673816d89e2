//! Device directory
//!
//! Lists the online peers of the tailnet by asking `tailscale status --json`
//! and keeping only what the destination selector needs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::command::{CommandRunner, TailscaleCli, ToolCommand};
use crate::error::QueryError;

/// A device reachable on the tailnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Opaque node key from the status report
    pub id: String,
    /// Host name shown to the user
    pub display_name: String,
    /// First tailnet address, used as the `file cp` target
    pub address: String,
    pub online: bool,
}

impl Peer {
    /// Label for the destination selector
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.address)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.display_name, self.address)
    }
}

/// A single peer record that could not be listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerWarning {
    pub display_name: String,
    pub reason: String,
}

impl fmt::Display for PeerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for host: {}", self.reason, self.display_name)
    }
}

/// Result of one directory query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerListing {
    /// Online peers, sorted by display name
    pub peers: Vec<Peer>,
    /// Online peers dropped because their record was unusable
    pub warnings: Vec<PeerWarning>,
}

impl PeerListing {
    /// Status line text for this listing
    pub fn summary(&self) -> String {
        format!("Found {} devices", self.peers.len())
    }

    /// One line per skipped peer, `None` when nothing was skipped
    pub fn warning_text(&self) -> Option<String> {
        if self.warnings.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.warnings.iter().map(ToString::to_string).collect();
        Some(lines.join("\n"))
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Peer> {
        self.peers.get(index)
    }

    pub fn position(&self, peer_id: &str) -> Option<usize> {
        self.peers.iter().position(|p| p.id == peer_id)
    }
}

#[derive(Debug, Deserialize)]
struct StatusReport {
    #[serde(rename = "Peer", default)]
    peer: Option<BTreeMap<String, PeerRecord>>,
}

#[derive(Debug, Deserialize)]
struct PeerRecord {
    #[serde(rename = "HostName", default)]
    host_name: Option<String>,
    #[serde(rename = "TailscaleIPs", default)]
    tailscale_ips: Option<Vec<String>>,
    #[serde(rename = "Online", default)]
    online: bool,
}

/// Parse the output of `tailscale status --json`
///
/// Offline peers are dropped silently. An online peer without any tailnet
/// address is dropped with a [`PeerWarning`]; the rest of the listing is
/// unaffected.
pub fn parse_status(json: &str) -> Result<PeerListing, QueryError> {
    let report: StatusReport = serde_json::from_str(json)?;
    let mut listing = PeerListing::default();

    for (id, record) in report.peer.unwrap_or_default() {
        let display_name = record
            .host_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        if !record.online {
            debug!("Device {} is offline", display_name);
            continue;
        }

        let address = record
            .tailscale_ips
            .unwrap_or_default()
            .into_iter()
            .find(|ip| !ip.is_empty());

        let Some(address) = address else {
            let warning = PeerWarning {
                display_name,
                reason: "Could not get tailnet IP".to_string(),
            };
            warn!("{}", warning);
            listing.warnings.push(warning);
            continue;
        };

        listing.peers.push(Peer {
            id,
            display_name,
            address,
            online: true,
        });
    }

    listing.peers.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(listing)
}

/// Client for the tailnet device directory
#[derive(Clone)]
pub struct PeerDirectory<R> {
    runner: Arc<R>,
    cli: TailscaleCli,
}

impl<R: CommandRunner> PeerDirectory<R> {
    pub fn new(runner: Arc<R>, cli: TailscaleCli) -> Self {
        Self { runner, cli }
    }

    /// Query the tool and list the online peers
    pub async fn list_online_peers(&self) -> Result<PeerListing, QueryError> {
        let command = ToolCommand::status(&self.cli);
        let output = self
            .runner
            .run(&command)
            .await
            .map_err(QueryError::Launch)?;

        if !output.success() {
            return Err(QueryError::Failed {
                code: output.code,
                stderr: output.stderr,
            });
        }

        let listing = parse_status(&output.stdout)?;
        info!(
            "Listed {} online devices ({} skipped)",
            listing.peers.len(),
            listing.warnings.len()
        );
        Ok(listing)
    }
}
