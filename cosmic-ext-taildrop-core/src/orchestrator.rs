//! Transfer orchestration
//!
//! Holds everything the window shows and decides when a transfer may start.
//! The transfer slot is a two-state machine:
//!
//! ```text
//!          begin_send / begin_receive
//!   Idle ─────────────────────────────▶ InFlight
//!    ▲                                     │
//!    └──────────── complete(outcome) ──────┘
//! ```
//!
//! While the slot is `InFlight` every mutating operation is refused with
//! [`ValidationError::Busy`], so a second request can never be built before
//! the first outcome arrives.
//!
//! Device refreshes are numbered. A result only lands if it answers the most
//! recent [`Orchestrator::begin_refresh`], and one that lands mid-transfer
//! updates the destinations without replacing the progress status.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::CommandRunner;
use crate::error::{QueryError, ValidationError};
use crate::peers::{Peer, PeerListing, PeerWarning};
use crate::pending::PendingFiles;
use crate::transfer::{TransferInvoker, TransferMode, TransferOutcome, TransferRequest};

/// Identifies one device refresh
pub type RefreshGeneration = u64;

/// State of the single transfer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    InFlight(TransferMode),
}

/// What the UI should do once a transfer has finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: TransferOutcome,
    /// Raise a desktop notification (successful transfers only)
    pub notify_desktop: bool,
    /// Number of pending files removed because they were sent
    pub cleared: usize,
}

/// Send/receive state behind the window
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pending: PendingFiles,
    listing: PeerListing,
    selected: Option<usize>,
    receive_dir: String,
    state: SlotState,
    status: String,
    refresh: RefreshGeneration,
}

impl Orchestrator {
    pub fn new(receive_dir: impl Into<String>) -> Self {
        Self {
            pending: PendingFiles::new(),
            listing: PeerListing::default(),
            selected: None,
            receive_dir: receive_dir.into(),
            state: SlotState::Idle,
            status: "Ready".to_string(),
            refresh: 0,
        }
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SlotState::Idle
    }

    /// Whether file, destination, directory and submit controls are usable
    pub fn affordances_enabled(&self) -> bool {
        self.is_idle()
    }

    /// Current status line
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn pending(&self) -> &PendingFiles {
        &self.pending
    }

    pub fn peers(&self) -> &[Peer] {
        &self.listing.peers
    }

    pub fn peer_warnings(&self) -> &[PeerWarning] {
        &self.listing.warnings
    }

    /// Text naming every peer the last listing skipped
    pub fn warning_text(&self) -> Option<String> {
        self.listing.warning_text()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn destination(&self) -> Option<&Peer> {
        self.selected.and_then(|index| self.listing.get(index))
    }

    pub fn receive_dir(&self) -> &str {
        &self.receive_dir
    }

    fn ensure_idle(&self) -> Result<(), ValidationError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(ValidationError::Busy)
        }
    }

    /// Queue files for sending; returns how many were new
    pub fn add_files<I, P>(&mut self, files: I) -> Result<usize, ValidationError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ensure_idle()?;

        let files: Vec<PathBuf> = files.into_iter().map(Into::into).collect();
        if files.is_empty() {
            return Ok(0);
        }

        let added = self.pending.extend(files);
        self.status = format!(
            "Added {} file(s). Total: {}",
            added,
            self.pending.len()
        );
        info!("{}", self.status);
        Ok(added)
    }

    pub fn clear_files(&mut self) -> Result<(), ValidationError> {
        self.ensure_idle()?;
        self.pending.clear();
        self.status = "File list cleared".to_string();
        Ok(())
    }

    /// Mark the start of a device refresh
    ///
    /// The returned generation must be handed back with the result.
    pub fn begin_refresh(&mut self) -> Result<RefreshGeneration, ValidationError> {
        self.ensure_idle()?;
        self.refresh += 1;
        self.status = "Loading devices...".to_string();
        Ok(self.refresh)
    }

    fn is_stale(&self, generation: RefreshGeneration) -> bool {
        if generation < self.refresh {
            debug!(
                "Dropping result of refresh {} (latest is {})",
                generation, self.refresh
            );
            return true;
        }
        false
    }

    /// Replace the destination list with a fresh listing
    ///
    /// The previously chosen peer stays selected when it is still online;
    /// otherwise the first peer is selected. Returns `false` when the listing
    /// answers an older refresh and was discarded.
    pub fn apply_listing(&mut self, generation: RefreshGeneration, listing: PeerListing) -> bool {
        if self.is_stale(generation) {
            return false;
        }

        let previous = self.destination().map(|peer| peer.id.clone());

        self.selected = previous
            .and_then(|id| listing.position(&id))
            .or_else(|| (!listing.is_empty()).then_some(0));

        if self.is_idle() {
            self.status = if listing.warnings.is_empty() {
                listing.summary()
            } else {
                let skipped: Vec<&str> = listing
                    .warnings
                    .iter()
                    .map(|w| w.display_name.as_str())
                    .collect();
                format!("{} (skipped: {})", listing.summary(), skipped.join(", "))
            };
        }
        self.listing = listing;
        true
    }

    /// A refresh failed: no destinations until the next successful one
    ///
    /// Returns `false` when the error answers an older refresh.
    pub fn apply_query_error(&mut self, generation: RefreshGeneration, error: &QueryError) -> bool {
        if self.is_stale(generation) {
            return false;
        }

        warn!("Could not load devices: {}", error);
        self.listing = PeerListing::default();
        self.selected = None;
        if self.is_idle() {
            self.status = format!("Error: {}", error);
        }
        true
    }

    pub fn select_destination(&mut self, index: usize) -> Result<(), ValidationError> {
        self.ensure_idle()?;
        if index >= self.listing.peers.len() {
            return Err(ValidationError::NoDestination);
        }
        self.selected = Some(index);
        Ok(())
    }

    pub fn set_receive_dir(&mut self, directory: impl Into<String>) -> Result<(), ValidationError> {
        self.ensure_idle()?;
        self.receive_dir = directory.into();
        Ok(())
    }

    /// Validate and start a send; the slot is `InFlight` on success
    pub fn begin_send(&mut self) -> Result<TransferRequest, ValidationError> {
        self.ensure_idle()?;

        if self.pending.is_empty() {
            return Err(ValidationError::NoFiles);
        }
        let peer = self.destination().ok_or(ValidationError::NoDestination)?;

        let request = TransferRequest::send(self.pending.to_vec(), peer);
        self.start(&request);
        Ok(request)
    }

    /// Validate and start a receive; the slot is `InFlight` on success
    pub fn begin_receive(&mut self) -> Result<TransferRequest, ValidationError> {
        self.ensure_idle()?;

        let directory = self.receive_dir.trim();
        if directory.is_empty() {
            return Err(ValidationError::NoReceiveDirectory);
        }
        if !Path::new(directory).is_dir() {
            return Err(ValidationError::InvalidReceiveDirectory(PathBuf::from(
                directory,
            )));
        }

        let request = TransferRequest::receive(directory);
        self.start(&request);
        Ok(request)
    }

    fn start(&mut self, request: &TransferRequest) {
        self.state = SlotState::InFlight(request.mode());
        self.status = request.progress_message();
    }

    /// Advisory notice from the running transfer
    pub fn progress(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    /// Finish the in-flight transfer and return to `Idle`
    pub fn complete(&mut self, outcome: TransferOutcome) -> Completion {
        if self.is_idle() {
            warn!("Transfer outcome arrived with no transfer in flight");
        }

        self.state = SlotState::Idle;
        self.status = outcome.message.clone();

        let cleared = if outcome.clears_pending() {
            let count = self.pending.len();
            self.pending.clear();
            count
        } else {
            0
        };

        Completion {
            notify_desktop: outcome.succeeded,
            cleared,
            outcome,
        }
    }

    /// Validate, run and complete a send in one call
    ///
    /// Validation failures return before the invoker is touched.
    pub async fn run_send<R>(
        &mut self,
        invoker: &TransferInvoker<R>,
    ) -> Result<Completion, ValidationError>
    where
        R: CommandRunner + 'static,
    {
        let request = self.begin_send()?;
        let outcome = invoker.execute(&request).await;
        Ok(self.complete(outcome))
    }

    /// Validate, run and complete a receive in one call
    pub async fn run_receive<R>(
        &mut self,
        invoker: &TransferInvoker<R>,
    ) -> Result<Completion, ValidationError>
    where
        R: CommandRunner + 'static,
    {
        let request = self.begin_receive()?;
        let outcome = invoker.execute(&request).await;
        Ok(self.complete(outcome))
    }
}
