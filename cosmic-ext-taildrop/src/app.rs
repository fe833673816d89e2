//! COSMIC Application Implementation
//!
//! Window state and update logic. All send/receive decisions are delegated
//! to the [`Orchestrator`]; this module only turns its results into tasks,
//! notices and window actions.

use std::any::TypeId;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cosmic::app::{Core, Task};
use cosmic::iced::{event, window, Subscription};
use cosmic::{Action, Application, Element};
use cosmic_ext_taildrop_core::{
    Orchestrator, PeerDirectory, PeerListing, Preferences, ProcessRunner, QueryError,
    RefreshGeneration, TransferEvent, TransferInvoker, TransferRequest, ValidationError, APP_ID,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use zbus::Connection;

use crate::dbus::{self, DbusCommand};
use crate::{notifications, portal};

/// Startup options
#[derive(Debug, Clone)]
pub struct Flags {
    pub hidden: bool,
    pub preferences: Preferences,
}

/// Severity of a modal notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Modal notice shown over the window until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    fn info(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            body: body.into(),
        }
    }

    fn warning(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.to_string(),
            body: body.into(),
        }
    }

    fn error(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            body: body.into(),
        }
    }
}

/// Whether a hidden window can be brought back over D-Bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Starting,
    Ready,
    Unavailable,
}

/// What closing the main window does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    Hide,
    Exit,
}

/// Only hide when the D-Bus service can show the window again
pub fn close_action(background: Background) -> CloseAction {
    match background {
        Background::Ready => CloseAction::Hide,
        Background::Starting | Background::Unavailable => CloseAction::Exit,
    }
}

/// Warning about skipped devices, never raised over a running transfer
fn skipped_devices_notice(orchestrator: &Orchestrator) -> Option<Notice> {
    if !orchestrator.is_idle() {
        return None;
    }
    orchestrator
        .warning_text()
        .map(|text| Notice::warning("Some devices were skipped", text))
}

/// Application messages
#[derive(Debug, Clone)]
pub enum Message {
    /// Open the portal file picker
    PickFiles,
    /// Files chosen in the picker or dropped on the window
    FilesAdded(Vec<PathBuf>),
    /// Drag hovering over the window
    DropHover(bool),
    ClearFiles,
    DestinationSelected(usize),
    RefreshDevices,
    DevicesLoaded(RefreshGeneration, Result<PeerListing, Arc<QueryError>>),
    SendFiles,
    /// Save directory text edited
    ReceiveDirChanged(String),
    /// Open the portal directory picker
    BrowseDirectory,
    DirectoryPicked(Option<PathBuf>),
    ReceiveFiles,
    /// Progress or outcome from the running transfer
    Transfer(TransferEvent),
    /// Animate the indeterminate progress bar
    ProgressTick,
    DismissNotice,
    /// Window close button pressed
    CloseRequested(window::Id),
    /// D-Bus service is up
    DbusReady,
    /// D-Bus service could not start
    DbusFailed(String),
    /// D-Bus command received
    Dbus(DbusCommand),
}

/// Main application state
pub struct TaildropApp {
    core: Core,
    orchestrator: Orchestrator,
    directory: PeerDirectory<ProcessRunner>,
    invoker: TransferInvoker<ProcessRunner>,
    preferences: Preferences,
    /// Dropdown labels for the current listing
    peer_labels: Vec<String>,
    /// Position of the indeterminate progress bar (0..100)
    progress: f32,
    drop_hover: bool,
    notice: Option<Notice>,
    background: Background,
    /// Hide as soon as the D-Bus service is up
    start_hidden: bool,
}

impl Application for TaildropApp {
    type Message = Message;
    type Executor = cosmic::executor::multi::Executor;
    type Flags = Flags;
    const APP_ID: &'static str = APP_ID;

    fn init(core: Core, flags: Self::Flags) -> (Self, Task<Message>) {
        let Flags {
            hidden,
            preferences,
        } = flags;

        let runner = Arc::new(ProcessRunner);
        let cli = preferences.cli();
        let receive_dir = preferences.receive_dir();

        let mut app = Self {
            core,
            orchestrator: Orchestrator::new(receive_dir.to_string_lossy()),
            directory: PeerDirectory::new(runner.clone(), cli.clone()),
            invoker: TransferInvoker::new(runner, cli),
            preferences,
            peer_labels: Vec::new(),
            progress: 0.0,
            drop_hover: false,
            notice: None,
            background: Background::Starting,
            start_hidden: hidden,
        };

        info!("COSMIC Taildrop initialized");

        let task = app.refresh_devices();
        (app, task)
    }

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn update(&mut self, message: Self::Message) -> Task<Self::Message> {
        match message {
            Message::PickFiles => {
                if !self.orchestrator.affordances_enabled() {
                    return Task::none();
                }
                Task::perform(portal::pick_files(), |files| {
                    Action::App(Message::FilesAdded(files))
                })
            }

            Message::FilesAdded(files) => {
                self.drop_hover = false;
                if let Err(e) = self.orchestrator.add_files(files) {
                    debug!("Ignoring files: {}", e);
                }
                Task::none()
            }

            Message::DropHover(hovering) => {
                self.drop_hover = hovering && self.orchestrator.affordances_enabled();
                Task::none()
            }

            Message::ClearFiles => {
                if let Err(e) = self.orchestrator.clear_files() {
                    debug!("Ignoring clear: {}", e);
                }
                Task::none()
            }

            Message::DestinationSelected(index) => {
                if let Err(e) = self.orchestrator.select_destination(index) {
                    debug!("Ignoring destination change: {}", e);
                }
                Task::none()
            }

            Message::RefreshDevices => self.refresh_devices(),

            Message::DevicesLoaded(generation, Ok(listing)) => {
                if !self.orchestrator.apply_listing(generation, listing) {
                    return Task::none();
                }
                self.peer_labels = self
                    .orchestrator
                    .peers()
                    .iter()
                    .map(|peer| peer.label())
                    .collect();
                if let Some(notice) = skipped_devices_notice(&self.orchestrator) {
                    self.notice = Some(notice);
                }
                Task::none()
            }

            Message::DevicesLoaded(generation, Err(e)) => {
                if !self.orchestrator.apply_query_error(generation, &e) {
                    return Task::none();
                }
                self.peer_labels.clear();
                if self.orchestrator.is_idle() {
                    self.notice = Some(Notice::warning(
                        "Could not load devices",
                        self.orchestrator.status(),
                    ));
                }
                Task::none()
            }

            Message::SendFiles => match self.orchestrator.begin_send() {
                Ok(request) => self.start_transfer(request),
                Err(e) => self.reject(e),
            },

            Message::ReceiveDirChanged(directory) => {
                if let Err(e) = self.orchestrator.set_receive_dir(directory) {
                    debug!("Ignoring directory edit: {}", e);
                }
                Task::none()
            }

            Message::BrowseDirectory => {
                if !self.orchestrator.affordances_enabled() {
                    return Task::none();
                }
                Task::perform(portal::pick_directory(), |directory| {
                    Action::App(Message::DirectoryPicked(directory))
                })
            }

            Message::DirectoryPicked(None) => Task::none(),

            Message::DirectoryPicked(Some(directory)) => {
                if let Err(e) = self
                    .orchestrator
                    .set_receive_dir(directory.to_string_lossy())
                {
                    debug!("Ignoring picked directory: {}", e);
                    return Task::none();
                }

                self.preferences.set_save_directory(directory);
                if let Err(e) = self.preferences.save() {
                    warn!("Failed to save preferences: {}", e);
                }
                Task::none()
            }

            Message::ReceiveFiles => match self.orchestrator.begin_receive() {
                Ok(request) => self.start_transfer(request),
                Err(e) => self.reject(e),
            },

            Message::Transfer(TransferEvent::Progress(status)) => {
                self.orchestrator.progress(status);
                Task::none()
            }

            Message::Transfer(TransferEvent::Finished(outcome)) => {
                let completion = self.orchestrator.complete(outcome);
                self.progress = 0.0;

                if completion.outcome.succeeded {
                    info!("{}", completion.outcome.message);
                    if completion.notify_desktop {
                        notifications::notify_transfer_complete(&completion.outcome);
                    }
                    self.notice = Some(Notice::info("Success", completion.outcome.message));
                } else {
                    error!("Transfer failed: {}", completion.outcome.message);
                    self.notice = Some(Notice::error(
                        "Transfer Failed",
                        completion.outcome.message,
                    ));
                }
                Task::none()
            }

            Message::ProgressTick => {
                self.progress = (self.progress + 2.0) % 100.0;
                Task::none()
            }

            Message::DismissNotice => {
                self.notice = None;
                Task::none()
            }

            Message::CloseRequested(id) => {
                if self.core.main_window_id() != Some(id) {
                    return Task::none();
                }
                match close_action(self.background) {
                    CloseAction::Hide => {
                        info!("Window closed, continuing in the background");
                        self.set_window_mode(window::Mode::Hidden)
                    }
                    CloseAction::Exit => {
                        info!("Window closed with no background service, exiting");
                        cosmic::iced::exit()
                    }
                }
            }

            Message::DbusReady => {
                self.background = Background::Ready;
                if std::mem::take(&mut self.start_hidden) {
                    info!("Starting in the background");
                    return self.set_window_mode(window::Mode::Hidden);
                }
                Task::none()
            }

            Message::DbusFailed(reason) => {
                self.background = Background::Unavailable;
                error!("Failed to start D-Bus service: {}", reason);
                if std::mem::take(&mut self.start_hidden) {
                    warn!("Cannot start hidden without the D-Bus service, showing the window");
                }
                Task::none()
            }

            Message::Dbus(DbusCommand::Show) => {
                let Some(id) = self.core.main_window_id() else {
                    return Task::none();
                };
                Task::batch([
                    window::change_mode(id, window::Mode::Windowed),
                    window::gain_focus(id),
                ])
            }

            Message::Dbus(DbusCommand::Hide) => self.set_window_mode(window::Mode::Hidden),

            Message::Dbus(DbusCommand::Quit) => {
                info!("Quit requested");
                cosmic::iced::exit()
            }
        }
    }

    fn view(&self) -> Element<'_, Self::Message> {
        self.main_view()
    }

    fn dialog(&self) -> Option<Element<'_, Self::Message>> {
        self.notice.as_ref().map(|notice| self.notice_view(notice))
    }

    fn on_close_requested(&self, id: window::Id) -> Option<Message> {
        Some(Message::CloseRequested(id))
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        let drops = event::listen_with(|event, _status, _id| match event {
            event::Event::Window(window::Event::FileDropped(path)) => {
                Some(Message::FilesAdded(vec![path]))
            }
            event::Event::Window(window::Event::FileHovered(_)) => Some(Message::DropHover(true)),
            event::Event::Window(window::Event::FilesHoveredLeft) => {
                Some(Message::DropHover(false))
            }
            _ => None,
        });

        let mut subscriptions = vec![drops, dbus_subscription()];

        if !self.orchestrator.is_idle() {
            subscriptions.push(
                cosmic::iced::time::every(Duration::from_millis(40))
                    .map(|_| Message::ProgressTick),
            );
        }

        Subscription::batch(subscriptions)
    }
}

impl TaildropApp {
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn peer_labels(&self) -> &[String] {
        &self.peer_labels
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn drop_hover(&self) -> bool {
        self.drop_hover
    }

    fn refresh_devices(&mut self) -> Task<Message> {
        let generation = match self.orchestrator.begin_refresh() {
            Ok(generation) => generation,
            Err(e) => {
                debug!("Ignoring refresh: {}", e);
                return Task::none();
            }
        };

        info!("Refreshing device list");
        let directory = self.directory.clone();
        Task::perform(
            async move { directory.list_online_peers().await.map_err(Arc::new) },
            move |result| Action::App(Message::DevicesLoaded(generation, result)),
        )
    }

    fn start_transfer(&mut self, request: TransferRequest) -> Task<Message> {
        self.progress = 0.0;
        Task::run(self.invoker.events(request), |event| {
            Action::App(Message::Transfer(event))
        })
    }

    fn reject(&mut self, error: ValidationError) -> Task<Message> {
        warn!("Request rejected: {}", error);
        if error != ValidationError::Busy {
            self.notice = Some(Notice::warning("Warning", error.to_string()));
        }
        Task::none()
    }

    fn set_window_mode(&self, mode: window::Mode) -> Task<Message> {
        match self.core.main_window_id() {
            Some(id) => window::change_mode(id, mode),
            None => Task::none(),
        }
    }
}

enum DbusState {
    Starting,
    Serving(Connection, mpsc::Receiver<DbusCommand>),
    Stopped,
}

/// Serve the D-Bus interface and forward its commands
fn dbus_subscription() -> Subscription<Message> {
    struct DbusSubscription;

    Subscription::run_with_id(
        TypeId::of::<DbusSubscription>(),
        cosmic::iced::futures::stream::unfold(DbusState::Starting, |state| async move {
            match state {
                DbusState::Starting => {
                    let (sender, receiver) = mpsc::channel(8);
                    match dbus::start_dbus_service(sender).await {
                        Ok(connection) => Some((
                            Message::DbusReady,
                            DbusState::Serving(connection, receiver),
                        )),
                        Err(e) => Some((
                            Message::DbusFailed(format!("{:#}", e)),
                            DbusState::Stopped,
                        )),
                    }
                }
                DbusState::Serving(connection, mut receiver) => {
                    let command = receiver.recv().await?;
                    Some((
                        Message::Dbus(command),
                        DbusState::Serving(connection, receiver),
                    ))
                }
                DbusState::Stopped => None,
            }
        }),
    )
}
