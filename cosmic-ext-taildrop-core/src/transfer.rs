//! Transfer invoker
//!
//! Turns a [`TransferRequest`] into one `tailscale file cp` or
//! `tailscale file get` run and reports exactly one [`TransferOutcome`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use tracing::{error, info};

use crate::command::{CommandRunner, TailscaleCli, ToolCommand};
use crate::error::TransferError;
use crate::peers::Peer;

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Send,
    Receive,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Receive => write!(f, "receive"),
        }
    }
}

/// One submitted transfer; immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    mode: TransferMode,
    files: Vec<PathBuf>,
    destination: String,
    destination_name: String,
}

impl TransferRequest {
    /// Push `files` to `peer`'s inbox
    pub fn send(files: Vec<PathBuf>, peer: &Peer) -> Self {
        Self {
            mode: TransferMode::Send,
            files,
            destination: peer.address.clone(),
            destination_name: peer.display_name.clone(),
        }
    }

    /// Fetch waiting files into `directory`
    pub fn receive(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let name = directory.display().to_string();
        Self {
            mode: TransferMode::Receive,
            files: Vec::new(),
            destination: name.clone(),
            destination_name: name,
        }
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Files to send; empty for a receive
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Peer address for a send, local directory for a receive
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Human-readable destination for messages
    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }

    /// Advisory notice shown while the transfer runs
    pub fn progress_message(&self) -> String {
        match self.mode {
            TransferMode::Send => format!("Sending files to {}...", self.destination_name),
            TransferMode::Receive => "Receiving files...".to_string(),
        }
    }

    /// The tool invocation for this request
    pub fn command(&self, cli: &TailscaleCli) -> ToolCommand {
        match self.mode {
            TransferMode::Send => ToolCommand::file_cp(cli, &self.files, &self.destination),
            TransferMode::Receive => ToolCommand::file_get(cli, Path::new(&self.destination)),
        }
    }
}

/// Terminal result of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub mode: TransferMode,
    pub succeeded: bool,
    pub message: String,
}

impl TransferOutcome {
    pub fn success(request: &TransferRequest) -> Self {
        let message = match request.mode {
            TransferMode::Send => {
                format!("Files sent successfully to {}", request.destination_name)
            }
            TransferMode::Receive => {
                format!("Files received successfully in {}", request.destination_name)
            }
        };
        Self {
            mode: request.mode,
            succeeded: true,
            message,
        }
    }

    pub fn failure(request: &TransferRequest, error: &TransferError) -> Self {
        Self {
            mode: request.mode,
            succeeded: false,
            message: error.to_string(),
        }
    }

    /// Whether the pending file set should be emptied: only after a
    /// successful send
    pub fn clears_pending(&self) -> bool {
        self.succeeded && self.mode == TransferMode::Send
    }
}

/// What a running transfer reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Advisory notice; carries no success or failure meaning
    Progress(String),
    /// Final result, delivered once
    Finished(TransferOutcome),
}

/// Executes transfer requests through a [`CommandRunner`]
pub struct TransferInvoker<R> {
    runner: Arc<R>,
    cli: TailscaleCli,
}

impl<R> Clone for TransferInvoker<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            cli: self.cli.clone(),
        }
    }
}

impl<R: CommandRunner + 'static> TransferInvoker<R> {
    pub fn new(runner: Arc<R>, cli: TailscaleCli) -> Self {
        Self { runner, cli }
    }

    /// Run the request to completion
    ///
    /// Never fails: a tool that cannot be started or that exits non-zero
    /// yields an outcome with `succeeded == false`.
    pub async fn execute(&self, request: &TransferRequest) -> TransferOutcome {
        let command = request.command(&self.cli);
        info!(
            "Starting {} of {} file(s) to {}",
            request.mode,
            request.files.len(),
            request.destination_name
        );

        let result = match self.runner.run(&command).await {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(TransferError::Failed {
                code: output.code,
                stderr: output.stderr,
            }),
            Err(source) => Err(TransferError::Launch {
                program: command.program_name(),
                source,
            }),
        };

        match result {
            Ok(()) => {
                let outcome = TransferOutcome::success(request);
                info!("{}", outcome.message);
                outcome
            }
            Err(e) => {
                error!("Transfer ({}) failed: {}", request.mode, e);
                TransferOutcome::failure(request, &e)
            }
        }
    }

    /// Progress notice followed by the outcome, as a stream
    pub fn events(&self, request: TransferRequest) -> impl Stream<Item = TransferEvent> + Send {
        let invoker = self.clone();
        let notice = TransferEvent::Progress(request.progress_message());

        stream::once(async move { notice }).chain(stream::once(async move {
            TransferEvent::Finished(invoker.execute(&request).await)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedRunner {
        reply: Mutex<Option<std::io::Result<CommandOutput>>>,
        seen: Mutex<Vec<ToolCommand>>,
    }

    impl ScriptedRunner {
        fn new(reply: std::io::Result<CommandOutput>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
            self.seen.lock().unwrap().push(command.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(CommandOutput::default()))
        }
    }

    fn laptop() -> Peer {
        Peer {
            id: "nodekey:1".to_string(),
            display_name: "laptop".to_string(),
            address: "100.64.0.5".to_string(),
            online: true,
        }
    }

    fn exited(code: i32, stderr: &str) -> std::io::Result<CommandOutput> {
        Ok(CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_success() {
        let runner = ScriptedRunner::new(exited(0, ""));
        let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());
        let request = TransferRequest::send(vec![PathBuf::from("/tmp/a.txt")], &laptop());

        let outcome = invoker.execute(&request).await;

        assert!(outcome.succeeded);
        assert!(outcome.clears_pending());
        assert_eq!(outcome.message, "Files sent successfully to laptop");
        assert_eq!(runner.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_receive_success_does_not_clear() {
        let runner = ScriptedRunner::new(exited(0, ""));
        let invoker = TransferInvoker::new(runner, TailscaleCli::default());
        let request = TransferRequest::receive("/home/me/Downloads");

        let outcome = invoker.execute(&request).await;

        assert!(outcome.succeeded);
        assert!(!outcome.clears_pending());
        assert_eq!(
            outcome.message,
            "Files received successfully in /home/me/Downloads"
        );
    }

    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let runner = ScriptedRunner::new(exited(1, "connection refused"));
        let invoker = TransferInvoker::new(runner, TailscaleCli::default());
        let request = TransferRequest::send(vec![PathBuf::from("/tmp/a.txt")], &laptop());

        let outcome = invoker.execute(&request).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "connection refused");
    }

    #[tokio::test]
    async fn test_failure_without_stderr() {
        let runner = ScriptedRunner::new(exited(1, ""));
        let invoker = TransferInvoker::new(runner, TailscaleCli::default());
        let outcome = invoker.execute(&TransferRequest::receive("/tmp")).await;

        assert!(!outcome.succeeded);
        assert!(outcome.message.starts_with("Unknown error"));
    }

    #[tokio::test]
    async fn test_launch_failure_becomes_outcome() {
        let runner = ScriptedRunner::new(Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        )));
        let invoker = TransferInvoker::new(runner, TailscaleCli::default());
        let outcome = invoker.execute(&TransferRequest::receive("/tmp")).await;

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.message,
            "Could not start tailscale: permission denied"
        );
    }

    #[tokio::test]
    async fn test_events_progress_then_outcome() {
        let runner = ScriptedRunner::new(exited(0, ""));
        let invoker = TransferInvoker::new(runner, TailscaleCli::default());
        let request = TransferRequest::send(vec![PathBuf::from("/tmp/a.txt")], &laptop());

        let events: Vec<_> = invoker.events(request).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            TransferEvent::Progress("Sending files to laptop...".to_string())
        );
        assert!(matches!(&events[1], TransferEvent::Finished(o) if o.succeeded));
    }
}
