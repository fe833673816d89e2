//! Orchestration Tests
//!
//! Drives the orchestrator, device directory and invoker together against a
//! scripted tailscale binary:
//! - destination listing from a status report
//! - send / receive success and failure paths
//! - validation short-circuits that never reach the tool
//! - literal argument passing for hostile file names

mod common;

use std::path::PathBuf;

use common::{init_tracing, FakeRunner, ONE_ONLINE_ONE_OFFLINE};
use cosmic_ext_taildrop_core::{
    Orchestrator, PeerDirectory, QueryError, SlotState, TailscaleCli, TransferEvent,
    TransferInvoker, TransferMode, ValidationError,
};
use futures::StreamExt;
use tempfile::TempDir;

async fn orchestrator_with_laptop(runner: &std::sync::Arc<FakeRunner>) -> Orchestrator {
    let directory = PeerDirectory::new(runner.clone(), TailscaleCli::default());
    let listing = directory.list_online_peers().await.unwrap();
    let mut orchestrator = Orchestrator::new("/tmp");
    let generation = orchestrator.begin_refresh().unwrap();
    assert!(orchestrator.apply_listing(generation, listing));
    orchestrator
}

/// Online peer is listed with its first address; offline peer is not
#[tokio::test]
async fn test_destination_list_from_status() {
    init_tracing();
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let directory = PeerDirectory::new(runner.clone(), TailscaleCli::default());

    let listing = directory.list_online_peers().await.unwrap();

    let entries: Vec<String> = listing.peers.iter().map(|p| p.to_string()).collect();
    assert_eq!(entries, vec!["laptop → 100.64.0.5"]);
    assert_eq!(runner.args(0), vec!["status", "--json"]);
}

/// Non-zero exit from the status query is a query error
#[tokio::test]
async fn test_status_failure() {
    let runner = FakeRunner::new().reply(1, "", "failed to connect to local tailscaled");
    let directory = PeerDirectory::new(runner, TailscaleCli::default());

    let error = directory.list_online_peers().await.unwrap_err();
    assert!(matches!(error, QueryError::Failed { code: Some(1), .. }));

    let mut orchestrator = Orchestrator::new("/tmp");
    let generation = orchestrator.begin_refresh().unwrap();
    assert!(orchestrator.apply_query_error(generation, &error));
    assert!(orchestrator.peers().is_empty());
    assert!(orchestrator.status().contains("failed to connect to local tailscaled"));
}

/// Missing binary during the status query
#[tokio::test]
async fn test_status_launch_failure() {
    let runner = FakeRunner::new().fail_to_launch(std::io::ErrorKind::NotFound);
    let directory = PeerDirectory::new(runner, TailscaleCli::default());

    let error = directory.list_online_peers().await.unwrap_err();
    assert!(matches!(error, QueryError::Launch(_)));
}

/// Garbage on stdout is a query error, not a panic
#[tokio::test]
async fn test_status_malformed() {
    let runner = FakeRunner::new().reply(0, "<html>", "");
    let directory = PeerDirectory::new(runner, TailscaleCli::default());

    let error = directory.list_online_peers().await.unwrap_err();
    assert!(matches!(error, QueryError::Malformed(_)));
}

/// Successful send of two files: Idle, empty queue, message says "sent"
#[tokio::test]
async fn test_send_success_clears_queue() {
    init_tracing();
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());

    orchestrator.add_files(["a.txt", "b.txt"]).unwrap();
    let completion = orchestrator.run_send(&invoker).await.unwrap();

    assert_eq!(orchestrator.state(), SlotState::Idle);
    assert!(orchestrator.pending().is_empty());
    assert!(orchestrator.status().contains("sent"));
    assert!(completion.notify_desktop);
    assert_eq!(completion.cleared, 2);
    assert_eq!(
        runner.args(1),
        vec!["file", "cp", "a.txt", "b.txt", "100.64.0.5:"]
    );
}

/// Failed send: Idle, queue untouched, message is the tool's stderr
#[tokio::test]
async fn test_send_failure_keeps_queue() {
    let runner = FakeRunner::new()
        .reply(0, ONE_ONLINE_ONE_OFFLINE, "")
        .reply(1, "", "connection refused");
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());

    orchestrator.add_files(["a.txt", "b.txt"]).unwrap();
    let completion = orchestrator.run_send(&invoker).await.unwrap();

    assert_eq!(orchestrator.state(), SlotState::Idle);
    assert_eq!(orchestrator.pending().len(), 2);
    assert_eq!(orchestrator.status(), "connection refused");
    assert!(!completion.outcome.succeeded);
    assert!(!completion.notify_desktop);
}

/// The tool cannot be started: failed outcome, no panic, back to Idle
#[tokio::test]
async fn test_send_launch_failure() {
    let runner = FakeRunner::new()
        .reply(0, ONE_ONLINE_ONE_OFFLINE, "")
        .fail_to_launch(std::io::ErrorKind::PermissionDenied);
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let invoker = TransferInvoker::new(runner, TailscaleCli::default());

    orchestrator.add_files(["a.txt"]).unwrap();
    let completion = orchestrator.run_send(&invoker).await.unwrap();

    assert!(orchestrator.is_idle());
    assert!(!completion.outcome.succeeded);
    assert!(completion.outcome.message.starts_with("Could not start tailscale"));
    assert_eq!(orchestrator.pending().len(), 1);
}

/// Zero pending files never reaches the invoker
#[tokio::test]
async fn test_send_without_files_never_invokes() {
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());
    let calls_before = runner.call_count();

    let result = orchestrator.run_send(&invoker).await;

    assert_eq!(result, Err(ValidationError::NoFiles));
    assert_eq!(runner.call_count(), calls_before);
    assert!(orchestrator.is_idle());
}

/// No destination never reaches the invoker
#[tokio::test]
async fn test_send_without_destination_never_invokes() {
    let runner = FakeRunner::new();
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());
    let mut orchestrator = Orchestrator::new("/tmp");
    orchestrator.add_files(["a.txt"]).unwrap();

    let result = orchestrator.run_send(&invoker).await;

    assert_eq!(result, Err(ValidationError::NoDestination));
    assert_eq!(runner.call_count(), 0);
}

/// Receive into a missing directory is rejected locally
#[tokio::test]
async fn test_receive_into_missing_directory() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");
    let runner = FakeRunner::new();
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());
    let mut orchestrator = Orchestrator::new(missing.to_string_lossy());

    let result = orchestrator.run_receive(&invoker).await;

    assert_eq!(
        result,
        Err(ValidationError::InvalidReceiveDirectory(missing.clone()))
    );
    assert_eq!(runner.call_count(), 0);
    assert!(orchestrator.is_idle());
}

/// Receive into an existing directory runs `file get` with that directory
#[tokio::test]
async fn test_receive_success() {
    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::new();
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());
    let mut orchestrator = Orchestrator::new(dir.path().to_string_lossy());
    orchestrator.add_files(["keep-me.txt"]).unwrap();

    let completion = orchestrator.run_receive(&invoker).await.unwrap();

    assert!(completion.outcome.succeeded);
    assert_eq!(completion.outcome.mode, TransferMode::Receive);
    assert_eq!(orchestrator.pending().len(), 1);
    assert_eq!(
        runner.args(0),
        vec![
            "file".to_string(),
            "get".to_string(),
            dir.path().to_string_lossy().into_owned()
        ]
    );
}

/// A hostile file name reaches the tool as one literal argument
#[tokio::test]
async fn test_hostile_file_name_is_literal() {
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());

    let hostile = PathBuf::from("/home/me/My Report; rm -rf ~.txt");
    orchestrator.add_files([hostile]).unwrap();
    orchestrator.run_send(&invoker).await.unwrap();

    let call = &runner.calls()[1];
    assert_eq!(call.program(), "tailscale");
    assert_eq!(
        runner.args(1),
        vec![
            "file",
            "cp",
            "/home/me/My Report; rm -rf ~.txt",
            "100.64.0.5:"
        ]
    );
    assert_eq!(runner.call_count(), 2);
}

/// Elevated transfers go through sudo without a prompt
#[tokio::test]
async fn test_elevated_send() {
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let cli = TailscaleCli {
        binary: PathBuf::from("/usr/bin/tailscale"),
        elevate: true,
    };
    let invoker = TransferInvoker::new(runner.clone(), cli);

    orchestrator.add_files(["a.txt"]).unwrap();
    orchestrator.run_send(&invoker).await.unwrap();

    assert_eq!(runner.calls()[1].program(), "sudo");
    assert_eq!(
        runner.args(1),
        vec!["-n", "/usr/bin/tailscale", "file", "cp", "a.txt", "100.64.0.5:"]
    );
}

/// Event stream drives the orchestrator the way the window does
#[tokio::test]
async fn test_event_stream_round_trip() {
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let mut orchestrator = orchestrator_with_laptop(&runner).await;
    let invoker = TransferInvoker::new(runner, TailscaleCli::default());
    orchestrator.add_files(["a.txt"]).unwrap();

    let request = orchestrator.begin_send().unwrap();
    let mut events = Box::pin(invoker.events(request));
    let mut finished = 0;

    while let Some(event) = events.next().await {
        match event {
            TransferEvent::Progress(message) => {
                assert!(!orchestrator.is_idle());
                orchestrator.progress(message);
                assert_eq!(orchestrator.status(), "Sending files to laptop...");
            }
            TransferEvent::Finished(outcome) => {
                finished += 1;
                orchestrator.complete(outcome);
            }
        }
    }

    assert_eq!(finished, 1);
    assert!(orchestrator.is_idle());
    assert!(orchestrator.pending().is_empty());
}

/// Clearing twice is harmless
#[test]
fn test_clear_is_idempotent() {
    let mut orchestrator = Orchestrator::new("/tmp");
    orchestrator.add_files(["a.txt"]).unwrap();

    orchestrator.clear_files().unwrap();
    assert!(orchestrator.pending().is_empty());
    orchestrator.clear_files().unwrap();
    assert!(orchestrator.pending().is_empty());
    assert_eq!(orchestrator.status(), "File list cleared");
}

/// Repeated batches never produce duplicates and keep first-seen order
#[test]
fn test_add_files_order_and_uniqueness() {
    let batches: [&[&str]; 4] = [
        &["c", "a"],
        &["a", "b", "c"],
        &[],
        &["d", "b", "d"],
    ];

    let mut orchestrator = Orchestrator::new("/tmp");
    for batch in batches {
        orchestrator.add_files(batch.iter().copied()).unwrap();
    }

    let order: Vec<_> = orchestrator
        .pending()
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    assert_eq!(order, vec!["c", "a", "b", "d"]);
}

/// Blocking use of the async helpers from synchronous code
#[test]
fn test_run_send_blocking() {
    let runner = FakeRunner::new().reply(0, ONE_ONLINE_ONE_OFFLINE, "");
    let invoker = TransferInvoker::new(runner.clone(), TailscaleCli::default());

    let completion = tokio_test::block_on(async {
        let mut orchestrator = orchestrator_with_laptop(&runner).await;
        orchestrator.add_files(["a.txt"]).unwrap();
        orchestrator.run_send(&invoker).await
    })
    .unwrap();

    assert!(completion.outcome.succeeded);
}
