//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cosmic_ext_taildrop_core::{CommandOutput, CommandRunner, ToolCommand};

/// Scripted stand-in for the tailscale binary
///
/// Replies are consumed in order; once the script runs out every command
/// "succeeds" with empty output. Every command received is recorded.
#[derive(Default)]
pub struct FakeRunner {
    replies: Mutex<VecDeque<std::io::Result<CommandOutput>>>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(self: &Arc<Self>, code: i32, stdout: &str, stderr: &str) -> Arc<Self> {
        self.replies.lock().unwrap().push_back(Ok(CommandOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }));
        Arc::clone(self)
    }

    pub fn fail_to_launch(self: &Arc<Self>, kind: std::io::ErrorKind) -> Arc<Self> {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(std::io::Error::from(kind)));
        Arc::clone(self)
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Arguments of the `index`th call as plain strings
    pub fn args(&self, index: usize) -> Vec<String> {
        self.calls.lock().unwrap()[index]
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(CommandOutput {
                    code: Some(0),
                    ..Default::default()
                })
            })
    }
}

pub const ONE_ONLINE_ONE_OFFLINE: &str = r#"{
    "BackendState": "Running",
    "Peer": {
        "nodekey:laptop": {
            "HostName": "laptop",
            "DNSName": "laptop.example.ts.net.",
            "TailscaleIPs": ["100.64.0.5"],
            "Online": true
        },
        "nodekey:phone": {
            "HostName": "phone",
            "TailscaleIPs": ["100.64.0.6"],
            "Online": false
        }
    }
}"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
