//! Tailscale command construction and execution
//!
//! Commands are built as argument vectors and handed straight to the process
//! spawner. No shell ever sees a file name, so spaces, quotes, `;`, `$()` and
//! friends reach `tailscale` as literal bytes of a single argument.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

/// Program used to elevate transfer commands when requested
pub const ELEVATE_PROGRAM: &str = "sudo";

/// Where the tailscale CLI lives and how to call it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailscaleCli {
    /// Path or bare name of the `tailscale` binary
    pub binary: PathBuf,
    /// Prefix `file cp` / `file get` with `sudo -n`
    pub elevate: bool,
}

impl Default for TailscaleCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tailscale"),
            elevate: false,
        }
    }
}

/// A fully resolved external command: program plus literal arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ToolCommand {
    fn new(cli: &TailscaleCli, elevated: bool) -> Self {
        if elevated && cli.elevate {
            Self {
                program: OsString::from(ELEVATE_PROGRAM),
                args: vec![OsString::from("-n"), cli.binary.clone().into_os_string()],
            }
        } else {
            Self {
                program: cli.binary.clone().into_os_string(),
                args: Vec::new(),
            }
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `tailscale status --json`
    pub fn status(cli: &TailscaleCli) -> Self {
        Self::new(cli, false).arg("status").arg("--json")
    }

    /// `tailscale file cp <file>... <address>:`
    pub fn file_cp<P: AsRef<Path>>(cli: &TailscaleCli, files: &[P], address: &str) -> Self {
        let mut command = Self::new(cli, true).arg("file").arg("cp");
        for file in files {
            command = command.arg(literal_path(file.as_ref()));
        }
        command.arg(format!("{}:", address))
    }

    /// `tailscale file get <directory>`
    pub fn file_get(cli: &TailscaleCli, directory: &Path) -> Self {
        Self::new(cli, true)
            .arg("file")
            .arg("get")
            .arg(literal_path(directory))
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Program name for diagnostics
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl fmt::Display for ToolCommand {
    /// Shell-style rendering for logs only; never executed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_for_display(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote_for_display(arg))?;
        }
        Ok(())
    }
}

/// Keep a relative path that starts with `-` from being parsed as a flag
fn literal_path(path: &Path) -> OsString {
    if path.is_relative() && path.as_os_str().to_string_lossy().starts_with('-') {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}

fn quote_for_display(arg: &OsStr) -> String {
    let text = arg.to_string_lossy();
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}

/// What a finished command left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a [`ToolCommand`] to completion
///
/// `Err` means the process could not be started; any exit status, including
/// failures, is reported through [`CommandOutput`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
        debug!("Running: {}", command);

        let output = tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!("{} exited with {:?}", command.program_name(), result.code);
        Ok(result)
    }
}
