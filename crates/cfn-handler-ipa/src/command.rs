//! External command execution
//!
//! Every interaction with FreeIPA and Kerberos goes through a
//! [`CommandRunner`], so the handler logic can be exercised without the
//! real `ipa` / `kinit` binaries.

use async_trait::async_trait;
use cfn_core::Result;
use std::process::Stdio;
use tracing::debug;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for this command only
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of an environment override, if set
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Program and arguments joined for logs and diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished command produced
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Everything the command printed, for use as a failure reason
    pub fn combined(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Runs external commands to completion
///
/// Calls block the request until the command exits; no timeout is applied.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` and capture its output
    ///
    /// Returns `Err` only when the command could not be run at all; a
    /// non-zero exit is reported through [`CommandOutput::success`].
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run `invocation` on the calling thread
    ///
    /// For contexts that cannot await, such as `Drop`.
    fn run_blocking(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands as child processes of the daemon
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("Running: {}", invocation.command_line());

        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .await?;

        let result = CommandOutput::from(output);
        debug!("{} exited with {:?}", invocation.program, result.code);
        Ok(result)
    }

    fn run_blocking(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("Running (blocking): {}", invocation.command_line());

        let output = std::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput::from(output))
    }
}
