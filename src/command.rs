//! Execution wrapper for invoking zdb and friends.
//!
//! Shell integration lives behind the `Runner` trait so the client can be
//! exercised with a fake runner instead of a real `zdb` binary.

use log::{debug, warn};
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or -1 when the process was terminated by a signal
    pub status: i32,
}

/// Runs an external program to completion and captures its output
pub trait Runner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output>;
}

/// Errors raised while running an external tool
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started or its output could not be read
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The process ran but exited unsuccessfully
    #[error("{command} failed with exit code {status} (stderr: {stderr})")]
    Failed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// The process outlived the configured timeout and was killed
    #[error("{command} timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Clone, Default)]
pub struct LocalRunner {
    timeout: Option<Duration>,
}

impl LocalRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill processes that run longer than `timeout`
    ///
    /// On timeout only the direct child is killed and its output readers are
    /// detached rather than joined. A grandchild that inherited the pipes
    /// (zdb started through `sudo`) keeps those reader threads alive until
    /// it exits, but the call itself returns promptly.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn wait_with_timeout(
        &self,
        mut child: Child,
        stdout_pipe: Option<ChildStdout>,
        stderr_pipe: Option<ChildStderr>,
    ) -> io::Result<Output> {
        let start = Instant::now();
        let stdout_handle = spawn_output_reader(stdout_pipe);
        let stderr_handle = spawn_output_reader(stderr_pipe);

        let status = match self.timeout {
            None => child.wait()?,
            Some(timeout) => loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if start.elapsed() > timeout {
                    // Readers are left detached; see `with_timeout`.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(io::Error::new(io::ErrorKind::TimedOut, TimeoutError(timeout)));
                }
                thread::sleep(Duration::from_millis(25));
            },
        };

        let stdout = join_reader(stdout_handle)?;
        let stderr = join_reader(stderr_handle)?;

        Ok(Output {
            stdout,
            stderr,
            status: status.code().unwrap_or(-1),
        })
    }
}

impl Runner for LocalRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        self.wait_with_timeout(child, stdout_pipe, stderr_pipe)
    }
}

fn spawn_output_reader<R>(pipe: Option<R>) -> thread::JoinHandle<io::Result<String>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || -> io::Result<String> {
        let mut buf = Vec::new();
        if let Some(mut reader) = pipe {
            reader.read_to_end(&mut buf)?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join_reader(handle: thread::JoinHandle<io::Result<String>>) -> io::Result<String> {
    handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "output reader thread panicked"))?
}

/// A tool binary plus how to invoke it
#[derive(Clone)]
pub struct ToolCommand {
    binary: PathBuf,
    sudo: bool,
    runner: Arc<dyn Runner>,
}

impl fmt::Debug for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCommand")
            .field("binary", &self.binary)
            .field("sudo", &self.sudo)
            .finish_non_exhaustive()
    }
}

impl ToolCommand {
    /// Creates a command for `binary` run through a `LocalRunner`
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            sudo: false,
            runner: Arc::new(LocalRunner::new()),
        }
    }

    /// Prefix every invocation with `sudo`
    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Use a custom runner (a fake in tests, a remote shell, ...)
    pub fn with_runner(mut self, runner: Arc<dyn Runner>) -> Self {
        self.runner = runner;
        self
    }

    /// Resolves the program name and full argument list, applying `sudo`
    fn invocation(&self, args: &[&str]) -> (String, Vec<String>) {
        let binary = self.binary.to_string_lossy().into_owned();
        let mut full_args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        if self.sudo {
            full_args.insert(0, binary);
            ("sudo".to_string(), full_args)
        } else {
            (binary, full_args)
        }
    }

    /// Runs the tool and returns its stdout as text
    ///
    /// # Returns
    /// * `Ok(String)` with the captured stdout when the tool exits with status 0
    /// * `Err(CommandError)` if the tool could not be run, failed, or timed out
    pub fn run_text(&self, args: &[&str]) -> Result<String, CommandError> {
        let (program, full_args) = self.invocation(args);
        let command = if full_args.is_empty() {
            program.clone()
        } else {
            format!("{program} {}", full_args.join(" "))
        };
        debug!("running {command}");

        let output = match self.runner.run(&program, &full_args) {
            Ok(output) => output,
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                warn!("{command} timed out");
                return Err(CommandError::TimedOut {
                    command,
                    timeout: timeout_hint(&err),
                });
            }
            Err(source) => {
                warn!("failed to start {command}: {source}");
                return Err(CommandError::Spawn { command, source });
            }
        };

        if output.status != 0 {
            warn!("{command} exited with code {}", output.status);
            return Err(CommandError::Failed {
                command,
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Recovers the timeout carried by a `LocalRunner` timeout error, if any
fn timeout_hint(err: &io::Error) -> Duration {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<TimeoutError>())
        .map(|inner| inner.0)
        .unwrap_or_default()
}

/// Error payload carried inside `io::ErrorKind::TimedOut` errors from `LocalRunner`
#[derive(Debug, Error)]
#[error("process timed out after {0:?}")]
pub struct TimeoutError(pub Duration);
