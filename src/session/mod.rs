//! Command session - runs shell commands, tracks the working directory and history

mod directory;
mod executor;
mod history;

pub use directory::DirectoryState;
pub use executor::{ProcessExecutor, Shell, ShellExecutor};
pub use history::HistoryCache;

use crate::config::Config;
use crate::prompt::{Palette, PromptRenderer};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Session-specific errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No such file or directory: {}", path.display())]
    NoSuchDirectory { path: PathBuf },

    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailure {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command execution interrupted: {0}")]
    InterruptedExecution(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What a finished command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `cd` moved the session to this directory
    ChangedDirectory(PathBuf),
    /// A shell command ran to completion
    Exited {
        /// Exit code, `None` if killed by a signal
        code: Option<i32>,
        /// Everything the command wrote to stderr
        stderr: String,
    },
}

/// Handle to a command running in the background
pub struct CommandHandle {
    task: JoinHandle<Result<CommandOutcome, SessionError>>,
}

impl CommandHandle {
    /// Wait for the command to finish
    pub async fn wait(self) -> Result<CommandOutcome, SessionError> {
        self.task
            .await
            .map_err(|e| SessionError::InterruptedExecution(e.to_string()))?
    }

    /// Check whether the command has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Options for creating a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Starting directory (defaults to the process's working dir)
    pub working_dir: Option<PathBuf>,

    /// Shell for non-builtin commands (defaults to the host shell)
    pub shell: Option<Shell>,

    /// Echo captured stderr lines to our own stderr
    pub forward_stderr: bool,

    /// Prompt decoration
    pub palette: Palette,

    /// Show the whole path in the prompt instead of the last segment
    pub display_whole_path: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            shell: None,
            forward_stderr: true,
            palette: Palette::Ansi,
            display_whole_path: false,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = Some(shell);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn forward_stderr(mut self, forward: bool) -> Self {
        self.forward_stderr = forward;
        self
    }
}

/// State shared with background command tasks
struct SessionState {
    directory: DirectoryState,
    history: HistoryCache,
}

/// An interactive command session.
///
/// Commands run on background tasks but strictly in the order they were
/// issued: each one waits for its predecessor before touching the directory
/// or history.
pub struct CommandSession {
    id: Uuid,
    state: Arc<SessionState>,
    shell: Shell,
    executor: Arc<dyn ProcessExecutor>,
    renderer: PromptRenderer,
    forward_stderr: bool,
    display_whole_path: AtomicBool,
    /// Where failure messages go; stderr when unset
    feedback: Option<mpsc::UnboundedSender<String>>,
    /// Completion of the most recently issued command
    tail: Mutex<Option<oneshot::Receiver<()>>>,
}

impl CommandSession {
    /// Create a new session
    pub fn new(options: SessionOptions) -> Result<Self, SessionError> {
        let directory = match options.working_dir {
            Some(dir) => DirectoryState::new(dir)?,
            None => DirectoryState::from_current_dir()?,
        };
        let shell = options.shell.unwrap_or_else(Shell::detect);
        let renderer = PromptRenderer::new(shell.label(), options.palette);
        let id = Uuid::new_v4();

        tracing::debug!(
            "Session {} started in '{}' using {}",
            id,
            directory.path().display(),
            shell.program()
        );

        Ok(Self {
            id,
            state: Arc::new(SessionState {
                directory,
                history: HistoryCache::new(),
            }),
            shell,
            executor: Arc::new(ShellExecutor),
            renderer,
            forward_stderr: options.forward_stderr,
            display_whole_path: AtomicBool::new(options.display_whole_path),
            feedback: None,
            tail: Mutex::new(None),
        })
    }

    /// Create a session in the process's working directory from loaded config
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let options = SessionOptions {
            working_dir: None,
            shell: Some(Shell::with_override(config.general.shell.as_deref())),
            forward_stderr: config.general.forward_stderr,
            palette: Palette::from_colors(config.prompt.colors),
            display_whole_path: config.prompt.display_whole_path,
        };
        Self::new(options)
    }

    /// Replace the process executor
    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Send failure messages to `sender` instead of printing them
    pub fn with_feedback(mut self, sender: mpsc::UnboundedSender<String>) -> Self {
        self.feedback = Some(sender);
        self
    }

    /// Execute a command in the background.
    ///
    /// The command is added to the input history before this returns. Failures
    /// are printed only when `report_errors` is set, and are always available
    /// from the returned handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn execute(&self, command: impl Into<String>, report_errors: bool) -> CommandHandle {
        let command = command.into();
        self.state.history.record_input(command.clone());

        let (done_tx, done_rx) = oneshot::channel::<()>();
        let previous = self
            .tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(done_rx);

        let state = Arc::clone(&self.state);
        let shell = self.shell.clone();
        let executor = Arc::clone(&self.executor);
        let forward_stderr = self.forward_stderr;
        let session_id = self.id;
        let feedback = self.feedback.clone();

        let task = tokio::spawn(async move {
            // Dropped when this task ends, releasing the next command
            let _done = done_tx;
            if let Some(previous) = previous {
                let _ = previous.await;
            }

            let result =
                run_command(&state, &shell, executor.as_ref(), &command, forward_stderr).await;

            match &result {
                Ok(outcome) => tracing::debug!(
                    "Session {}: '{}' finished: {:?}",
                    session_id,
                    command,
                    outcome
                ),
                Err(e) => {
                    tracing::warn!("Session {}: '{}' failed: {}", session_id, command, e);
                    if report_errors {
                        let message = format!("Error executing command: '{}' {}", command, e);
                        match &feedback {
                            Some(sender) => {
                                let _ = sender.send(message);
                            }
                            None => eprintln!("{}", message),
                        }
                    }
                }
            }

            result
        });

        CommandHandle { task }
    }

    /// Render the prompt using the session's path display setting
    pub fn prompt(&self) -> String {
        self.render_prompt(self.display_whole_path())
    }

    /// Render the prompt for the current directory
    pub fn render_prompt(&self, display_whole_path: bool) -> String {
        self.renderer
            .render(&self.state.directory.path(), display_whole_path)
    }

    pub fn display_whole_path(&self) -> bool {
        self.display_whole_path.load(Ordering::Relaxed)
    }

    pub fn set_display_whole_path(&self, display: bool) {
        self.display_whole_path.store(display, Ordering::Relaxed);
    }

    pub fn toggle_display_whole_path(&self) {
        self.display_whole_path.fetch_xor(true, Ordering::Relaxed);
    }

    /// Get the current working directory
    pub fn current_dir(&self) -> PathBuf {
        self.state.directory.path()
    }

    /// Get the input/output history
    pub fn history(&self) -> &HistoryCache {
        &self.state.history
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

async fn run_command(
    state: &SessionState,
    shell: &Shell,
    executor: &dyn ProcessExecutor,
    command: &str,
    forward_stderr: bool,
) -> Result<CommandOutcome, SessionError> {
    if let Some(target) = command.strip_prefix("cd ") {
        let path = state.directory.change_to(target.trim())?;
        return Ok(CommandOutcome::ChangedDirectory(path));
    }

    let working_dir = state.directory.path();
    let mut child = executor
        .spawn(shell, command, &working_dir)
        .map_err(|source| SessionError::SpawnFailure {
            command: command.to_string(),
            source,
        })?;

    let (stderr, read_error) = match child.stderr.take() {
        Some(stream) => drain_stderr(stream, forward_stderr).await,
        None => (String::new(), None),
    };

    let status = child.wait().await;
    state.history.record_output(stderr.clone());

    let status = status.map_err(|e| SessionError::InterruptedExecution(e.to_string()))?;
    if let Some(e) = read_error {
        return Err(SessionError::Io(e));
    }

    Ok(CommandOutcome::Exited {
        code: status.code(),
        stderr,
    })
}

/// Read a child's stderr to the end, line by line.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected. The
/// stream is always read to EOF so the child never writes into a closed pipe.
/// Returns whatever was captured, plus the first read error, if any.
async fn drain_stderr<R: AsyncRead + Unpin>(
    stream: R,
    forward: bool,
) -> (String, Option<io::Error>) {
    let mut reader = BufReader::new(stream);
    let mut captured = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return (captured, None),
            Ok(_) => {
                let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
                let line = String::from_utf8_lossy(raw);
                if forward {
                    eprintln!("{}", line);
                }
                captured.push_str(&line);
                captured.push('\n');
            }
            Err(e) => {
                // Keep the pipe open until the child is done writing
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                return (captured, Some(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_collects_lines() {
        let input: &[u8] = b"first\nsecond";
        let (captured, err) = drain_stderr(input, false).await;
        assert_eq!(captured, "first\nsecond\n");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_drain_replaces_invalid_utf8() {
        let input: &[u8] = b"caf\xe9\r\nstill here\n";
        let (captured, err) = drain_stderr(input, false).await;
        assert_eq!(captured, "caf\u{FFFD}\nstill here\n");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_drain_empty_stream() {
        let input: &[u8] = b"";
        let (captured, err) = drain_stderr(input, false).await;
        assert!(captured.is_empty());
        assert!(err.is_none());
    }
}
