//! Process execution - shell selection and child spawning

use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Shell used to run non-builtin commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shell {
    /// Windows command interpreter, invoked as `cmd.exe /c <command>`
    Cmd,
    /// A POSIX shell, invoked as `<program> -c <command>`
    Posix { program: String },
}

impl Shell {
    /// Pick the shell for the host platform
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Shell::Cmd,
            "linux" => Shell::posix("bash"),
            _ => Shell::posix("sh"),
        }
    }

    pub fn posix(program: impl Into<String>) -> Self {
        Shell::Posix {
            program: program.into(),
        }
    }

    /// Host default, unless a POSIX shell override is configured
    pub fn with_override(program: Option<&str>) -> Self {
        match (Self::detect(), program) {
            (Shell::Posix { .. }, Some(program)) => Shell::posix(program),
            (shell, _) => shell,
        }
    }

    /// Short name shown in the prompt
    pub fn label(&self) -> &str {
        match self {
            Shell::Cmd => "cmd",
            Shell::Posix { program } => Path::new(program)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(program),
        }
    }

    /// Program to launch
    pub fn program(&self) -> &str {
        match self {
            Shell::Cmd => "cmd.exe",
            Shell::Posix { program } => program,
        }
    }

    /// Flag that makes the shell run its next argument as a command
    pub fn flag(&self) -> &'static str {
        match self {
            Shell::Cmd => "/c",
            Shell::Posix { .. } => "-c",
        }
    }
}

/// Spawns shell commands on behalf of a session.
///
/// The returned child must have stdin and stdout inherited from the calling
/// terminal and stderr piped, so the session can drain and record it.
pub trait ProcessExecutor: Send + Sync {
    fn spawn(&self, shell: &Shell, command: &str, working_dir: &Path) -> io::Result<Child>;
}

/// Default executor backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl ProcessExecutor for ShellExecutor {
    fn spawn(&self, shell: &Shell, command: &str, working_dir: &Path) -> io::Result<Child> {
        tracing::debug!(
            "Spawning '{} {} {}' in '{}'",
            shell.program(),
            shell.flag(),
            command,
            working_dir.display()
        );

        Command::new(shell.program())
            .arg(shell.flag())
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
    }
}
