//! devterm - the core of a small interactive shell
//!
//! This crate provides:
//! - A command session that runs shell commands in the background, tracks the
//!   working directory and keeps input/output history
//! - A git-aware prompt renderer
//! - A timer/stopwatch engine with a cross-task completion signal
//!
//! # Architecture
//!
//! The outer read-eval loop is left to the caller. It issues commands through
//! [`session::CommandSession::execute`], awaits the returned handle, and shows
//! [`session::CommandSession::prompt`] between commands.

pub mod clock;
pub mod config;
pub mod prompt;
pub mod session;
pub mod timestamp;
