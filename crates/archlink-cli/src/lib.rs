//! Command-line Archipelago client.
//!
//! Connects one [`archlink_client::Session`] using raw server ids, prints the
//! server log with ANSI colors, and turns stdin lines into session calls.
//!
//! - [`command`]: stdin line parsing
//! - [`console`]: colored log output
//! - [`runner`]: command execution and background update polling

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod console;
pub mod runner;

pub use command::{Command, CommandError, parse};
pub use console::{Console, render};
pub use runner::{CheckedLog, CliError, Flow, UpdateCursor, execute, poll_updates, spawn_watcher};
