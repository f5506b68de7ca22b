//! Command trait definition for CLI commands.
//!
//! This module defines the [`Command`] trait that all samshard subcommands implement.
//! The trait uses `enum_dispatch` to forward from the subcommand enum without boxing.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all samshard CLI commands.
///
/// The `command_line` parameter carries the full invocation as typed by the user.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
