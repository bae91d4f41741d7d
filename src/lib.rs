//! DeviShell: an interactive command shell front-end.
//!
//! A line typed at the prompt is split on whitespace and resolved through a
//! fixed chain: alias substitution, builtin commands, extended commands,
//! plugins loaded from shared libraries, and finally an external command
//! interpreter. All state lives in a [`ShellContext`] that the [`Interpreter`]
//! owns and lends to every handler.
//!
//! The public modules expose the pieces for embedding or extending the shell:
//! [`command`] for writing commands, [`router`] for dispatching lines without
//! the interactive loop, and [`completer`] for the completion engine.

mod builtin;
pub mod command;
pub mod completer;
pub mod config;
mod context;
pub mod env;
pub mod error;
mod extended;
pub mod external;
mod history;
mod interpreter;
pub mod plugin;
pub mod prompt;
pub mod report;
pub mod router;
mod script;
pub mod store;

pub use context::{ShellContext, standard_registry};
pub use history::HistoryRecord;
pub use interpreter::Interpreter;
pub use script::run_startup_script;
