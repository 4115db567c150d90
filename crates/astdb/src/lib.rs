//! Command-line entrypoint for the AST-aware semantic code index: wires
//! the domain ports to their concrete providers and dispatches to one
//! `commands::*` module per subcommand.

pub mod cli;
pub mod commands;
pub mod selection;
pub mod wiring;

pub use cli::{Cli, Command};
