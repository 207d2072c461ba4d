//! Tooling & Integration Layer
//!
//! Command-line front end over the walker.

pub mod cli;

pub use cli::{Cli, CliContext, PrintPaths};
