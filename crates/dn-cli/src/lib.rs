//! Availability notifier CLI library.
//!
//! This crate provides the `dn` command line: the web server plus local
//! status, editing, countdown and suggestion commands.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, StoreKind};
