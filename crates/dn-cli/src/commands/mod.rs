//! CLI subcommand implementations.

pub mod countdown;
pub mod serve;
pub mod set;
pub mod status;
pub mod suggest;
