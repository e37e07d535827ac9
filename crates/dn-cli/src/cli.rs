//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Minimal availability notifier.
///
/// Publishes whether you are available today, counts down to the next
/// change and lets an admin edit the marked days.
#[derive(Debug, Parser)]
#[command(name = "dn", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the web server.
    Serve {
        /// Address to listen on (overrides `bind` in the config).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show today's availability.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace the stored dates.
    Set {
        /// Dates as YYYY-MM-DD.
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        dates: Vec<String>,

        /// Remove every stored date.
        #[arg(long)]
        clear: bool,
    },

    /// Count down to the next status change.
    Countdown {
        /// Print the remaining time once and exit.
        #[arg(long)]
        once: bool,
    },

    /// Ask the advisor for candidate free days. Nothing is saved.
    Suggest {
        /// Common leave schedules to take into account.
        #[arg(long, default_value = "")]
        schedules: String,

        /// Number of dates to ask for (overrides `suggestions` in the config).
        #[arg(long)]
        count: Option<u32>,
    },
}
