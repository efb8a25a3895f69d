//! CLI argument parsing for sessionstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ss")]
#[command(author, version, about = "Inspect the local strategy session store", long_about = None)]
pub struct Cli {
    /// Path to the session file (default: the planmind data directory)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a user's sessions, newest first
    List {
        /// User ID to filter by
        #[arg(short, long, required = true)]
        user: String,

        /// Maximum sessions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print one session's plan
    Show {
        /// Session ID
        #[arg(required = true)]
        session_id: String,
    },

    /// Count stored sessions
    Count,
}
