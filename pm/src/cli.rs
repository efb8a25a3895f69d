//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::request::{CompanySize, Industry};

/// PlanMind - business strategy consultant
#[derive(Parser)]
#[command(
    name = "pm",
    about = "Generate, store and export business strategy plans",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a strategic plan for a business problem
    Generate {
        /// The business problem, in plain words
        problem: String,

        /// Industry of the business
        #[arg(short, long, value_enum)]
        industry: Option<Industry>,

        /// Size of the company
        #[arg(short = 's', long, value_enum)]
        company_size: Option<CompanySize>,

        /// Free-form context (overrides --industry/--company-size)
        #[arg(long)]
        context: Option<String>,

        /// Do not store the session
        #[arg(long)]
        no_save: bool,

        /// Also export the plan to this file
        #[arg(long, value_name = "PATH")]
        pdf: Option<PathBuf>,
    },

    /// List previous sessions, most recent first
    Sessions {
        /// Maximum number of sessions
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export a stored session
    Export {
        /// Session ID (or unique prefix)
        session_id: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// How many recent sessions to search
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Show which tier of each chain is available
    Tiers,

    /// Generate the example strategy
    Example,
}

/// Output format for listing commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Path of the log file written by `pm`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planmind")
        .join("logs")
        .join("planmind.log")
}
