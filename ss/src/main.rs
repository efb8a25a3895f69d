use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use sessionstore::cli::{Cli, Command};
use sessionstore::{LocalStore, default_store_path};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let path = cli.file.unwrap_or_else(default_store_path);
    let store = LocalStore::new(&path);

    info!("sessionstore opened {}", path.display());

    match cli.command {
        Command::List { user, limit } => {
            let sessions = store.list(&user, limit).context("Failed to read session store")?;
            if sessions.is_empty() {
                println!("No sessions found");
            } else {
                for s in sessions {
                    println!("{} {} {}", s.session_id.yellow(), s.timestamp.dimmed(), s.summary());
                }
            }
        }
        Command::Show { session_id } => {
            let session = store
                .get(&session_id)
                .context("Failed to read session store")?
                .ok_or_else(|| eyre::eyre!("Session not found: {}", session_id))?;
            println!("{} {}", "Problem:".bold(), session.problem);
            if !session.context.is_empty() {
                println!("{} {}", "Context:".bold(), session.context.replace('\n', ", "));
            }
            println!("{} {}", "Created:".bold(), session.timestamp);
            println!();
            println!("{}", session.response);
        }
        Command::Count => {
            let count = store.count().context("Failed to read session store")?;
            println!("{} sessions in {}", count.to_string().cyan(), path.display());
        }
    }

    Ok(())
}
