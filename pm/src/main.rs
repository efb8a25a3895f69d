//! PlanMind - business strategy consultant
//!
//! CLI entry point for generating, listing and exporting strategy plans.

use std::fs;
use std::path::Path;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use planmind::cli::{Cli, Command, OutputFormat, get_log_path};
use planmind::config::{self, Config};
use planmind::{
    BusinessProfile, CompanySize, Industry, PLACEHOLDER, PlanMind, StrategyRequest, StrategySession, TierStatus,
};

const EXAMPLE_PROBLEM: &str =
    "Our software company is struggling with long development cycles and frequent bugs in production.";

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a .env file next to the working directory
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!(error = %e, "main: no .env loaded"),
    }

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let planmind = PlanMind::from_config(&config);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Generate {
            problem,
            industry,
            company_size,
            context,
            no_save,
            pdf,
        } => {
            let request = build_request(problem, industry, company_size, context)?;
            cmd_generate(&planmind, &config, &request, !no_save, pdf.as_deref()).await
        }
        Command::Sessions { limit, format } => cmd_sessions(&planmind, &config, limit, format).await,
        Command::Export {
            session_id,
            output,
            limit,
        } => cmd_export(&planmind, &config, &session_id, &output, limit).await,
        Command::Tiers => {
            cmd_tiers(&planmind);
            Ok(())
        }
        Command::Example => {
            let request = StrategyRequest::with_profile(
                EXAMPLE_PROBLEM,
                BusinessProfile::new(Industry::Technology, CompanySize::Medium),
            )?;
            cmd_generate(&planmind, &config, &request, false, None).await
        }
    }
}

fn build_request(
    problem: String,
    industry: Option<Industry>,
    company_size: Option<CompanySize>,
    context: Option<String>,
) -> Result<StrategyRequest> {
    debug!(?industry, ?company_size, has_context = context.is_some(), "build_request: called");
    let request = match (context, industry, company_size) {
        (Some(context), _, _) => StrategyRequest::new(problem, context),
        (None, None, None) => StrategyRequest::new(problem, ""),
        (None, industry, size) => StrategyRequest::with_profile(
            problem,
            BusinessProfile::new(industry.unwrap_or_default(), size.unwrap_or_default()),
        ),
    };
    Ok(request?)
}

fn user_id(config: &Config) -> Result<String> {
    config
        .resolve_user_id(&config::data_dir())
        .context("Failed to determine user id")
}

async fn cmd_generate(
    planmind: &PlanMind,
    config: &Config,
    request: &StrategyRequest,
    persist: bool,
    pdf: Option<&Path>,
) -> Result<()> {
    debug!(persist, ?pdf, "cmd_generate: called");
    let user_id = user_id(config)?;

    eprintln!("{}", "Generating strategic plan...".dimmed());
    let consultation = planmind.consult(request, &user_id, persist).await;
    let session = &consultation.session;

    println!("{}", session.response);

    eprintln!();
    eprintln!("{} {}", "Source:".bold(), consultation.source);
    match consultation.saved {
        Some(true) => eprintln!("{} {}", "Saved:".bold(), session.session_id.green()),
        Some(false) => eprintln!("{} {}", "Saved:".bold(), "no (every store failed)".red()),
        None => {}
    }

    if let Some(path) = pdf {
        write_export(planmind, session, path)?;
    }
    Ok(())
}

async fn cmd_sessions(planmind: &PlanMind, config: &Config, limit: usize, format: OutputFormat) -> Result<()> {
    debug!(limit, %format, "cmd_sessions: called");
    let user_id = user_id(config)?;
    let sessions = planmind.load(&user_id, limit).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No previous sessions");
                return Ok(());
            }
            for session in &sessions {
                println!(
                    "{}  {}  {}",
                    session.session_id.cyan(),
                    session.timestamp.dimmed(),
                    session.summary()
                );
            }
        }
    }
    Ok(())
}

async fn cmd_export(
    planmind: &PlanMind,
    config: &Config,
    session_id: &str,
    output: &Path,
    limit: usize,
) -> Result<()> {
    debug!(%session_id, ?output, limit, "cmd_export: called");
    let user_id = user_id(config)?;
    let sessions = planmind.load(&user_id, limit).await;

    let matches: Vec<&StrategySession> = sessions
        .iter()
        .filter(|s| s.session_id == session_id || s.session_id.starts_with(session_id))
        .collect();

    let session = match matches.as_slice() {
        [one] => *one,
        [] => return Err(eyre!("Session not found: {}", session_id)),
        many => {
            return Err(eyre!(
                "Session id '{}' is ambiguous ({} matches)",
                session_id,
                many.len()
            ));
        }
    };

    write_export(planmind, session, output)
}

fn write_export(planmind: &PlanMind, session: &StrategySession, path: &Path) -> Result<()> {
    debug!(?path, "write_export: called");
    let bytes = planmind.export(&session.problem, &session.context, &session.response);
    fs::write(path, &bytes).context(format!("Failed to write {}", path.display()))?;

    if bytes == PLACEHOLDER {
        eprintln!(
            "{} PDF renderer unavailable, wrote placeholder to {}",
            "Warning:".yellow(),
            path.display()
        );
    } else {
        eprintln!("{} {}", "Exported:".bold(), path.display());
    }
    Ok(())
}

fn print_chain(title: &str, tiers: &[TierStatus]) {
    println!("{}", title.bold());
    for (i, tier) in tiers.iter().enumerate() {
        let state = if tier.availability.is_ready() {
            tier.availability.to_string().green()
        } else {
            tier.availability.to_string().yellow()
        };
        println!("  {}. {:<12} {}", i + 1, tier.name, state);
    }
}

fn cmd_tiers(planmind: &PlanMind) {
    debug!("cmd_tiers: called");
    let status = planmind.status();
    print_chain("Generation", &status.generation);
    print_chain("Persistence", &status.persistence);
    print_chain("Export", &status.export);
}
