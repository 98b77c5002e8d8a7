use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use imap_filter::filter::restore_folder;
use imap_filter::{
    load_config, ConfigError, Credentials, FilterConfig, FilterEngine, FilterError, ImapClient,
    Mailbox, RunReport,
};

#[derive(Parser, Debug)]
#[command(name = "imap-filter")]
#[command(version)]
#[command(about = "Apply ordered filter rules to an IMAP mailbox", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILEPATH", default_value = "imap-filter.yml", global = true)]
    config: PathBuf,

    /// IMAP server hostname
    #[arg(long, env = "IMAP_DOMAIN", global = true)]
    imap_domain: Option<String>,

    /// IMAP login name
    #[arg(long, env = "IMAP_USERNAME", global = true)]
    imap_username: Option<String>,

    /// IMAP password (overrides the config file)
    #[arg(long, env = "IMAP_PASSWORD", global = true, hide_env_values = true)]
    imap_password: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply the configured filters (the default)
    Run {
        /// Log what would happen without moving or labelling anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Move every message in one folder back into another
    Restore {
        /// Folder to empty
        #[arg(long)]
        from: String,

        /// Destination folder
        #[arg(long, default_value = "INBOX")]
        to: String,
    },
}

fn init_logging(verbose: bool) -> Result<(), FilterError> {
    LogTracer::init().map_err(|e| FilterError::Logging(e.to_string()))?;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| FilterError::Logging(e.to_string()))
}

fn log_report(report: &RunReport) {
    for outcome in &report.outcomes {
        if outcome.skipped {
            info!("{}: skipped (no candidates)", outcome.name);
            continue;
        }
        info!(
            "{}: {} of {} candidates matched",
            outcome.name,
            outcome.matched.len(),
            outcome.candidates
        );
        if !outcome.failed_actions.is_empty() {
            warn!("{}: failed actions {:?}", outcome.name, outcome.failed_actions);
        }
    }
    info!(
        "{} scoped fetches, {} messages left untouched",
        report.fetches,
        report.untouched.len()
    );
}

/// Flags (and their env fallbacks) win over the config file.
fn resolve_credentials(cli: &Cli, config: &FilterConfig) -> Result<Credentials, ConfigError> {
    config.credentials.resolve(
        cli.imap_domain.as_deref(),
        cli.imap_username.as_deref(),
        cli.imap_password.as_deref(),
    )
}

async fn execute(cli: Cli) -> Result<(), FilterError> {
    let config = load_config(&cli.config)?;
    info!(
        "Loaded {} filters from {}",
        config.filters.len(),
        cli.config.display()
    );
    for rule in &config.filters {
        info!("{}", rule);
    }

    let credentials = resolve_credentials(&cli, &config)?;
    let target = format!("{} as {}", credentials.domain, credentials.username);

    let mut client = ImapClient::new(credentials);
    client.connect().await?;

    let command = cli.command.unwrap_or(Commands::Run { dry_run: false });
    let result = match command {
        Commands::Run { dry_run } => {
            info!("Executing IMAP filter on {}", target);
            let mut engine = FilterEngine::new(client, config.filters).with_dry_run(dry_run);
            let report = engine.run().await;
            log_report(&report);
            client = engine.into_mailbox();
            Ok(())
        }
        Commands::Restore { from, to } => restore_folder(&mut client, &from, &to)
            .await
            .map(|moved| info!("Restored {} messages from '{}' to '{}'", moved, from, to))
            .map_err(FilterError::from),
    };

    if let Err(e) = client.logout().await {
        warn!("Logout failed: {}", e);
    }
    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("ERROR: {}", e);
        return ExitCode::FAILURE;
    }

    match execute(cli).await {
        Ok(()) => {
            info!("Filtering completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
