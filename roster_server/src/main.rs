//! Roster command-line interface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roster_core::{config, RosterCore};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,roster=debug,roster_core=debug,roster_server=debug";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding `config.json` and the default database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Overrides `database_url` from the config file
        #[arg(long, env = "ROSTER_DATABASE_URL")]
        database_url: Option<String>,

        /// Overrides `bind_addr` from the config file
        #[arg(long, env = "ROSTER_BIND_ADDR")]
        bind: Option<String>,
    },

    /// Create a teacher account
    CreateAccount {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// Grant access to the admin statistics
        #[arg(long)]
        admin: bool,
    },

    /// Issue a session token for an existing account
    IssueSession {
        #[arg(long)]
        email: String,
    },
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let mut config = config::get_or_init(cli.data_dir)
        .await
        .context("failed to load configuration")?;

    match cli.command {
        Command::Serve { database_url, bind } => {
            if let Some(url) = database_url {
                config.database_url = url;
            }
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }

            let core = RosterCore::start(config).await?;
            let purged = core.accounts.purge_expired_sessions().await?;
            if purged > 0 {
                tracing::info!(purged, "removed expired sessions");
            }

            let listener = tokio::net::TcpListener::bind(&core.config.bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", core.config.bind_addr))?;
            tracing::info!(addr = %listener.local_addr()?, "listening");

            roster_server::serve(core.clone(), listener, async {
                tokio::signal::ctrl_c().await.ok();
            })
            .await?;

            tracing::info!("shutting down");
            core.shutdown().await?;
        }
        Command::CreateAccount {
            email,
            first_name,
            last_name,
            admin,
        } => {
            let core = RosterCore::start(config).await?;
            let account = core
                .accounts
                .create_account(&email, &first_name, &last_name, admin)
                .await?;
            println!("{}", account.id);
            core.shutdown().await?;
        }
        Command::IssueSession { email } => {
            let core = RosterCore::start(config).await?;
            let account = core
                .accounts
                .find_by_email(&email)
                .await?
                .with_context(|| format!("no account with email {email}"))?;

            let ttl = core.config.session_ttl()?;
            let session = core.accounts.issue_session(account.id, ttl).await?;
            println!("{}", session.token);
            core.shutdown().await?;
        }
    }

    Ok(())
}
