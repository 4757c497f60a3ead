//! Command-line interface and bootstrap

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::auth;
use crate::client::{MailClient, ProductionGmailClient};
use crate::config::{Config, ScheduleConfig};
use crate::error::{GmailError, Result};
use crate::label_manager::LabelManager;
use crate::policy::ErrorPolicy;
use crate::responder::{ReplyDecider, ReplyTemplate};
use crate::scanner::{SenderFilter, SystemClock, ThreadScanner};
use crate::scheduler::{RunSummary, Scheduler};

#[derive(Parser, Debug)]
#[command(name = "gmail-autoreply")]
#[command(version = "0.1.0")]
#[command(about = "Send one automatic reply to every new Gmail thread", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Only reply to threads from this address ("anyone" for all senders)
    pub sender: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = ".gmail-autoreply/token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log lines as JSON objects
    #[arg(long)]
    pub json_logs: bool,

    /// Run a single scan and exit
    #[arg(long)]
    pub once: bool,

    /// Log what would be sent without sending or labeling
    #[arg(long)]
    pub dry_run: bool,

    /// Short development intervals (10-15 seconds)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API and cache the token
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Fold command-line flags into the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(sender) = &self.sender {
            config.scan.sender = sender.clone();
        }
        if self.dry_run {
            config.execution.dry_run = true;
        }
        if self.dev {
            config.schedule = ScheduleConfig::development();
        }
    }

    pub fn max_scans(&self) -> Option<u64> {
        self.once.then_some(1)
    }
}

/// Wire the scan components around one shared client
pub fn build_scanner(client: Arc<dyn MailClient>, config: &Config) -> ThreadScanner {
    let labels = LabelManager::new(Arc::clone(&client), config.reply.label_name.clone());
    let decider = ReplyDecider::new(
        Arc::clone(&client),
        ReplyTemplate::from_config(&config.reply),
        config.execution.dry_run,
    );
    ThreadScanner::new(client, labels, decider, Arc::new(SystemClock))
}

/// Poll with an already authenticated client until shutdown, scan limit or halt
pub async fn run_with_client<S>(
    client: Arc<dyn MailClient>,
    config: &Config,
    max_scans: Option<u64>,
    shutdown: S,
) -> Result<RunSummary>
where
    S: Future<Output = ()>,
{
    let sender: SenderFilter = config.scan.sender.parse()?;
    let scanner = build_scanner(client, config);

    if config.execution.dry_run {
        info!("Dry run: replies will be logged, not sent");
    }

    let mut scheduler = Scheduler::new(
        config.schedule,
        StdRng::from_entropy(),
        ErrorPolicy::new(&config.policy),
    );
    if let Some(max) = max_scans {
        scheduler = scheduler.with_max_scans(max);
    }

    scheduler
        .run(|| scanner.scan(&sender), shutdown)
        .await
}

/// Default command: load config, authorize, then poll until Ctrl-C
pub async fn run_autoreply(cli: &Cli) -> Result<RunSummary> {
    let mut config = Config::load(&cli.config).await?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    info!("Authorizing the client...");
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    let client: Arc<dyn MailClient> = Arc::new(ProductionGmailClient::new(hub));

    let address = client.get_profile_email().await?;
    info!("Logged in as {}", address);

    run_with_client(client, &config, cli.max_scans(), shutdown_signal()).await
}

/// `auth` subcommand: run the consent flow and report the account
pub async fn authenticate(credentials: &Path, token_cache: &Path, force: bool) -> Result<String> {
    if force && token_cache.exists() {
        tokio::fs::remove_file(token_cache).await?;
        info!("Removed existing token cache");
    }

    let hub = auth::initialize_gmail_hub(credentials, token_cache).await?;
    ProductionGmailClient::new(hub).get_profile_email().await
}

/// `init-config` subcommand
pub async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(GmailError::ConfigError(format!(
            "Configuration file already exists at {:?}. Use --force to overwrite.",
            output
        )));
    }
    Config::create_example(output).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available, run until halted
        std::future::pending::<()>().await;
    }
}
