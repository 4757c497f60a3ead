use anyhow::Result;
use clap::Parser;
use gmail_autoreply::cli::{self, Cli, Commands};
use gmail_autoreply::error::GmailError;
use gmail_autoreply::scheduler::StopReason;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        display_error(&e);
        eprintln!("\nFor help, run: gmail-autoreply --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // aws-lc-rs everywhere except Windows, where ring avoids the NASM/CMake toolchain
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_autoreply=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_autoreply=info,warn"))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match &cli.command {
        Some(Commands::Auth { force }) => {
            tracing::info!("Authenticating with Gmail API...");
            let address = cli::authenticate(&cli.credentials, &cli.token_cache, *force).await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cli.token_cache);
            println!("Connected to account: {}", address);
            Ok(())
        }

        Some(Commands::InitConfig { output, force }) => {
            cli::init_config(output, *force).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nKey settings to review:");
            println!("  - scan.sender: address to watch, or \"anyone\"");
            println!("  - reply.body: text of the automatic reply");
            println!("  - schedule.min_interval_secs / max_interval_secs: wait between scans");
            println!("  - policy.on_error: \"halt\" or \"continue_on_transient\"");
            Ok(())
        }

        None => {
            let summary = cli::run_autoreply(&cli).await?;
            let reason = match summary.stop_reason {
                StopReason::Shutdown => "shutdown requested",
                StopReason::ScanLimitReached => "scan limit reached",
            };
            tracing::info!(
                "Stopped ({}): {} scans, {} failed, {} replies sent",
                reason,
                summary.scans,
                summary.failed_scans,
                summary.replies_sent
            );
            Ok(())
        }
    }
}

/// Display error with context
fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    if let Some(gmail_err) = error.downcast_ref::<GmailError>() {
        match gmail_err {
            GmailError::AuthError(_) => {
                eprintln!("\nHint: Make sure your credentials.json file is valid.");
                eprintln!("      You can download it from Google Cloud Console.");
                eprintln!("      Try running: gmail-autoreply auth --force");
            }
            GmailError::RateLimitExceeded { retry_after } => {
                eprintln!("\nHint: You've hit Gmail API rate limits.");
                eprintln!("      Wait {} seconds and try again.", retry_after);
            }
            GmailError::ServerError { .. } | GmailError::NetworkError(_) => {
                eprintln!("\nHint: This may be a temporary API error.");
                eprintln!("      Set policy.on_error = \"continue_on_transient\" to keep polling.");
            }
            GmailError::LabelError(_) => {
                eprintln!("\nHint: Check that the label name in [reply] is valid in Gmail.");
            }
            GmailError::ConfigError(_) => {
                eprintln!("\nHint: Check your configuration file for errors.");
                eprintln!("      Run: gmail-autoreply init-config --force");
            }
            _ => {}
        }
    }
}
