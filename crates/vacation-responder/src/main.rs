use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vacation_responder::config::ResponderConfig;
use vacation_responder::credentials::{repaint_console, CredentialStore};
use vacation_responder::gmail_client::GmailConnector;
use vacation_responder::pipeline::Pipeline;
use vacation_responder::scheduler::{IntervalTrigger, PollScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vacation_responder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("TLS crypto provider already installed");
    }

    let config = ResponderConfig::parse();
    config.validate()?;

    repaint_console();

    tracing::info!(
        "Starting vacation responder (label: '{}', interval: {:?})",
        config.label_name,
        config.poll_interval()
    );

    let store = CredentialStore::new(config.credentials_path.clone(), config.token_path.clone());
    let pipeline = Pipeline::from_config(GmailConnector::new(store), &config);

    if config.once {
        let report = pipeline.run_tick().await?;
        tracing::info!(
            "Replied to {} of {} new thread(s)",
            report.dispatch.sent.len(),
            report.candidates.len()
        );
        return Ok(());
    }

    let mut scheduler = PollScheduler::new(IntervalTrigger::new(config.poll_interval()), pipeline);

    tracing::info!("Vacation responder running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = scheduler.run() => {}
        result = signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown signal received, stopping...");
        }
    }

    tracing::info!("Vacation responder stopped");
    Ok(())
}
