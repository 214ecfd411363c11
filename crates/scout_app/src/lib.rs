//! Wiring for the `lead-scout` binary: configuration, secrets and the scan run.

pub mod cli;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scout_core::{ScanResult, TermStatus};
use scout_engine::{
    AuthRelay, DeliveryReport, FeedPostExtractor, GistRelayStore, LeadNotifier, LogNotifier,
    Pacer, RelaySettings, ReportSink, ReportWriter, ScanError, Scanner, WebDriverClient,
    WebhookNotifier,
};
use scout_logging::{scout_error, scout_info, scout_warn};

pub use cli::Cli;
pub use config::{AppConfig, LogSettings, NotifierSettings, DEFAULT_CONFIG_FILE, DEFAULT_TERMS};

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    scout_logging::initialize(
        config.log.destination,
        scout_logging::parse_level(&config.log.level),
        &config.log.file,
    );
    scout_info!(
        "lead-scout starting: {} search terms, reports in {:?}",
        config.terms.len(),
        config.output_dir
    );

    let credentials = cli.credentials()?;
    let notifier = build_notifier(&config.notifier)?;
    let relay = build_relay(cli.gist_token.as_deref(), &config.relay, notifier.clone())?;
    let extractor = FeedPostExtractor::new(&config.extractor, &config.site.base_url)
        .context("invalid extractor selectors")?;
    let sink = ReportSink::new(ReportWriter::new(config.output_dir.clone()), notifier);

    let scanner = Scanner::new(
        config.terms.clone(),
        credentials,
        Arc::new(extractor),
        Arc::new(sink),
    )
    .with_site(config.site.clone())
    .with_pacer(Pacer::new(config.pacing.clone()))
    .with_relay(relay)
    .with_settings(config.scan_settings());

    let client = WebDriverClient::connect(&config.webdriver)
        .await
        .with_context(|| format!("connecting to WebDriver at {}", config.webdriver.endpoint))?;

    match scanner.run(Arc::new(client), shutdown_signal()).await {
        Ok(outcome) => {
            log_summary(&outcome.result);
            let delivery = outcome.delivery.context("delivering scan results")?;
            log_delivery(&delivery);
            Ok(())
        }
        Err(ScanError::Interrupted) => {
            scout_warn!("Scan interrupted; browser session released");
            Ok(())
        }
        Err(err) => {
            scout_error!("Scan aborted: {}", err);
            Err(err.into())
        }
    }
}

pub fn build_notifier(settings: &NotifierSettings) -> Result<Arc<dyn LeadNotifier>> {
    match &settings.webhook_url {
        Some(url) if !url.trim().is_empty() => {
            let notifier = WebhookNotifier::new(url, Duration::from_secs(settings.timeout_secs))
                .context("building webhook notifier")?;
            scout_info!("Notifications go to webhook {}", url);
            Ok(Arc::new(notifier))
        }
        _ => {
            scout_info!("No webhook configured; every post is kept and only logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// `None` without a token; a second-factor challenge then fails the session.
pub fn build_relay(
    token: Option<&str>,
    settings: &RelaySettings,
    notifier: Arc<dyn LeadNotifier>,
) -> Result<Option<AuthRelay>> {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        scout_warn!("No GIST_TOKEN set; second-factor challenges cannot be answered");
        return Ok(None);
    };
    let store = GistRelayStore::new(&settings.api_base, token).context("building gist relay")?;
    Ok(Some(AuthRelay::from_settings(
        Arc::new(store),
        notifier,
        settings,
    )))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        scout_error!("Cannot listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    scout_warn!("Ctrl-C received, stopping");
}

fn log_summary(result: &ScanResult) {
    for outcome in result.term_outcomes() {
        match &outcome.status {
            TermStatus::Completed { found } => {
                scout_info!("Term '{}': {} posts", outcome.term, found)
            }
            TermStatus::NavigationFailed(reason) => {
                scout_warn!("Term '{}': search failed: {}", outcome.term, reason)
            }
            TermStatus::CollectionFailed(reason) => {
                scout_warn!("Term '{}': collection failed: {}", outcome.term, reason)
            }
        }
    }
    scout_info!("{} unique posts across all terms", result.len());
}

fn log_delivery(delivery: &DeliveryReport) {
    match &delivery.report_path {
        Some(path) => scout_info!(
            "Report written to {:?}; {} relevant leads",
            path,
            delivery.relevant.len()
        ),
        None => scout_info!("No posts found; no report written"),
    }
}
