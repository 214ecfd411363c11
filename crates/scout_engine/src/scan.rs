//! One complete scan: session, searches, delivery, browser teardown.

use std::future::Future;
use std::process::Command;
use std::sync::Arc;

use scout_core::FailureReason;
use scout_logging::{scout_error, scout_info, scout_warn};
use serde::Deserialize;
use thiserror::Error;

use crate::collector::DEFAULT_MAX_ROUNDS;
use crate::driver::BrowserDriver;
use crate::extract::PostExtractor;
use crate::orchestrator::{ScanOutcome, SearchOrchestrator};
use crate::pacing::Pacer;
use crate::relay::AuthRelay;
use crate::session::{Credentials, SessionManager};
use crate::sink::ResultSink;
use crate::site::SiteSettings;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("session not established: {0}")]
    Session(FailureReason),
    #[error("scan interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub max_rounds: u32,
    /// Program and arguments run when the browser cannot be quit cleanly.
    pub force_kill: Option<Vec<String>>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            force_kill: Some(vec![
                "pkill".to_string(),
                "-f".to_string(),
                "chrome".to_string(),
            ]),
        }
    }
}

pub struct Scanner {
    terms: Vec<String>,
    credentials: Credentials,
    site: SiteSettings,
    pacer: Pacer,
    relay: Option<AuthRelay>,
    extractor: Arc<dyn PostExtractor>,
    sink: Arc<dyn ResultSink>,
    settings: ScanSettings,
}

impl Scanner {
    pub fn new(
        terms: Vec<String>,
        credentials: Credentials,
        extractor: Arc<dyn PostExtractor>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            terms,
            credentials,
            site: SiteSettings::default(),
            pacer: Pacer::default(),
            relay: None,
            extractor,
            sink,
            settings: ScanSettings::default(),
        }
    }

    pub fn with_site(mut self, site: SiteSettings) -> Self {
        self.site = site;
        self
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_relay(mut self, relay: Option<AuthRelay>) -> Self {
        self.relay = relay;
        self
    }

    pub fn with_settings(mut self, settings: ScanSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the scan until it finishes or `shutdown` resolves. The browser
    /// session is quit on every path.
    pub async fn run<F>(
        &self,
        driver: Arc<dyn BrowserDriver>,
        shutdown: F,
    ) -> Result<ScanOutcome, ScanError>
    where
        F: Future<Output = ()>,
    {
        let mut teardown = KillOnDrop::new(self.settings.force_kill.as_deref());
        let outcome = tokio::select! {
            outcome = self.scan(driver.as_ref()) => outcome,
            () = shutdown => {
                scout_warn!("Shutdown requested, abandoning scan");
                Err(ScanError::Interrupted)
            }
        };
        self.release(driver.as_ref()).await;
        teardown.disarm();
        outcome
    }

    async fn scan(&self, driver: &dyn BrowserDriver) -> Result<ScanOutcome, ScanError> {
        let session = SessionManager::new(driver, &self.site, &self.pacer, &self.credentials)
            .with_relay(self.relay.as_ref())
            .establish()
            .await;
        if let Some(reason) = session.failure() {
            return Err(ScanError::Session(reason.clone()));
        }

        scout_info!("Session ready, scanning {} search terms", self.terms.len());
        let outcome = SearchOrchestrator::new(
            driver,
            &self.site,
            &self.pacer,
            self.extractor.as_ref(),
            self.sink.as_ref(),
        )
        .with_max_rounds(self.settings.max_rounds)
        .run(&self.terms)
        .await;
        Ok(outcome)
    }

    async fn release(&self, driver: &dyn BrowserDriver) {
        match driver.quit().await {
            Ok(()) => scout_info!("Browser closed"),
            Err(err) => {
                scout_warn!("Error closing browser: {}", err);
                force_kill(self.settings.force_kill.as_deref());
            }
        }
    }
}

/// Runs the force-kill command when a scan is torn down before the browser
/// was released: a panic inside the scan or a dropped `run` future.
struct KillOnDrop<'a> {
    command: Option<&'a [String]>,
    armed: bool,
}

impl<'a> KillOnDrop<'a> {
    fn new(command: Option<&'a [String]>) -> Self {
        Self {
            command,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for KillOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            scout_warn!("Scan torn down before the browser was closed");
            force_kill(self.command);
        }
    }
}

fn force_kill(command: Option<&[String]>) {
    let Some((program, args)) = command.and_then(|command| command.split_first()) else {
        return;
    };
    match Command::new(program).args(args).status() {
        Ok(status) => scout_info!("Force-kill {} exited with {}", program, status),
        Err(err) => scout_error!("Force-kill {} failed: {}", program, err),
    }
}
