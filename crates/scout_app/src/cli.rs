use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use scout_engine::Credentials;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "lead-scout",
    about = "Searches a neighborhood feed for local service leads and writes a report"
)]
pub struct Cli {
    /// RON config file (defaults to ./lead_scout.ron when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SCOUT_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "SCOUT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// GitHub token used for the second-factor relay gist
    #[arg(long, env = "GIST_TOKEN", hide_env_values = true)]
    pub gist_token: Option<String>,

    /// Base URL of the filter/notify/report webhook
    #[arg(long, env = "SCOUT_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Search term; repeat to replace the configured list
    #[arg(long = "term", short = 't')]
    pub terms: Vec<String>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub log_level: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,
}

impl Cli {
    /// Flags win over the config file.
    pub fn apply(&self, config: &mut AppConfig) {
        if !self.terms.is_empty() {
            config.terms = self.terms.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(url) = &self.webhook_url {
            config.notifier.webhook_url = Some(url.clone());
        }
        if self.headless {
            config.webdriver.headless = true;
        }
    }

    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Ok(Credentials::new(user.clone(), pass.clone()))
            }
            _ => bail!("credentials missing: set --username/--password or SCOUT_USERNAME/SCOUT_PASSWORD"),
        }
    }
}
