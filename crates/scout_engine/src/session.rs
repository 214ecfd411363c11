//! Drives a browser from a cold start to an authenticated feed.

use std::fmt;

use scout_core::{FailureReason, Session, SessionState};
use scout_logging::{scout_debug, scout_info, scout_warn};

use crate::driver::{BrowserDriver, DriverError};
use crate::locator::{displayed_sorted_by_id, find_first, find_first_displayed};
use crate::overlays::dismiss_save_password_prompt;
use crate::pacing::Pacer;
use crate::relay::AuthRelay;
use crate::site::SiteSettings;

const BODY_TEXT_SCRIPT: &str = "return document.body ? document.body.innerText : '';";

impl From<DriverError> for FailureReason {
    fn from(err: DriverError) -> Self {
        FailureReason::Driver(err.to_string())
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct SessionManager<'a> {
    driver: &'a dyn BrowserDriver,
    site: &'a SiteSettings,
    pacer: &'a Pacer,
    credentials: &'a Credentials,
    relay: Option<&'a AuthRelay>,
}

impl<'a> SessionManager<'a> {
    pub fn new(
        driver: &'a dyn BrowserDriver,
        site: &'a SiteSettings,
        pacer: &'a Pacer,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            driver,
            site,
            pacer,
            credentials,
            relay: None,
        }
    }

    pub fn with_relay(mut self, relay: Option<&'a AuthRelay>) -> Self {
        self.relay = relay;
        self
    }

    /// Runs the login state machine once. The returned session is either
    /// `Authenticated` or `Failed`; no phase is retried.
    pub async fn establish(&self) -> Session {
        let mut session = Session::new();
        if let Err(reason) = self.drive(&mut session).await {
            scout_warn!("Session failed in {}: {}", session.state().name(), reason);
            session.fail(reason);
        }
        session
    }

    async fn drive(&self, session: &mut Session) -> Result<(), FailureReason> {
        session.advance(SessionState::Connecting)?;
        self.driver.navigate(&self.site.feed_url).await?;
        self.pacer.pause(self.pacer.settings().after_navigate).await;

        session.advance(SessionState::CheckingAuth)?;
        let url = self.driver.current_url().await?;
        scout_debug!("Landed on {}", url);
        if self.site.is_feed_location(&url) {
            scout_info!("Already logged in");
            session.advance(SessionState::Authenticated)?;
            return Ok(());
        }

        session.advance(SessionState::LoggingIn)?;
        self.submit_login(&url).await?;

        if !self.challenge_present().await? {
            dismiss_save_password_prompt(self.driver, self.site, self.pacer).await;
            session.advance(SessionState::Authenticated)?;
            scout_info!("Logged in");
            return Ok(());
        }

        session.advance(SessionState::AwaitingSecondFactor)?;
        scout_info!("Second-factor challenge detected");
        let code = self.obtain_code().await?;
        self.enter_code(&code).await?;
        if !self.confirm_login().await? {
            return Err(FailureReason::SecondFactorUnconfirmed);
        }
        dismiss_save_password_prompt(self.driver, self.site, self.pacer).await;
        session.advance(SessionState::Authenticated)?;
        scout_info!("Logged in after second-factor verification");
        Ok(())
    }

    async fn submit_login(&self, landed_on: &str) -> Result<(), FailureReason> {
        if !self.site.is_login_location(landed_on) {
            scout_debug!("Not redirected to login, opening {}", self.site.login_url);
            self.driver.navigate(&self.site.login_url).await?;
            self.pacer.pause(self.pacer.settings().after_navigate).await;
        }

        let username = find_first(self.driver, &self.site.username_field)
            .await
            .ok_or(FailureReason::LoginFormNotFound)?;
        self.pacer
            .type_text(self.driver, &username.element, &self.credentials.username)
            .await?;
        self.pacer.think().await;

        let password = find_first(self.driver, &self.site.password_field)
            .await
            .ok_or(FailureReason::LoginFormNotFound)?;
        self.pacer
            .type_text(self.driver, &password.element, self.credentials.password())
            .await?;
        self.pacer.think().await;

        let submit = find_first(self.driver, &self.site.login_submit)
            .await
            .ok_or(FailureReason::LoginFormNotFound)?;
        self.driver.click(&submit.element).await?;
        self.pacer.pause(self.pacer.settings().after_login).await;
        Ok(())
    }

    async fn challenge_present(&self) -> Result<bool, FailureReason> {
        let url = self.driver.current_url().await?;
        scout_debug!("After login: {}", url);
        if self.site.is_feed_location(&url) {
            return Ok(false);
        }
        if let Some(found) = find_first_displayed(self.driver, &self.site.challenge_fields).await {
            scout_debug!("Challenge field visible: {}", found.locator);
            return Ok(true);
        }
        match self.driver.run_script(BODY_TEXT_SCRIPT, Vec::new()).await {
            Ok(text) => {
                if let Some(phrase) = self.site.challenge_phrase_in(text.as_str().unwrap_or_default())
                {
                    scout_debug!("Challenge phrase visible: {:?}", phrase);
                    return Ok(true);
                }
            }
            Err(err) => scout_debug!("Could not read page text: {}", err),
        }
        Ok(self.site.is_challenge_location(&url))
    }

    async fn obtain_code(&self) -> Result<String, FailureReason> {
        let Some(relay) = self.relay else {
            return Err(FailureReason::RelayUnavailable(
                "no relay configured".to_string(),
            ));
        };
        match relay.request_code().await {
            Ok(Some(code)) => Ok(code),
            Ok(None) => Err(FailureReason::RelayTimeout),
            Err(err) => Err(FailureReason::RelayUnavailable(err.to_string())),
        }
    }

    async fn enter_code(&self, code: &str) -> Result<(), FailureReason> {
        let digits = displayed_sorted_by_id(self.driver, &self.site.digit_fields).await?;
        if digits.len() >= code.chars().count() {
            scout_debug!("Entering code into {} digit fields", digits.len());
            let mut buf = [0u8; 4];
            for (field, digit) in digits.iter().zip(code.chars()) {
                self.pacer
                    .type_text(self.driver, field, digit.encode_utf8(&mut buf))
                    .await?;
                self.pacer.pause(self.pacer.settings().digit).await;
            }
        } else if let Some(single) =
            find_first_displayed(self.driver, &self.site.single_code_field).await
        {
            scout_debug!("Entering code via {}", single.locator);
            self.pacer
                .type_text(self.driver, &single.element, code)
                .await?;
        } else {
            scout_warn!("No code input fields found");
            return Err(FailureReason::SecondFactorUnconfirmed);
        }
        self.pacer.pause(self.pacer.settings().after_code).await;
        Ok(())
    }

    async fn confirm_login(&self) -> Result<bool, FailureReason> {
        if self.login_confirmed().await? {
            return Ok(true);
        }
        if let Some(submit) = find_first(self.driver, &self.site.code_submit).await {
            scout_debug!("Submitting code via {}", submit.locator);
            self.driver.click(&submit.element).await?;
            self.pacer.pause(self.pacer.settings().after_code).await;
        }
        self.login_confirmed().await
    }

    async fn login_confirmed(&self) -> Result<bool, FailureReason> {
        let url = self.driver.current_url().await?;
        if self.site.is_feed_location(&url) {
            return Ok(true);
        }
        if self.site.is_login_location(&url) {
            return Ok(false);
        }
        Ok(find_first_displayed(self.driver, &self.site.logged_in_signals)
            .await
            .is_some())
    }
}
