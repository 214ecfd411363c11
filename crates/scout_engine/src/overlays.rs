//! Best-effort dismissal of modals, toasts and password-manager prompts.

use scout_logging::{scout_debug, scout_info};

use crate::driver::BrowserDriver;
use crate::locator::find_first;
use crate::pacing::Pacer;
use crate::site::SiteSettings;

const CLOSE_OVERLAYS_SCRIPT: &str = r#"
var closed = 0;
var selectors = [
    '[aria-label="Close"]',
    'button[aria-label="Close"]',
    '.close-button',
    '[data-testid="close-button"]',
    '.modal-close',
    '[aria-label="Dismiss"]'
];
selectors.forEach(function (selector) {
    document.querySelectorAll(selector).forEach(function (element) {
        if (element.offsetParent !== null) {
            try { element.click(); closed++; } catch (e) {}
        }
    });
});
return closed;
"#;

const BROWSER_PASSWORD_PROMPT_SCRIPT: &str = r#"
var bubble = document.querySelector('div[data-automation-id="password-manager-ui"]');
if (bubble) { bubble.style.display = 'none'; }
document.dispatchEvent(new KeyboardEvent('keydown', {'key': 'Escape'}));
return true;
"#;

/// Clicks every visible close/dismiss control. Returns how many were closed.
pub async fn dismiss_overlays(driver: &dyn BrowserDriver, pacer: &Pacer) -> u64 {
    let closed = match driver.run_script(CLOSE_OVERLAYS_SCRIPT, Vec::new()).await {
        Ok(value) => value.as_u64().unwrap_or(0),
        Err(err) => {
            scout_debug!("Overlay dismissal failed: {}", err);
            0
        }
    };
    if closed > 0 {
        scout_info!("Closed {} overlays", closed);
        pacer.pause(pacer.settings().after_overlay).await;
    }
    closed
}

/// Dismisses the browser-level and the site-level "save password" prompt.
/// Returns whether a site-level dismiss control was clicked.
pub async fn dismiss_save_password_prompt(
    driver: &dyn BrowserDriver,
    site: &SiteSettings,
    pacer: &Pacer,
) -> bool {
    if let Err(err) = driver
        .run_script(BROWSER_PASSWORD_PROMPT_SCRIPT, Vec::new())
        .await
    {
        scout_debug!("Browser password prompt script failed: {}", err);
    }

    let Some(found) = find_first(driver, &site.save_password_dismiss).await else {
        scout_debug!("No save-password prompt found");
        return false;
    };
    match driver.click(&found.element).await {
        Ok(()) => {
            scout_info!("Dismissed save-password prompt via {}", found.locator);
            pacer.think().await;
            true
        }
        Err(err) => {
            scout_debug!("Could not click save-password dismiss: {}", err);
            false
        }
    }
}
