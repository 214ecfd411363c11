//! Scout engine: browser automation, second-factor relay and result delivery.
mod collector;
mod driver;
mod extract;
mod locator;
mod navigator;
mod notify;
mod orchestrator;
mod overlays;
mod pacing;
mod persist;
mod relay;
mod scan;
mod session;
mod sink;
mod site;
mod webdriver;

pub use collector::{ScrollCollector, DEFAULT_MAX_ROUNDS};
pub use driver::{BrowserDriver, DriverError, ElementHandle, ENTER_KEY};
pub use extract::{ExtractorError, ExtractorSelectors, FeedPostExtractor, PostExtractor};
pub use locator::{displayed_sorted_by_id, find_first, find_first_displayed, Located, Locator};
pub use navigator::{NavigationError, NavigationReport, PageNavigator};
pub use notify::{LeadNotifier, LogNotifier, NotifyError, WebhookNotifier};
pub use orchestrator::{ScanOutcome, SearchOrchestrator};
pub use overlays::{dismiss_overlays, dismiss_save_password_prompt};
pub use pacing::{DelayRange, Pacer, PacingSettings};
pub use persist::{ensure_output_dir, report_file_name, PersistError, ReportWriter};
pub use relay::{
    AuthRelay, AuthRelayToken, GistRelayStore, RelayError, RelayHandle, RelaySettings,
    RelayStore, GIST_FILENAME,
};
pub use scan::{ScanError, ScanSettings, Scanner};
pub use session::{Credentials, SessionManager};
pub use sink::{Clock, DeliveryReport, ReportSink, ResultSink, SinkError};
pub use site::SiteSettings;
pub use webdriver::{WebDriverClient, WebDriverSettings, ELEMENT_KEY};
