use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;
use scout_core::{render_report, Post, ScanResult, REPORT_TITLE};
use scout_logging::{scout_error, scout_info};
use thiserror::Error;

use crate::notify::{LeadNotifier, NotifyError};
use crate::persist::{report_file_name, PersistError, ReportWriter};

/// Source of the report timestamp; local wall time in the binary.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write report: {0}")]
    Persist(#[from] PersistError),
    #[error("notifier failed: {0}")]
    Notify(#[from] NotifyError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// `None` when there was nothing to write.
    pub report_path: Option<PathBuf>,
    pub relevant: Vec<Post>,
}

#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    async fn deliver(&self, result: &ScanResult) -> Result<DeliveryReport, SinkError>;
}

pub struct ReportSink {
    writer: ReportWriter,
    notifier: Arc<dyn LeadNotifier>,
    clock: Clock,
}

impl ReportSink {
    pub fn new(writer: ReportWriter, notifier: Arc<dyn LeadNotifier>) -> Self {
        Self::with_clock(
            writer,
            notifier,
            Arc::new(|| chrono::Local::now().naive_local()),
        )
    }

    pub fn with_clock(writer: ReportWriter, notifier: Arc<dyn LeadNotifier>, clock: Clock) -> Self {
        Self {
            writer,
            notifier,
            clock,
        }
    }

    fn persist(&self, posts: &[Post]) -> Result<PathBuf, PersistError> {
        let now = (self.clock)();
        let generated = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let content = render_report(REPORT_TITLE, &generated, posts);
        self.writer.write(&report_file_name(now), &content)
    }

    async fn notify(&self, posts: &[Post]) -> Result<Vec<Post>, NotifyError> {
        let relevant = self.notifier.filter_posts(posts).await?;
        if relevant.is_empty() {
            scout_info!("No relevant posts, report not sent");
        } else {
            scout_info!("Sending report with {} relevant posts", relevant.len());
            self.notifier.report(&relevant).await?;
        }
        Ok(relevant)
    }
}

#[async_trait::async_trait]
impl ResultSink for ReportSink {
    /// Writes the report, then filters and reports through the notifier.
    /// A write failure does not stop the notifier steps but is still returned.
    async fn deliver(&self, result: &ScanResult) -> Result<DeliveryReport, SinkError> {
        if result.is_empty() {
            scout_info!("No posts found, nothing to deliver");
            return Ok(DeliveryReport::default());
        }

        let persisted = self.persist(result.posts());
        match &persisted {
            Ok(path) => scout_info!("Saved {} posts to {}", result.len(), path.display()),
            Err(err) => scout_error!("Could not save report: {}", err),
        }

        let notified = self.notify(result.posts()).await;
        let report_path = persisted?;
        Ok(DeliveryReport {
            report_path: Some(report_path),
            relevant: notified?,
        })
    }
}

