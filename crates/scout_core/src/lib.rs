//! Scout core: pure session state machine, post model and scan heuristics.
mod classify;
mod post;
mod relay_code;
mod report;
mod scan;
mod session;
mod stall;

pub use classify::{
    classify_body, is_metadata_fragment, starts_with_reply_indicator, PostKind, MIN_POST_CHARS,
};
pub use post::{dedup_key, dedupe, DedupSet, Post, DEDUP_KEY_CHARS};
pub use relay_code::{find_code, CODE_LEN, CODE_PLACEHOLDER};
pub use report::{render_report, REPORT_TITLE};
pub use scan::{ScanResult, TermOutcome, TermStatus};
pub use session::{FailureReason, Session, SessionState, TransitionError};
pub use stall::{StallTracker, DEFAULT_STALL_LIMIT};
