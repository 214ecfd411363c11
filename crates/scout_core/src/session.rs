use std::fmt;

use thiserror::Error;

/// Why a session ended up in [`SessionState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    LoginFormNotFound,
    SecondFactorUnconfirmed,
    RelayTimeout,
    RelayUnavailable(String),
    Driver(String),
    InvalidTransition(TransitionError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::LoginFormNotFound => write!(f, "login form not found"),
            FailureReason::SecondFactorUnconfirmed => {
                write!(f, "second-factor verification unconfirmed")
            }
            FailureReason::RelayTimeout => write!(f, "no second-factor code within the wait window"),
            FailureReason::RelayUnavailable(message) => {
                write!(f, "second-factor relay unavailable: {message}")
            }
            FailureReason::Driver(message) => write!(f, "browser driver failure: {message}"),
            FailureReason::InvalidTransition(err) => write!(f, "{err}"),
        }
    }
}

impl From<TransitionError> for FailureReason {
    fn from(err: TransitionError) -> Self {
        FailureReason::InvalidTransition(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Connecting,
    CheckingAuth,
    LoggingIn,
    AwaitingSecondFactor,
    Authenticated,
    Failed(FailureReason),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Authenticated | SessionState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Init => "Init",
            SessionState::Connecting => "Connecting",
            SessionState::CheckingAuth => "CheckingAuth",
            SessionState::LoggingIn => "LoggingIn",
            SessionState::AwaitingSecondFactor => "AwaitingSecondFactor",
            SessionState::Authenticated => "Authenticated",
            SessionState::Failed(_) => "Failed",
        }
    }

    /// Transition table. `Failed` is reachable from every non-terminal state;
    /// nothing leaves a terminal state.
    pub fn can_advance_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (current, Failed(_)) => !current.is_terminal(),
            (Init, Connecting) => true,
            (Connecting, CheckingAuth) => true,
            (CheckingAuth, Authenticated | LoggingIn) => true,
            (LoggingIn, Authenticated | AwaitingSecondFactor) => true,
            (AwaitingSecondFactor, Authenticated) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Failed(reason) => write!(f, "Failed({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session transition {from} -> {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

/// Login state of one scan run. Every state is visited at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    history: Vec<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Init,
            history: vec![SessionState::Init],
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// All states entered so far, starting with `Init`.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.state {
            SessionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn advance(&mut self, next: SessionState) -> Result<(), TransitionError> {
        if !self.state.can_advance_to(&next) {
            return Err(TransitionError {
                from: self.state.name(),
                to: next.name(),
            });
        }
        self.history.push(next.clone());
        self.state = next;
        Ok(())
    }

    /// Moves to `Failed(reason)`. Returns `false` if the session was already
    /// terminal, in which case the state is left untouched.
    pub fn fail(&mut self, reason: FailureReason) -> bool {
        self.advance(SessionState::Failed(reason)).is_ok()
    }
}
