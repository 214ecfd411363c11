use std::sync::Once;

use pretty_assertions::assert_eq;
use scout_core::{FailureReason, Session, SessionState, TransitionError};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scout_logging::initialize_for_tests);
}

#[test]
fn new_session_starts_in_init() {
    init_logging();
    let session = Session::new();
    assert_eq!(session.state(), &SessionState::Init);
    assert_eq!(session.history(), &[SessionState::Init]);
    assert!(!session.is_authenticated());
}

#[test]
fn already_logged_in_path_skips_login() {
    init_logging();
    let mut session = Session::new();
    session.advance(SessionState::Connecting).unwrap();
    session.advance(SessionState::CheckingAuth).unwrap();
    session.advance(SessionState::Authenticated).unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.history().len(), 4);
}

#[test]
fn second_factor_path_is_accepted() {
    init_logging();
    let mut session = Session::new();
    for state in [
        SessionState::Connecting,
        SessionState::CheckingAuth,
        SessionState::LoggingIn,
        SessionState::AwaitingSecondFactor,
        SessionState::Authenticated,
    ] {
        session.advance(state).unwrap();
    }
    assert!(session.is_authenticated());
}

#[test]
fn states_are_never_revisited() {
    init_logging();
    let mut session = Session::new();
    session.advance(SessionState::Connecting).unwrap();
    let err = session.advance(SessionState::Connecting).unwrap_err();
    assert_eq!(
        err,
        TransitionError {
            from: "Connecting",
            to: "Connecting"
        }
    );

    session.advance(SessionState::CheckingAuth).unwrap();
    session.advance(SessionState::LoggingIn).unwrap();
    assert!(session.advance(SessionState::CheckingAuth).is_err());
    assert_eq!(session.state(), &SessionState::LoggingIn);
}

#[test]
fn cannot_skip_ahead_of_the_table() {
    init_logging();
    let mut session = Session::new();
    assert!(session.advance(SessionState::Authenticated).is_err());
    assert!(session.advance(SessionState::AwaitingSecondFactor).is_err());
    assert_eq!(session.state(), &SessionState::Init);
}

#[test]
fn failure_is_terminal_and_carries_reason() {
    init_logging();
    let mut session = Session::new();
    session.advance(SessionState::Connecting).unwrap();
    assert!(session.fail(FailureReason::LoginFormNotFound));
    assert_eq!(session.failure(), Some(&FailureReason::LoginFormNotFound));
    assert_eq!(
        session.state().to_string(),
        "Failed(login form not found)"
    );

    assert!(!session.fail(FailureReason::RelayTimeout));
    assert!(session.advance(SessionState::Authenticated).is_err());
    assert_eq!(session.failure(), Some(&FailureReason::LoginFormNotFound));
}

#[test]
fn authenticated_cannot_fail_afterwards() {
    init_logging();
    let mut session = Session::new();
    session.advance(SessionState::Connecting).unwrap();
    session.advance(SessionState::CheckingAuth).unwrap();
    session.advance(SessionState::Authenticated).unwrap();
    assert!(!session.fail(FailureReason::SecondFactorUnconfirmed));
    assert!(session.is_authenticated());
}

#[test]
fn failure_reasons_render_readably() {
    assert_eq!(
        FailureReason::SecondFactorUnconfirmed.to_string(),
        "second-factor verification unconfirmed"
    );
    assert_eq!(
        FailureReason::RelayUnavailable("no relay configured".into()).to_string(),
        "second-factor relay unavailable: no relay configured"
    );
}
