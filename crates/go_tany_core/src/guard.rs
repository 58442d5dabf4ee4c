//! crates/go_tany_core/src/guard.rs
//!
//! Route guards. Both variants read the same session state and decide whether a
//! view renders, waits, or redirects.

use crate::route::Route;
use crate::session::SessionState;

/// The shared guard state machine.
///
/// Starts in `Resolving`; leaves it exactly once, on the identity provider's first
/// callback; then moves freely between the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Resolving,
    Unauthenticated,
    Authenticated,
}

impl From<&SessionState> for AuthPhase {
    fn from(state: &SessionState) -> Self {
        if state.is_resolving {
            AuthPhase::Resolving
        } else if state.identity.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// Signed-in users only; others go to the sign-in page.
    Protected,
    /// Signed-out users only (login, register); others go to the landing page.
    PublicOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Neutral loading indicator; neither protected nor public content.
    Loading,
    /// Render nothing at all.
    Blank,
    Redirect(Route),
    Render,
}

impl GuardKind {
    pub fn decide(self, phase: AuthPhase) -> GuardDecision {
        match (self, phase) {
            (GuardKind::Protected, AuthPhase::Resolving) => GuardDecision::Loading,
            (GuardKind::Protected, AuthPhase::Unauthenticated) => GuardDecision::Redirect(Route::SIGN_IN),
            (GuardKind::Protected, AuthPhase::Authenticated) => GuardDecision::Render,
            (GuardKind::PublicOnly, AuthPhase::Resolving) => GuardDecision::Blank,
            (GuardKind::PublicOnly, AuthPhase::Authenticated) => {
                GuardDecision::Redirect(Route::AUTHENTICATED_LANDING)
            }
            (GuardKind::PublicOnly, AuthPhase::Unauthenticated) => GuardDecision::Render,
        }
    }
}

/// Decides navigation to `path` for the given session state.
pub fn navigate(path: &str, state: &SessionState) -> GuardDecision {
    match Route::from_path(path).guard() {
        Some(kind) => kind.decide(AuthPhase::from(state)),
        None => GuardDecision::Render,
    }
}
