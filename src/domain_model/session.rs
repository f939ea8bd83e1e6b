use serde::Serialize;

/// Lifecycle of a login session as seen from one refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshed,
    Revoked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoginSucceeded,
    LoginFailed,
    RefreshSucceeded,
    RevokeSucceeded,
}

impl SessionState {
    /// Next state after `event`. `Revoked` is terminal.
    pub fn after(self, event: SessionEvent) -> SessionState {
        use SessionEvent::*;
        use SessionState::*;
        match (self, event) {
            (Revoked, _) => Revoked,
            (_, RevokeSucceeded) => Revoked,
            (_, LoginFailed) => Anonymous,
            (_, LoginSucceeded) => Authenticated,
            (_, RefreshSucceeded) => Refreshed,
        }
    }
}
