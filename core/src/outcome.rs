//! Outcome and check taxonomy for a single iteration

use serde::{Deserialize, Serialize};

/// Handshake status of a successful WebSocket upgrade
pub const SWITCHING_PROTOCOLS: u16 = 101;

/// Final classification of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Handshake upgraded: the pool had room
    Admitted,

    /// Server signaled that its pool is full
    Rejected,

    /// Any other status, or a transport failure during connect
    Unexpected,

    /// Login did not yield a usable credential
    AuthFailed,
}

impl Outcome {
    /// All outcomes, in reporting order
    pub const ALL: [Outcome; 4] = [
        Outcome::Admitted,
        Outcome::Rejected,
        Outcome::Unexpected,
        Outcome::AuthFailed,
    ];

    /// Classify a handshake status
    pub fn from_status(status: u16, rejection_status: u16) -> Self {
        if status == SWITCHING_PROTOCOLS {
            Outcome::Admitted
        } else if status == rejection_status {
            Outcome::Rejected
        } else {
            Outcome::Unexpected
        }
    }

    /// Name of the metrics counter for this outcome
    pub fn counter_name(&self) -> &'static str {
        match self {
            Outcome::Admitted => "pool_is_not_full",
            Outcome::Rejected => "pool_is_full",
            Outcome::Unexpected => "unexpected_response",
            Outcome::AuthFailed => "auth_failed",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Outcome::Admitted => 0,
            Outcome::Rejected => 1,
            Outcome::Unexpected => 2,
            Outcome::AuthFailed => 3,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.counter_name())
    }
}

/// Pass/fail assertion made during an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Login returned 2xx with an access token
    LoginSucceeded,

    /// Handshake answered 101
    HandshakeUpgraded,
}

impl Check {
    /// All checks, in reporting order
    pub const ALL: [Check; 2] = [Check::LoginSucceeded, Check::HandshakeUpgraded];

    /// Display name of the check
    pub fn name(&self) -> &'static str {
        match self {
            Check::LoginSucceeded => "login succeeded",
            Check::HandshakeUpgraded => "status is 101",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Check::LoginSucceeded => 0,
            Check::HandshakeUpgraded => 1,
        }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
