//! Protocol client capability consumed by the iteration workflow
//!
//! The core never speaks HTTP or WebSocket itself. It drives an
//! implementation of [`ProtocolClient`] (see the `churn-bench-client`
//! crate) and only inspects the statuses and events it reports.

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

// ============================================================================
// Identity & credentials
// ============================================================================

/// Login identity of a synthetic user
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Identity {
    /// Login name
    pub login: String,

    /// Password
    pub password: String,
}

impl Identity {
    /// Prefix of every synthetic login name
    pub const LOGIN_PREFIX: &'static str = "test_user_";

    /// Identity of the virtual user with the given one-based index
    ///
    /// The same user returns on every iteration it runs.
    pub fn for_user(index: usize, password: impl Into<String>) -> Self {
        Self {
            login: format!("{}{}", Self::LOGIN_PREFIX, index),
            password: password.into(),
        }
    }
}

/// Bearer token obtained by one login
///
/// Owned by a single iteration and dropped with it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw access token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Result of a login call
///
/// Non-success statuses are reported here rather than as errors; the
/// workflow decides what counts as a usable login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// HTTP status code
    pub status: u16,

    /// Raw response body, if any
    pub body: Option<Bytes>,
}

impl LoginResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Who caused a transport error seen during a connection's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Follows from the client closing the socket itself
    LocalClose,

    /// Anything else: the peer, the network or the protocol
    Remote,
}

/// Lifecycle event of one WebSocket connection, in the order observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed
    Open,

    /// Transport error while the connection was alive or closing
    Error {
        /// Attribution of the error
        origin: ErrorOrigin,
        /// Transport error description
        message: String,
    },

    /// Connection fully closed
    Close,
}

/// Result of a WebSocket connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectResponse {
    /// Final handshake status (101 on upgrade)
    pub status: u16,

    /// Lifecycle events, oldest first
    pub events: Vec<ConnectionEvent>,
}

impl ConnectResponse {
    /// Response carrying only a status and no lifecycle events
    pub fn status_only(status: u16) -> Self {
        Self {
            status,
            events: Vec::new(),
        }
    }
}

/// Transport-level failure that produced no usable response
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Request could not be built (bad header value, bad url)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection or I/O failure before any status was received
    #[error("transport error: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,
}

// ============================================================================
// Protocol Client Trait
// ============================================================================

/// Login and WebSocket handshake capability
///
/// Implementations must be cheap to share across workers via `Arc`.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Client identifier used in logs
    fn name(&self) -> &str;

    /// Authenticate and return the raw response
    async fn login(&self, identity: &Identity) -> Result<LoginResponse, ClientError>;

    /// Open a WebSocket with the given `Authorization` header value and
    /// close it again as soon as it is established
    ///
    /// Returns `Err` only when no handshake status was obtained.
    async fn connect(&self, url: &Url, authorization: &str)
        -> Result<ConnectResponse, ClientError>;
}
