//! Single-iteration state machine: login -> connect -> classify -> record
//!
//! ```text
//! Start -> Authenticating -> Authenticated -> Connecting -> Classified -> Done
//!               |                                 |
//!               +------------> Aborted <----------+
//! ```
//!
//! Every failure is contained here and ends as an [`Outcome`]; nothing
//! propagates to the worker.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::config::ScenarioConfig;
use crate::metrics::MetricsAggregator;
use crate::outcome::{Check, Outcome, SWITCHING_PROTOCOLS};
use crate::traits::{
    ClientError, ConnectionEvent, Credential, ErrorOrigin, Identity, LoginResponse, ProtocolClient,
};

/// State of one iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationState {
    /// Nothing done yet
    Start,

    /// About to log in as this identity
    Authenticating(Identity),

    /// Holding a fresh credential
    Authenticated(Credential),

    /// About to open the socket with this credential
    Connecting(Credential),

    /// Handshake finished with this status
    Classified {
        /// Handshake status
        status: u16,
        /// Resulting outcome
        outcome: Outcome,
    },

    /// Finished normally
    Done(Outcome),

    /// Stopped early at login or connect
    Aborted(Outcome),
}

impl IterationState {
    /// Whether no further transitions happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, IterationState::Done(_) | IterationState::Aborted(_))
    }

    /// Outcome carried by a terminal state
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            IterationState::Done(o) | IterationState::Aborted(o) => Some(*o),
            _ => None,
        }
    }
}

/// Why a login did not produce a credential
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// No response at all
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// Non-2xx status
    #[error("login returned status {0}")]
    Status(u16),

    /// Body absent or not the expected JSON
    #[error("malformed login body: {0}")]
    MalformedBody(String),

    /// Body parsed but carried no token
    #[error("login response has no access token")]
    MissingToken,
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Extract the bearer credential from a login response
pub fn credential_from_login(response: &LoginResponse) -> Result<Credential, AuthFailure> {
    if !response.is_success() {
        return Err(AuthFailure::Status(response.status));
    }

    let body = response
        .body
        .as_ref()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AuthFailure::MalformedBody("empty body".into()))?;

    let parsed: LoginBody =
        serde_json::from_slice(body).map_err(|e| AuthFailure::MalformedBody(e.to_string()))?;

    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(Credential::new(token)),
        _ => Err(AuthFailure::MissingToken),
    }
}

/// Runs iterations for any virtual user
///
/// Shared by all workers; holds no per-iteration state.
pub struct IterationWorkflow {
    client: Arc<dyn ProtocolClient>,
    metrics: Arc<MetricsAggregator>,
    websocket_url: Url,
    password: String,
    rejection_status: u16,
}

impl IterationWorkflow {
    /// Create a workflow for the scenario's endpoints
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        metrics: Arc<MetricsAggregator>,
        config: &ScenarioConfig,
    ) -> Self {
        Self {
            client,
            metrics,
            websocket_url: config.websocket_url.clone(),
            password: config.password.clone(),
            rejection_status: config.rejection_status,
        }
    }

    /// Drive one iteration for `user` to a terminal state and record it
    pub async fn run(&self, user: usize) -> Outcome {
        let mut state = IterationState::Start;
        loop {
            state = self.step(user, state).await;
            if let Some(outcome) = state.outcome() {
                self.metrics.increment(outcome);
                tracing::trace!(user, %outcome, "Iteration recorded");
                return outcome;
            }
        }
    }

    /// Perform a single transition
    ///
    /// Terminal states are returned unchanged.
    pub async fn step(&self, user: usize, state: IterationState) -> IterationState {
        match state {
            IterationState::Start => {
                IterationState::Authenticating(Identity::for_user(user, self.password.as_str()))
            }

            IterationState::Authenticating(identity) => match self.authenticate(&identity).await {
                Ok(credential) => {
                    self.metrics.record_check(Check::LoginSucceeded, true);
                    IterationState::Authenticated(credential)
                }
                Err(reason) => {
                    self.metrics.record_check(Check::LoginSucceeded, false);
                    tracing::warn!(user, login = %identity.login, error = %reason, "Login failed");
                    IterationState::Aborted(Outcome::AuthFailed)
                }
            },

            IterationState::Authenticated(credential) => IterationState::Connecting(credential),

            IterationState::Connecting(credential) => {
                let result = self
                    .client
                    .connect(&self.websocket_url, &credential.bearer())
                    .await;
                drop(credential);

                match result {
                    Ok(response) => {
                        self.observe_events(user, &response.events);
                        let upgraded = response.status == SWITCHING_PROTOCOLS;
                        self.metrics.record_check(Check::HandshakeUpgraded, upgraded);
                        IterationState::Classified {
                            status: response.status,
                            outcome: Outcome::from_status(response.status, self.rejection_status),
                        }
                    }
                    Err(e) => {
                        self.metrics.record_check(Check::HandshakeUpgraded, false);
                        tracing::warn!(user, error = %e, "Connect failed without a handshake status");
                        IterationState::Aborted(Outcome::Unexpected)
                    }
                }
            }

            IterationState::Classified { status, outcome } => {
                if outcome == Outcome::Unexpected {
                    tracing::debug!(user, status, "Unexpected handshake status");
                }
                IterationState::Done(outcome)
            }

            terminal @ (IterationState::Done(_) | IterationState::Aborted(_)) => terminal,
        }
    }

    async fn authenticate(&self, identity: &Identity) -> Result<Credential, AuthFailure> {
        let response = self.client.login(identity).await?;
        credential_from_login(&response)
    }

    fn observe_events(&self, user: usize, events: &[ConnectionEvent]) {
        for event in events {
            match event {
                ConnectionEvent::Open => tracing::debug!(user, "connected"),
                ConnectionEvent::Close => tracing::debug!(user, "disconnected"),
                ConnectionEvent::Error {
                    origin: ErrorOrigin::LocalClose,
                    message,
                } => {
                    tracing::debug!(user, error = %message, "Error after local close");
                }
                ConnectionEvent::Error {
                    origin: ErrorOrigin::Remote,
                    message,
                } => {
                    tracing::warn!(user, error = %message, "An unexpected error occurred");
                }
            }
        }
    }
}

impl std::fmt::Debug for IterationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationWorkflow")
            .field("client", &self.client.name())
            .field("websocket_url", &self.websocket_url.as_str())
            .field("rejection_status", &self.rejection_status)
            .finish()
    }
}
