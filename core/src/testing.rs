//! Deterministic protocol client used by the core's tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::traits::{
    ClientError, ConnectResponse, ConnectionEvent, Identity, LoginResponse, ProtocolClient,
};

pub(crate) struct StubClient {
    login_status: u16,
    login_body: Option<&'static str>,
    login_error: bool,
    connect_status: u16,
    connect_error: bool,
    events: Vec<ConnectionEvent>,
    delay: Option<Duration>,
    connect_calls: AtomicUsize,
    logins: Mutex<HashMap<String, usize>>,
    login_times: Mutex<Vec<Instant>>,
    last_authorization: Mutex<Option<String>>,
}

impl StubClient {
    /// Logs in everyone and upgrades every handshake
    pub(crate) fn admitting() -> Self {
        Self::with_connect_status(101)
    }

    pub(crate) fn with_connect_status(status: u16) -> Self {
        Self {
            login_status: 200,
            login_body: None,
            login_error: false,
            connect_status: status,
            connect_error: false,
            events: vec![ConnectionEvent::Open, ConnectionEvent::Close],
            delay: None,
            connect_calls: AtomicUsize::new(0),
            logins: Mutex::new(HashMap::new()),
            login_times: Mutex::new(Vec::new()),
            last_authorization: Mutex::new(None),
        }
    }

    pub(crate) fn with_login_status(mut self, status: u16) -> Self {
        self.login_status = status;
        self
    }

    pub(crate) fn with_login_body(mut self, body: &'static str) -> Self {
        self.login_body = Some(body);
        self
    }

    pub(crate) fn with_login_error(mut self) -> Self {
        self.login_error = true;
        self
    }

    pub(crate) fn with_connect_error(mut self) -> Self {
        self.connect_error = true;
        self
    }

    pub(crate) fn with_events(mut self, events: Vec<ConnectionEvent>) -> Self {
        self.events = events;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn logins_for(&self, login: &str) -> usize {
        self.logins
            .lock()
            .unwrap()
            .get(login)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_logins(&self) -> usize {
        self.logins.lock().unwrap().values().sum()
    }

    pub(crate) fn distinct_users(&self) -> usize {
        self.logins.lock().unwrap().len()
    }

    pub(crate) fn login_times(&self) -> Vec<Instant> {
        self.login_times.lock().unwrap().clone()
    }

    pub(crate) fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProtocolClient for StubClient {
    fn name(&self) -> &str {
        "stub"
    }

    async fn login(&self, identity: &Identity) -> Result<LoginResponse, ClientError> {
        self.login_times.lock().unwrap().push(Instant::now());
        *self
            .logins
            .lock()
            .unwrap()
            .entry(identity.login.clone())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.login_error {
            return Err(ClientError::Transport("connection refused".into()));
        }

        let body = match self.login_body {
            Some(body) => Bytes::from_static(body.as_bytes()),
            None => Bytes::from(format!(r#"{{"accessToken":"token-{}"}}"#, identity.login)),
        };

        Ok(LoginResponse {
            status: self.login_status,
            body: Some(body),
        })
    }

    async fn connect(
        &self,
        _url: &Url,
        authorization: &str,
    ) -> Result<ConnectResponse, ClientError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_authorization.lock().unwrap() = Some(authorization.to_string());

        if self.connect_error {
            return Err(ClientError::Transport("handshake aborted".into()));
        }

        if self.connect_status != 101 {
            return Ok(ConnectResponse::status_only(self.connect_status));
        }

        Ok(ConnectResponse {
            status: self.connect_status,
            events: self.events.clone(),
        })
    }
}
