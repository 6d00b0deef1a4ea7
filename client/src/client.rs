//! reqwest + tokio-tungstenite implementation of `ProtocolClient`

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use churn_bench_core::{
    ClientError, ConnectResponse, ConnectionEvent, ErrorOrigin, Identity, LoginResponse,
    ProtocolClient, ScenarioConfig,
};

use crate::config::ClientConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client that logs in over HTTP and churns WebSocket connections
///
/// One instance is shared by every worker; the underlying reqwest
/// connection pool is reused across logins.
pub struct ChurnClient {
    http: reqwest::Client,
    login_url: Url,
    config: ClientConfig,
}

impl ChurnClient {
    /// Create a client posting credentials to `login_url`
    pub fn new(login_url: Url, config: ClientConfig) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            login_url,
            config,
        })
    }

    /// Create a client for the login endpoint of a scenario
    pub fn for_scenario(
        scenario: &ScenarioConfig,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        Self::new(scenario.login_url.clone(), config)
    }

    /// Login endpoint this client posts to
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Close a freshly opened socket and record what happens until it is gone
    async fn close_and_drain(&self, mut socket: Socket, events: &mut Vec<ConnectionEvent>) {
        if let Err(e) = socket.close(None).await {
            events.push(error_event(&e));
            events.push(ConnectionEvent::Close);
            return;
        }

        let drain = async {
            while let Some(frame) = socket.next().await {
                if let Err(e) = frame {
                    events.push(error_event(&e));
                    break;
                }
            }
        };

        if tokio::time::timeout(self.config.close_timeout, drain)
            .await
            .is_err()
        {
            events.push(ConnectionEvent::Error {
                origin: ErrorOrigin::Remote,
                message: format!(
                    "no close frame from server within {:?}",
                    self.config.close_timeout
                ),
            });
        }

        events.push(ConnectionEvent::Close);
    }
}

/// Errors that only follow from our own close frame
///
/// A reset means the peer dropped the stream without answering the close,
/// which is a remote anomaly.
fn is_local_close(err: &WsError) -> bool {
    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::SendAfterClosing)
    )
}

fn error_event(err: &WsError) -> ConnectionEvent {
    let origin = if is_local_close(err) {
        ErrorOrigin::LocalClose
    } else {
        ErrorOrigin::Remote
    };
    ConnectionEvent::Error {
        origin,
        message: err.to_string(),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else if err.is_builder() {
        ClientError::InvalidRequest(err.to_string())
    } else {
        ClientError::Transport(err.to_string())
    }
}

#[async_trait]
impl ProtocolClient for ChurnClient {
    fn name(&self) -> &str {
        "churn"
    }

    async fn login(&self, identity: &Identity) -> Result<LoginResponse, ClientError> {
        let response = self
            .http
            .post(self.login_url.clone())
            .json(identity)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!(
                    login = %identity.login,
                    status,
                    error = %e,
                    "Failed to read login body"
                );
                None
            }
        };

        Ok(LoginResponse { status, body })
    }

    async fn connect(
        &self,
        url: &Url,
        authorization: &str,
    ) -> Result<ConnectResponse, ClientError> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        let header = HeaderValue::from_str(authorization)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, header);

        let handshake = tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(request),
        )
        .await
        .map_err(|_| ClientError::Timeout)?;

        let (socket, response) = match handshake {
            Ok(pair) => pair,
            // Non-101 answers are a classification input, not a failure
            Err(WsError::Http(response)) => {
                return Ok(ConnectResponse::status_only(response.status().as_u16()));
            }
            Err(e) => return Err(ClientError::Transport(e.to_string())),
        };

        let mut events = vec![ConnectionEvent::Open];
        self.close_and_drain(socket, &mut events).await;

        Ok(ConnectResponse {
            status: response.status().as_u16(),
            events,
        })
    }
}

impl std::fmt::Debug for ChurnClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChurnClient")
            .field("login_url", &self.login_url.as_str())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_close_errors() {
        assert!(is_local_close(&WsError::ConnectionClosed));
        assert!(is_local_close(&WsError::AlreadyClosed));
        assert!(is_local_close(&WsError::Protocol(
            ProtocolError::SendAfterClosing
        )));
        assert!(!is_local_close(&WsError::Io(std::io::Error::other("tls alert"))));
        assert!(!is_local_close(&WsError::Protocol(
            ProtocolError::NonZeroReservedBits
        )));
    }

    #[test]
    fn test_resets_are_remote() {
        assert!(!is_local_close(&WsError::Protocol(
            ProtocolError::ResetWithoutClosingHandshake
        )));
        assert!(!is_local_close(&WsError::Io(std::io::Error::from(
            std::io::ErrorKind::ConnectionReset
        ))));
        assert!(!is_local_close(&WsError::Io(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe
        ))));

        let reset = WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake);
        match error_event(&reset) {
            ConnectionEvent::Error { origin, .. } => assert_eq!(origin, ErrorOrigin::Remote),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_error_event_origin() {
        match error_event(&WsError::AlreadyClosed) {
            ConnectionEvent::Error { origin, .. } => assert_eq!(origin, ErrorOrigin::LocalClose),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let url = Url::parse("http://localhost/v0/auth/login").unwrap();
        let config = ClientConfig::default().with_user_agent("");
        assert!(matches!(
            ChurnClient::new(url, config),
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_header() {
        let url = Url::parse("http://localhost/v0/auth/login").unwrap();
        let client = ChurnClient::new(url, ClientConfig::default()).unwrap();
        let ws = Url::parse("ws://localhost:1/ws").unwrap();

        let result = client.connect(&ws, "Bearer bad\nvalue").await;
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }
}
