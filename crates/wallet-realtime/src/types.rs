//! Public types for the wallet-realtime crate.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite;

/// A boxed error type for gateway failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Update tags the backend pushes over the socket. Subscribers filter on the
/// envelope's `type` discriminator; unknown tags are delivered as-is.
pub mod update {
    pub const USER_DATA: &str = "userDataUpdated";
    pub const WALLET: &str = "walletUpdated";
    pub const SCHEDULED_OPERATIONS: &str = "scheduledOperationsUpdated";
}

/// A server-push message: `{ "type": <tag>, ...payload }`.
///
/// The channel interprets only the `type` discriminator; payload fields are
/// carried opaquely for subscribers to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Envelope {
    /// Whether this envelope carries the given update tag.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Identifies the authenticated session a channel belongs to.
///
/// Injected explicitly rather than read from ambient storage, so tests can
/// fabricate session states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub customer_id: String,
}

/// Classified faults reported by a [`SessionGateway`].
#[derive(Debug, thiserror::Error)]
pub enum SessionFault {
    /// The short-lived access credential was rejected. Meaningful from
    /// [`check`](SessionGateway::check): the session may still be alive.
    #[error("access credential rejected")]
    CredentialExpired,

    /// The underlying session is gone. Meaningful from
    /// [`refresh`](SessionGateway::refresh): only the server's refusal to
    /// mint a new credential proves the session ended.
    #[error("session ended")]
    SessionEnded,

    /// Anything else: server unreachable, timeout, unexpected status.
    #[error("session endpoint unreachable: {0}")]
    Unreachable(BoxError),
}

/// Probes the session the channel runs under.
///
/// The channel never stores the credential itself; it only asks this gateway
/// whether the session is still valid and, when the credential expired,
/// whether a fresh one can be obtained.
#[async_trait::async_trait]
pub trait SessionGateway: Send + Sync {
    /// Ask the server whether the current session is still valid.
    async fn check(&self) -> Result<(), SessionFault>;

    /// Obtain a fresh access credential for the same underlying session.
    async fn refresh(&self) -> Result<(), SessionFault>;
}

/// Redirects the user to re-authentication. Invoked exactly once per
/// terminal session failure, never for transient drops.
pub trait Navigator: Send + Sync {
    fn to_login(&self);
}

/// Timing knobs for the connection lifecycle. Injectable so tests run in
/// milliseconds.
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Interval between outbound keep-alive frames.
    pub heartbeat_interval: Duration,
    /// Fixed delay before each reconnect attempt.
    pub retry_backoff: Duration,
    /// Upper bound on a single connection attempt.
    pub connect_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration for [`RealtimeChannel::new`](crate::RealtimeChannel::new).
pub struct ChannelConfig {
    /// Push endpoint base, e.g. `wss://pay.example.com/ws`. The customer id
    /// from the session context is appended as a path segment.
    pub endpoint: String,
    /// The session this channel belongs to. Without it, `open()` is a no-op.
    pub context: Option<SessionContext>,
    /// Collaborator for the session validity check and credential refresh.
    pub session: Arc<dyn SessionGateway>,
    /// Invoked on terminal session failure.
    pub navigator: Arc<dyn Navigator>,
    pub timing: TimingConfig,
}

impl ChannelConfig {
    pub fn new(
        endpoint: impl Into<String>,
        session: Arc<dyn SessionGateway>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            context: None,
            session,
            navigator,
            timing: TimingConfig::default(),
        }
    }
}

/// Errors surfaced by this crate.
///
/// Connection failures during normal operation never reach subscribers;
/// these variants cover construction and are logged by the recovery loop.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid push endpoint: {0}")]
    Endpoint(String),

    #[error("websocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("connection attempt timed out")]
    ConnectTimeout,
}

impl From<tungstenite::Error> for ChannelError {
    fn from(e: tungstenite::Error) -> Self {
        ChannelError::WebSocket(Box::new(e))
    }
}
