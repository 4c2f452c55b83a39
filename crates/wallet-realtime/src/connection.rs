//! Connection management: event loop, heartbeat, and session-aware recovery.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite;
use url::Url;

use crate::state::{self, ChannelEvent, ChannelState};
use crate::types::{
    ChannelError, Envelope, Navigator, SessionContext, SessionFault, SessionGateway, TimingConfig,
};

// ---------------------------------------------------------------------------
// Type aliases for WebSocket split halves
// ---------------------------------------------------------------------------

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

type WsRead = futures_util::stream::SplitStream<WsStream>;
type WsWrite = futures_util::stream::SplitSink<WsStream, tungstenite::Message>;

// ---------------------------------------------------------------------------
// Push endpoint URL construction
// ---------------------------------------------------------------------------

/// Append the customer id to the push endpoint; the server routes one socket
/// per customer.
pub(crate) fn push_url(endpoint: &str, context: &SessionContext) -> Result<Url, ChannelError> {
    let mut url = Url::parse(endpoint).map_err(|e| ChannelError::Endpoint(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ChannelError::Endpoint("endpoint cannot carry a path".to_string()))?
        .pop_if_empty()
        .push(&context.customer_id);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

pub(crate) struct ConnectionTask {
    pub endpoint: Url,
    pub session: Arc<dyn SessionGateway>,
    pub navigator: Arc<dyn Navigator>,
    pub timing: TimingConfig,
    pub latest_tx: watch::Sender<Option<Envelope>>,
    pub state_tx: watch::Sender<ChannelState>,
}

impl ConnectionTask {
    fn apply(&self, event: ChannelEvent) {
        state::apply(&self.state_tx, event);
    }

    /// Teardown invariant: no buffered update may outlive the channel.
    fn clear_latest(&self) {
        self.latest_tx.send_replace(None);
    }
}

enum Flow {
    Connected(WsWrite, WsRead),
    Stop,
}

pub(crate) async fn run(task: ConnectionTask, mut close_rx: oneshot::Receiver<()>) {
    let (mut ws_write, mut ws_read) = match attempt(&task).await {
        Ok(halves) => halves,
        Err(e) => {
            tracing::warn!("connection attempt failed: {e}");
            task.apply(ChannelEvent::Lost);
            match recover(&task, &mut close_rx).await {
                Flow::Connected(write, read) => (write, read),
                Flow::Stop => return,
            }
        }
    };

    loop {
        task.apply(ChannelEvent::Established);
        tracing::info!(endpoint = %task.endpoint, "connection established");

        let mut heartbeat = tokio::time::interval(task.timing.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat.reset();

        // Main message loop; breaks on any drop, returns on close.
        loop {
            tokio::select! {
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match serde_json::from_str::<Envelope>(text.as_str()) {
                                Ok(envelope) => {
                                    tracing::debug!(kind = %envelope.kind, "update received");
                                    task.latest_tx.send_replace(Some(envelope));
                                }
                                Err(e) => {
                                    tracing::warn!("failed to decode message: {e}");
                                }
                            }
                        }
                        Some(Ok(tungstenite::Message::Close(_))) => {
                            tracing::info!("connection closed by server");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Ignore binary, ping, pong frames
                        }
                        Some(Err(e)) => {
                            tracing::warn!("websocket error: {e}");
                            break;
                        }
                        None => {
                            tracing::info!("websocket stream ended");
                            break;
                        }
                    }
                }

                _ = heartbeat.tick() => {
                    if let Err(e) = ws_write.send(tungstenite::Message::text("{}")).await {
                        tracing::warn!("heartbeat send failed: {e}");
                        break;
                    }
                }

                _ = &mut close_rx => {
                    tracing::info!("close requested");
                    let _ = ws_write.close().await;
                    task.clear_latest();
                    task.apply(ChannelEvent::CloseRequested);
                    return;
                }
            }
        }

        task.apply(ChannelEvent::Lost);
        match recover(&task, &mut close_rx).await {
            Flow::Connected(write, read) => {
                ws_write = write;
                ws_read = read;
            }
            Flow::Stop => return,
        }
    }
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

/// Classify the failure through the session gateway, wait the fixed backoff,
/// then try again. Runs until a connection is established, the failure
/// proves terminal, or close is requested. At most one attempt in flight.
async fn recover(task: &ConnectionTask, close_rx: &mut oneshot::Receiver<()>) -> Flow {
    loop {
        let recovery = tokio::select! {
            recovery = classify(task.session.as_ref()) => recovery,
            _ = &mut *close_rx => {
                tracing::info!("close requested during recovery");
                task.clear_latest();
                task.apply(ChannelEvent::CloseRequested);
                return Flow::Stop;
            }
        };

        match recovery {
            Recovery::Transient => {}
            Recovery::Terminal => {
                tracing::warn!("session ended, redirecting to login");
                task.clear_latest();
                task.apply(ChannelEvent::SessionEnded);
                task.navigator.to_login();
                return Flow::Stop;
            }
        }

        tracing::info!(backoff = ?task.timing.retry_backoff, "waiting before reconnect attempt");
        tokio::select! {
            _ = tokio::time::sleep(task.timing.retry_backoff) => {}
            _ = &mut *close_rx => {
                tracing::info!("close requested during backoff");
                task.clear_latest();
                task.apply(ChannelEvent::CloseRequested);
                return Flow::Stop;
            }
        }

        match attempt(task).await {
            Ok((write, read)) => return Flow::Connected(write, read),
            Err(e) => {
                tracing::warn!("reconnect attempt failed: {e}");
                task.apply(ChannelEvent::Lost);
            }
        }
    }
}

async fn attempt(task: &ConnectionTask) -> Result<(WsWrite, WsRead), ChannelError> {
    tracing::debug!(endpoint = %task.endpoint, "opening websocket");
    let connect = tokio_tungstenite::connect_async(task.endpoint.as_str());
    match tokio::time::timeout(task.timing.connect_timeout, connect).await {
        Ok(Ok((ws, _resp))) => Ok(ws.split()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ChannelError::ConnectTimeout),
    }
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Recovery {
    Transient,
    Terminal,
}

/// Three-tier classification of a connection failure.
///
/// A drop while the session is valid is a network blip. A rejected access
/// credential may just need a refresh. Only a refresh refused by the server
/// proves the session itself is gone.
async fn classify(session: &dyn SessionGateway) -> Recovery {
    match session.check().await {
        Ok(()) => {
            tracing::debug!("session still valid, drop is transient");
            Recovery::Transient
        }
        Err(SessionFault::CredentialExpired) => match session.refresh().await {
            Ok(()) => {
                tracing::info!("access credential refreshed");
                Recovery::Transient
            }
            Err(SessionFault::SessionEnded) => Recovery::Terminal,
            Err(e) => {
                tracing::warn!("credential refresh failed: {e}");
                Recovery::Transient
            }
        },
        Err(e) => {
            tracing::warn!("session check failed: {e}");
            Recovery::Transient
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
