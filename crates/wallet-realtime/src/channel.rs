//! Public entry point: [`RealtimeChannel`].

use std::sync::Arc;

use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::connection::{self, ConnectionTask};
use crate::state::{self, ChannelEvent, ChannelState};
use crate::types::{ChannelConfig, ChannelError, Envelope, Navigator, SessionGateway, TimingConfig};

/// Handle to the session's realtime update channel.
///
/// One instance lives per authenticated session. [`open`](Self::open)
/// establishes the connection, [`messages`](Self::messages) hands out live
/// views of the latest update, and [`close`](Self::close) tears everything
/// down. Recovery from drops is automatic; subscribers only ever observe
/// updates or silence, never transport errors.
pub struct RealtimeChannel {
    endpoint: Option<Url>,
    session: Arc<dyn SessionGateway>,
    navigator: Arc<dyn Navigator>,
    timing: TimingConfig,
    latest_tx: watch::Sender<Option<Envelope>>,
    state_tx: watch::Sender<ChannelState>,
    live: Mutex<Option<Live>>,
}

struct Live {
    close_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RealtimeChannel {
    /// Build a channel for the given session context. Fails only on a
    /// malformed endpoint; connecting happens in [`open`](Self::open).
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelError> {
        let endpoint = match &config.context {
            Some(context) => Some(connection::push_url(&config.endpoint, context)?),
            None => None,
        };
        let (latest_tx, _) = watch::channel(None);
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Ok(Self {
            endpoint,
            session: config.session,
            navigator: config.navigator,
            timing: config.timing,
            latest_tx,
            state_tx,
            live: Mutex::new(None),
        })
    }

    /// Open the connection. Idempotent: a live connection is fully torn down
    /// before the new one is attempted, so at most one physical connection
    /// exists. Without a session context this is a no-op. Failures are not
    /// reported here; the background task classifies and recovers from them.
    pub async fn open(&self) {
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!("no session context, not opening a connection");
            return;
        };

        let mut live = self.live.lock().await;
        if let Some(previous) = live.take() {
            let _ = previous.close_tx.send(());
            let _ = previous.task.await;
        }
        self.latest_tx.send_replace(None);
        state::apply(&self.state_tx, ChannelEvent::OpenRequested);

        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(connection::run(
            ConnectionTask {
                endpoint,
                session: Arc::clone(&self.session),
                navigator: Arc::clone(&self.navigator),
                timing: self.timing.clone(),
                latest_tx: self.latest_tx.clone(),
                state_tx: self.state_tx.clone(),
            },
            close_rx,
        ));
        *live = Some(Live { close_tx, task });
    }

    /// A live view of the latest inbound update: `None` until the first
    /// message arrives, then always the most recent envelope. Late
    /// subscribers see the current value immediately; there is no further
    /// history. Subscribing never opens the connection.
    pub fn messages(&self) -> watch::Receiver<Option<Envelope>> {
        self.latest_tx.subscribe()
    }

    /// A live view of the channel lifecycle state.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    /// Tear down the connection and cancel any pending reconnect, so no
    /// attempt fires after this returns. Idempotent.
    pub async fn close(&self) {
        let mut live = self.live.lock().await;
        if let Some(previous) = live.take() {
            let _ = previous.close_tx.send(());
            let _ = previous.task.await;
        }
        self.latest_tx.send_replace(None);
        state::apply(&self.state_tx, ChannelEvent::CloseRequested);
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        // Best effort: signal the background task so it does not outlive
        // the handle.
        if let Ok(mut live) = self.live.try_lock()
            && let Some(previous) = live.take()
        {
            let _ = previous.close_tx.send(());
        }
    }
}
