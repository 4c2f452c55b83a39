//! Channel lifecycle state machine.
//!
//! A single transition function drives all state changes, so the lifecycle
//! is testable without a live transport. Transitions are serialized by the
//! one task (plus the owning handle) that writes to the state watch.

use tokio::sync::watch;

/// Lifecycle of the logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No connection and none requested.
    #[default]
    Disconnected,
    /// First connection attempt in progress.
    Connecting,
    /// Physical connection established, updates flowing.
    Open,
    /// Connection lost; the recovery loop is classifying and retrying.
    Reconnecting,
    /// Torn down, either explicitly or because the session ended.
    Closed,
}

/// Inputs that move the channel between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelEvent {
    OpenRequested,
    Established,
    Lost,
    CloseRequested,
    SessionEnded,
}

impl ChannelState {
    /// The single transition function. Events that make no sense in the
    /// current state leave it unchanged.
    pub(crate) fn on(self, event: ChannelEvent) -> ChannelState {
        use ChannelEvent as E;
        use ChannelState as S;
        match (self, event) {
            (_, E::CloseRequested | E::SessionEnded) => S::Closed,
            (_, E::OpenRequested) => S::Connecting,
            (S::Connecting | S::Reconnecting, E::Established) => S::Open,
            (S::Connecting | S::Open, E::Lost) => S::Reconnecting,
            (state, _) => state,
        }
    }
}

/// Apply an event to the shared state, logging real transitions.
pub(crate) fn apply(tx: &watch::Sender<ChannelState>, event: ChannelEvent) {
    tx.send_if_modified(|state| {
        let next = state.on(event);
        if next == *state {
            return false;
        }
        tracing::info!(from = ?state, to = ?next, "channel state changed");
        *state = next;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_the_normal_lifecycle() {
        let state = ChannelState::Disconnected.on(ChannelEvent::OpenRequested);
        assert_eq!(state, ChannelState::Connecting);
        let state = state.on(ChannelEvent::Established);
        assert_eq!(state, ChannelState::Open);
        let state = state.on(ChannelEvent::Lost);
        assert_eq!(state, ChannelState::Reconnecting);
        let state = state.on(ChannelEvent::Established);
        assert_eq!(state, ChannelState::Open);
        let state = state.on(ChannelEvent::CloseRequested);
        assert_eq!(state, ChannelState::Closed);
    }

    #[test]
    fn close_wins_from_every_state() {
        for state in [
            ChannelState::Disconnected,
            ChannelState::Connecting,
            ChannelState::Open,
            ChannelState::Reconnecting,
            ChannelState::Closed,
        ] {
            assert_eq!(state.on(ChannelEvent::CloseRequested), ChannelState::Closed);
            assert_eq!(state.on(ChannelEvent::SessionEnded), ChannelState::Closed);
        }
    }

    #[test]
    fn failed_attempts_stay_in_reconnecting() {
        let state = ChannelState::Reconnecting.on(ChannelEvent::Lost);
        assert_eq!(state, ChannelState::Reconnecting);
    }

    #[test]
    fn reopen_after_close() {
        let state = ChannelState::Closed.on(ChannelEvent::OpenRequested);
        assert_eq!(state, ChannelState::Connecting);
    }

    #[test]
    fn stale_events_are_ignored() {
        assert_eq!(
            ChannelState::Disconnected.on(ChannelEvent::Lost),
            ChannelState::Disconnected
        );
        assert_eq!(
            ChannelState::Open.on(ChannelEvent::Established),
            ChannelState::Open
        );
        assert_eq!(
            ChannelState::Closed.on(ChannelEvent::Established),
            ChannelState::Closed
        );
    }
}
