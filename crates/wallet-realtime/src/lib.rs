//! Session-aware realtime update channel for the wallet client.
//!
//! Maintains one WebSocket connection to the backend's push endpoint for the
//! lifetime of an authenticated session and hands out live views of the
//! latest update to any number of subscribers.
//!
//! # Features
//! - Automatic reconnection with a fixed backoff, retried indefinitely
//! - Three-tier failure classification: transient drop, expired-but-renewable
//!   access credential, terminated session
//! - Terminal failures redirect to re-authentication exactly once, via an
//!   injected [`Navigator`]
//! - Replay-of-one delivery: late subscribers immediately see the most
//!   recent update
//! - Outbound keep-alive heartbeat
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), wallet_realtime::ChannelError> {
//! use std::sync::Arc;
//!
//! use wallet_realtime::{ChannelConfig, Navigator, RealtimeChannel, SessionContext};
//!
//! struct LoginRedirect;
//!
//! impl Navigator for LoginRedirect {
//!     fn to_login(&self) {
//!         eprintln!("session ended, please log in again");
//!     }
//! }
//!
//! # let gateway: Arc<dyn wallet_realtime::SessionGateway> = todo!();
//! let mut config = ChannelConfig::new("wss://pay.example.com/ws", gateway, Arc::new(LoginRedirect));
//! config.context = Some(SessionContext { customer_id: "42".into() });
//!
//! let channel = RealtimeChannel::new(config)?;
//! channel.open().await;
//!
//! let mut updates = channel.messages();
//! while updates.changed().await.is_ok() {
//!     if let Some(envelope) = updates.borrow_and_update().clone() {
//!         println!("update: {}", envelope.kind);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod connection;
mod state;
mod types;

pub use channel::RealtimeChannel;
pub use state::ChannelState;
pub use types::{
    BoxError, ChannelConfig, ChannelError, Envelope, Navigator, SessionContext, SessionFault,
    SessionGateway, TimingConfig, update,
};
