//! Log in and watch live wallet updates.
//!
//! ```sh
//! cargo run -p wallet-session --example watch_updates -- <EMAIL> <PASSWORD> <CUSTOMER_ID>
//! ```
//!
//! `WALLET_API_URL` and `WALLET_PUSH_URL` override the backend endpoints
//! (defaults target a local backend on port 9000). Updates are printed to
//! stdout as they arrive; the process exits when the session ends.

use std::sync::Arc;

use wallet_realtime::{ChannelConfig, Navigator, RealtimeChannel, SessionContext};
use wallet_session::{SessionClient, SessionConfig};

struct ExitToLogin;

impl Navigator for ExitToLogin {
    fn to_login(&self) {
        eprintln!("[session ended] please log in again");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let usage = "usage: watch_updates <EMAIL> <PASSWORD> <CUSTOMER_ID>";
    let email = args.first().ok_or(usage)?;
    let password = args.get(1).ok_or(usage)?;
    let customer_id = args.get(2).ok_or(usage)?;

    let api_url =
        std::env::var("WALLET_API_URL").unwrap_or_else(|_| "http://localhost:9000".to_string());
    let push_url =
        std::env::var("WALLET_PUSH_URL").unwrap_or_else(|_| "ws://localhost:9000/ws".to_string());

    let client = Arc::new(SessionClient::new(SessionConfig::new(api_url))?);
    client.login(email, password).await?;
    eprintln!("logged in as {email}");

    let mut config = ChannelConfig::new(push_url, client, Arc::new(ExitToLogin));
    config.context = Some(SessionContext {
        customer_id: customer_id.clone(),
    });
    let channel = RealtimeChannel::new(config)?;
    channel.open().await;

    let mut updates = channel.messages();
    while updates.changed().await.is_ok() {
        if let Some(envelope) = updates.borrow_and_update().clone() {
            println!(
                "[{}] {}",
                envelope.kind,
                serde_json::Value::Object(envelope.payload)
            );
        }
    }
    Ok(())
}
