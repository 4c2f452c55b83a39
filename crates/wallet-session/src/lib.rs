//! Session lifecycle client for the wallet backend.
//!
//! Wraps the auth endpoints (register, login, logout, validity check,
//! credential refresh) behind a cookie-carrying HTTP client, and implements
//! the realtime channel's [`SessionGateway`](wallet_realtime::SessionGateway)
//! seam so channel recovery can probe and refresh the session.
//!
//! Passwords are digested client-side (SHA-512 hex) before they are sent;
//! see [`hash_password`].

mod client;
mod gateway;

pub use client::{NewUser, SessionClient, SessionConfig, SessionError, hash_password};
