//! Session lifecycle over the backend HTTP API: register, login, logout,
//! validity check, and access-credential refresh.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha512};
use url::Url;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend paths, relative to the API base URL.
mod endpoint {
    pub const USER: &str = "user";
    pub const LOGIN: &str = "user/login";
    pub const LOGIN_CHECK: &str = "user/login/check";
    pub const REFRESH: &str = "user/login/refresh";
    pub const LOGOUT: &str = "user/logout";
}

/// Configuration for [`SessionClient::new`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// API base URL, e.g. `http://localhost:9000`.
    pub base_url: String,
    pub request_timeout: Duration,
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Errors returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the caller's credential (401).
    #[error("credential rejected")]
    Unauthorized,

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
}

/// Profile fields for [`SessionClient::register`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    /// ISO 8601 date, e.g. `1815-12-10`.
    pub birth_date: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    first_name: &'a str,
    last_name: &'a str,
    birth_date: &'a str,
    email: &'a str,
    encrypted_password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
    email: &'a str,
    encrypted_password: String,
}

/// HTTP client for the session endpoints.
///
/// Carries the backend's auth cookies in an internal store, so a successful
/// [`login`](SessionClient::login) authenticates every later request made
/// through the same instance.
pub struct SessionClient {
    http: reqwest::Client,
    base: Url,
}

impl SessionClient {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, base })
    }

    /// Create an account. The password never leaves the client in clear;
    /// only its SHA-512 digest is sent, as the backend expects.
    pub async fn register(&self, user: &NewUser, password: &str) -> Result<(), SessionError> {
        let body = RegisterBody {
            first_name: &user.first_name,
            last_name: &user.last_name,
            birth_date: &user.birth_date,
            email: &user.email,
            encrypted_password: hash_password(password),
        };
        let resp = self
            .http
            .post(self.base.join(endpoint::USER)?)
            .json(&body)
            .send()
            .await?;
        ok_or_status(resp.status())?;
        tracing::info!("account registered");
        Ok(())
    }

    /// Authenticate; on success the cookie store holds the session cookies.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let body = LoginBody {
            email,
            encrypted_password: hash_password(password),
        };
        let resp = self
            .http
            .post(self.base.join(endpoint::LOGIN)?)
            .json(&body)
            .send()
            .await?;
        ok_or_status(resp.status())?;
        tracing::info!("logged in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        let resp = self
            .http
            .post(self.base.join(endpoint::LOGOUT)?)
            .send()
            .await?;
        ok_or_status(resp.status())?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Ask the server whether the current session is still valid.
    /// [`SessionError::Unauthorized`] means the access credential expired,
    /// not necessarily the session.
    pub async fn check_login(&self) -> Result<(), SessionError> {
        let resp = self
            .http
            .get(self.base.join(endpoint::LOGIN_CHECK)?)
            .send()
            .await?;
        ok_or_status(resp.status())
    }

    /// Obtain a fresh access credential for the same underlying session.
    /// [`SessionError::Unauthorized`] here means the session itself ended.
    pub async fn refresh_token(&self) -> Result<(), SessionError> {
        let resp = self
            .http
            .post(self.base.join(endpoint::REFRESH)?)
            .send()
            .await?;
        ok_or_status(resp.status())?;
        tracing::info!("access credential refreshed");
        Ok(())
    }
}

fn ok_or_status(status: reqwest::StatusCode) -> Result<(), SessionError> {
    if status.is_success() {
        Ok(())
    } else if status == reqwest::StatusCode::UNAUTHORIZED {
        Err(SessionError::Unauthorized)
    } else {
        Err(SessionError::Status(status))
    }
}

/// SHA-512 hex digest of a password, matching what the backend stores.
pub fn hash_password(password: &str) -> String {
    let digest = Sha512::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
