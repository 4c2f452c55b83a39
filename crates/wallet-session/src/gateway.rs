//! [`SessionGateway`] glue: maps HTTP outcomes onto the channel's
//! three-tier failure classification.

use async_trait::async_trait;
use wallet_realtime::{SessionFault, SessionGateway};

use crate::client::{SessionClient, SessionError};

#[async_trait]
impl SessionGateway for SessionClient {
    async fn check(&self) -> Result<(), SessionFault> {
        match self.check_login().await {
            Ok(()) => Ok(()),
            Err(SessionError::Unauthorized) => Err(SessionFault::CredentialExpired),
            Err(e) => Err(SessionFault::Unreachable(Box::new(e))),
        }
    }

    async fn refresh(&self) -> Result<(), SessionFault> {
        match self.refresh_token().await {
            Ok(()) => Ok(()),
            Err(SessionError::Unauthorized) => Err(SessionFault::SessionEnded),
            Err(e) => Err(SessionFault::Unreachable(Box::new(e))),
        }
    }
}
