use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid document link: {0:?}")]
    InvalidLink(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("no session is running")]
    NotRunning,

    #[error("a session is already running")]
    AlreadyRunning,

    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}
