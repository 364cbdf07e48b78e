use thiserror::Error;

/// Failure taxonomy for one login attempt. Any phase failure aborts the
/// remaining phases; nothing here is retried automatically, since device
/// lockout counters can be cumulative.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not establish device session: {0}")]
    Session(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("device rate limit, wait {0} minutes")]
    RateLimited(u64),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("identity verification failed: {0}")]
    Identity(&'static str),
    #[error("login cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
