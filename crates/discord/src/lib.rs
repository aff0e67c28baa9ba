pub mod client;
pub mod platform;
pub mod render;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    /// The referenced message no longer exists.
    #[error("message not found")]
    NotFound,
    /// The referenced channel or thread no longer exists.
    #[error("channel not found")]
    UnknownChannel,
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: f64 },
    #[error("sink error: {0}")]
    Transient(String),
    /// Guild or channel unusable at startup.
    #[error("sink unreachable: {0}")]
    Unreachable(String),
}
