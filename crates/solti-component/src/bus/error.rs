use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("bus connection is closed")]
    NotConnected,

    #[error("subscription closed before a reply arrived")]
    Closed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("a default bus is already installed")]
    DefaultAlreadyInstalled,

    #[error("transport error: {0}")]
    Transport(String),
}
