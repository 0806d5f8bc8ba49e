use thiserror::Error;

use crate::bus::BusError;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("component registration requires an active tokio runtime")]
    NoRuntime,

    #[error("no bus available: pass one in the options or install a default bus")]
    NoBus,

    #[error("bus is not connected")]
    BusNotConnected,

    #[error("component is already registered")]
    AlreadyRegistered,

    #[error("failed to bind http listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("varz field '{0}' is reserved")]
    ReservedField(String),
}
