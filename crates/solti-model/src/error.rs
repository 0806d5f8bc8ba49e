use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid uptime: {0} (expected: <d>d:<h>h:<m>m:<s>s)")]
    InvalidUptime(String),
}
