use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe task failed: {0}")]
    Task(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("process {0} not found")]
    ProcessNotFound(u32),
}
