// error.rs - Fatal outcomes of a reconnaissance run
// Tool failures and proxy chain problems never land here: they are reported
// and the run continues.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("TOR connection check failed through {endpoint}: {reason}")]
    TorUnreachable { endpoint: String, reason: String },
    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}
