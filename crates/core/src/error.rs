use thiserror::Error;

use crate::bridge::BridgeError;

#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("platform bridge: {0}")]
    Bridge(#[from] BridgeError),
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}
