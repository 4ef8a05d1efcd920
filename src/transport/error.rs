//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Failure of the framed transport underneath a session
///
/// Closes the affected connection only.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// MQTT must be carried in binary frames
    #[error("Text frames are not accepted on the MQTT transport")]
    TextFrame,

    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("Connection closed")]
    Closed,
}

impl From<axum::Error> for TransportError {
    fn from(err: axum::Error) -> Self {
        TransportError::WebSocket(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TransportError::TextFrame.to_string(),
            "Text frames are not accepted on the MQTT transport"
        );
        assert_eq!(
            TransportError::WriteTimeout(Duration::from_millis(250)).to_string(),
            "Write timed out after 250ms"
        );
    }
}
