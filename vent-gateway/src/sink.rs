//! Message sink abstraction
//!
//! The gateway emits finished observation messages; what happens to them
//! afterwards belongs behind [`MessageSink`]. The shipped implementation
//! writes one `.hl7` file per message. Delivery failures are reported to
//! the caller and are never fatal to the gateway loop; the message is
//! lost (no retry queue).

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use vent_hl7::ObservationMessage;

/// Errors produced while delivering a message
#[derive(Debug, Error)]
pub enum SinkError {
    /// Output directory could not be created
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Message file could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Destination for finished observation messages
pub trait MessageSink: Send {
    /// Deliver one message; failure loses the message but not the stream
    fn deliver(&mut self, message: &ObservationMessage) -> Result<(), SinkError>;
}

/// Sink writing each message to its suggested filename under a directory
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    /// Create a sink rooted at the given directory; the directory itself
    /// is created on first delivery
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl MessageSink for FileSink {
    fn deliver(&mut self, message: &ObservationMessage) -> Result<(), SinkError> {
        if !self.output_dir.exists() {
            std::fs::create_dir_all(&self.output_dir).map_err(|source| SinkError::CreateDir {
                path: self.output_dir.clone(),
                source,
            })?;
            info!("created output directory {}", self.output_dir.display());
        }

        let path = self.output_dir.join(&message.filename);
        std::fs::write(&path, &message.text).map_err(|source| SinkError::Write {
            path: path.clone(),
            source,
        })?;

        info!("wrote observation message {}", message.filename);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileSink, MessageSink};
    use vent_hl7::ObservationMessage;

    fn message() -> ObservationMessage {
        ObservationMessage {
            text: "MSH|test".to_string(),
            filename: "HL7_20240307_143005_000000.hl7".to_string(),
        }
    }

    #[test]
    fn test_file_sink_creates_directory_and_writes() {
        let dir = std::env::temp_dir().join(format!(
            "ventlink-sink-test-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let mut sink = FileSink::new(&dir);
        sink.deliver(&message()).unwrap();

        let written = std::fs::read_to_string(dir.join("HL7_20240307_143005_000000.hl7")).unwrap();
        assert_eq!(written, "MSH|test");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
