//! Per-viewer stream state.

use std::sync::Arc;

use crate::admission::{AdmissionController, AdmissionStats};
use crate::geometry::{GeometryBuffer, IngestReport};
use crate::stream::StreamUpdate;

/// Connection status as last reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// The server closed the stream. Not fatal: the last frame stays on screen.
    Closed,
    Failed(String),
}

/// Owns everything one live stream needs: the geometry storage, the
/// admission controller shared with the receive task, and connection state.
#[derive(Debug)]
pub struct StreamSession {
    buffer: GeometryBuffer,
    controller: Arc<AdmissionController>,
    connection: ConnectionState,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: GeometryBuffer::new(),
            controller: AdmissionController::new(),
            connection: ConnectionState::Connecting,
        }
    }

    /// Handle for the receive task.
    #[must_use]
    pub fn controller(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.controller)
    }

    #[must_use]
    pub fn buffer(&self) -> &GeometryBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    #[must_use]
    pub fn stats(&self) -> AdmissionStats {
        self.controller.stats()
    }

    /// Apply one update from the receive task.
    ///
    /// Returns the ingest report when a frame was absorbed into storage.
    pub fn apply(&mut self, update: StreamUpdate) -> Option<IngestReport> {
        match update {
            StreamUpdate::Opened => {
                tracing::info!("Stream connected");
                self.connection = ConnectionState::Open;
                None
            }
            StreamUpdate::Frame(ready) => {
                let (frame, permit) = ready.into_parts();
                let report = self.buffer.ingest(&frame)?;
                permit.complete();
                if report.storage_replaced {
                    tracing::info!("Geometry storage grown to {} points", frame.point_count());
                }
                Some(report)
            }
            StreamUpdate::Closed => {
                // The transport closes after an error too; keep the failure visible.
                if let ConnectionState::Failed(message) = &self.connection {
                    tracing::debug!("Stream closed after error: {}", message);
                } else {
                    tracing::info!("Stream closed by server");
                    self.connection = ConnectionState::Closed;
                }
                None
            }
            StreamUpdate::Error(message) => {
                tracing::error!("Stream error: {}", message);
                self.connection = ConnectionState::Failed(message);
                None
            }
        }
    }

    /// Stop admitting frames and release storage.
    ///
    /// A frame still being decoded may arrive later; it is discarded.
    pub fn teardown(&mut self) {
        self.controller.shutdown();
        self.buffer.release();
    }
}
