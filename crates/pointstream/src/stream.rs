//! Live stream receive loop.
//!
//! Transport callbacks are folded into a single [`TransportEvent`] stream.
//! [`pump`] drains it, gates each frame through the
//! [`AdmissionController`], decodes admitted frames and forwards them to
//! the consumer together with their permit. The permit travels with the
//! frame, so the controller stays busy until the consumer has ingested it.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use pointstream_codec::DecodedFrame;

use crate::admission::{AdmissionController, AdmissionPermit};

/// Everything a transport connection can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    /// One complete compressed frame.
    Frame(Vec<u8>),
    Closed,
    Error(String),
}

/// A decoded frame holding the in-flight slot.
#[derive(Debug)]
pub struct ReadyFrame {
    frame: DecodedFrame,
    permit: AdmissionPermit,
}

impl ReadyFrame {
    #[must_use]
    pub fn frame(&self) -> &DecodedFrame {
        &self.frame
    }

    #[must_use]
    pub fn into_parts(self) -> (DecodedFrame, AdmissionPermit) {
        (self.frame, self.permit)
    }
}

/// What the consumer side of the pipeline receives.
#[derive(Debug)]
pub enum StreamUpdate {
    Opened,
    Frame(ReadyFrame),
    Closed,
    Error(String),
}

/// Drive `events` until the transport closes, the controller shuts down,
/// or the consumer goes away.
///
/// Frames that fail to decompress or parse are logged and dropped; they
/// release the controller and never reach `sink`.
pub async fn pump<S>(
    events: S,
    controller: Arc<AdmissionController>,
    sink: async_channel::Sender<StreamUpdate>,
) where
    S: Stream<Item = TransportEvent>,
{
    let mut events = std::pin::pin!(events);
    let mut scratch = Vec::new();

    while let Some(event) = events.next().await {
        if !controller.is_accepting() {
            tracing::info!("Stream stopped, controller no longer accepting");
            break;
        }

        let update = match event {
            TransportEvent::Opened => StreamUpdate::Opened,
            TransportEvent::Frame(payload) => {
                let Some(permit) = controller.try_admit() else {
                    continue;
                };
                match pointstream_codec::decode_payload(&payload, &mut scratch) {
                    Ok(frame) => StreamUpdate::Frame(ReadyFrame { frame, permit }),
                    Err(e) => {
                        tracing::warn!("Dropped bad frame ({} bytes): {}", payload.len(), e);
                        drop(permit);
                        continue;
                    }
                }
            }
            TransportEvent::Closed => {
                let _ = sink.send(StreamUpdate::Closed).await;
                break;
            }
            TransportEvent::Error(message) => StreamUpdate::Error(message),
        };

        if sink.send(update).await.is_err() {
            tracing::info!("Stream consumer dropped, stopping");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use pointstream_codec::{compress, encode};

    fn payload(points: u32) -> Vec<u8> {
        let frame = DecodedFrame::new(points, vec![1.5; points as usize * 3], None).unwrap();
        compress(&encode(&frame), 6)
    }

    #[tokio::test]
    async fn frames_behind_an_unfinished_frame_are_dropped() {
        let controller = AdmissionController::new();
        let (tx, rx) = async_channel::unbounded();
        let events = stream::iter([
            TransportEvent::Opened,
            TransportEvent::Frame(payload(1)),
            TransportEvent::Frame(payload(2)),
            TransportEvent::Frame(payload(3)),
        ]);

        pump(events, Arc::clone(&controller), tx).await;

        assert!(matches!(rx.recv().await, Ok(StreamUpdate::Opened)));
        let Ok(StreamUpdate::Frame(ready)) = rx.recv().await else {
            panic!("expected a frame");
        };
        assert_eq!(ready.frame().point_count(), 1);
        assert!(rx.is_empty());
        assert_eq!(controller.stats().skipped, 2);
    }

    #[tokio::test]
    async fn bad_frame_releases_the_controller() {
        let controller = AdmissionController::new();
        let (tx, rx) = async_channel::unbounded();
        let events = stream::iter([
            TransportEvent::Frame(vec![1, 2, 3]),
            TransportEvent::Frame(compress(&[9, 0, 0, 0, 0], 6)),
            TransportEvent::Frame(payload(4)),
        ]);

        pump(events, Arc::clone(&controller), tx).await;

        let Ok(StreamUpdate::Frame(ready)) = rx.recv().await else {
            panic!("expected a frame");
        };
        assert_eq!(ready.frame().point_count(), 4);
        assert_eq!(controller.stats().failed, 2);
        assert_eq!(controller.stats().skipped, 0);
    }

    #[tokio::test]
    async fn closed_ends_the_loop() {
        let controller = AdmissionController::new();
        let (tx, rx) = async_channel::unbounded();
        let events = stream::iter([
            TransportEvent::Closed,
            TransportEvent::Frame(payload(1)),
        ]);

        pump(events, Arc::clone(&controller), tx).await;

        assert!(matches!(rx.recv().await, Ok(StreamUpdate::Closed)));
        assert!(rx.is_empty());
        assert_eq!(controller.stats().accepted, 0);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let controller = AdmissionController::new();
        controller.shutdown();
        let (tx, rx) = async_channel::unbounded();

        pump(stream::iter([TransportEvent::Opened]), controller, tx).await;
        assert!(rx.is_empty());
    }
}
