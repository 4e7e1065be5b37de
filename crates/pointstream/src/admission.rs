//! Single-frame-in-flight backpressure.
//!
//! A frame is admitted only while no other frame is being decoded or
//! ingested. Anything that arrives in the meantime is dropped before it is
//! decompressed, so a producer that outruns the viewer costs one atomic
//! load per message and the viewer always works on the freshest frame.
//!
//! Admission hands out an [`AdmissionPermit`]. The controller stays busy
//! until the permit is dropped, whether the frame was ingested or the
//! pipeline failed part way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionState {
    Idle,
    Busy,
}

/// Frame counters since the controller was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionStats {
    pub accepted: u64,
    pub skipped: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Gate between the transport and the decode pipeline.
#[derive(Debug)]
pub struct AdmissionController {
    processing: AtomicBool,
    accepting: AtomicBool,
    accepted: AtomicU64,
    skipped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self {
            processing: AtomicBool::new(false),
            accepting: AtomicBool::new(true),
            accepted: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

impl AdmissionController {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Try to move from idle to busy.
    ///
    /// Returns `None` (and counts a skipped frame) if another frame is in
    /// flight or the controller has been shut down.
    #[must_use]
    pub fn try_admit(self: &Arc<Self>) -> Option<AdmissionPermit> {
        if !self.accepting.load(Ordering::Acquire) {
            return None;
        }

        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!("Skipped frame, previous frame still in flight ({skipped} skipped)");
            return None;
        }

        self.accepted.fetch_add(1, Ordering::Relaxed);
        Some(AdmissionPermit {
            controller: Arc::clone(self),
            completed: false,
        })
    }

    #[must_use]
    pub fn state(&self) -> AdmissionState {
        if self.processing.load(Ordering::Acquire) {
            AdmissionState::Busy
        } else {
            AdmissionState::Idle
        }
    }

    /// Stop admitting frames. A frame already in flight may still finish.
    pub fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            tracing::info!("Admission controller shut down");
        }
    }

    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn stats(&self) -> AdmissionStats {
        AdmissionStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Proof that a frame holds the single in-flight slot.
///
/// Dropping the permit returns the controller to idle. Use
/// [`AdmissionPermit::complete`] after a successful ingest so the frame is
/// counted as completed rather than failed.
#[derive(Debug)]
pub struct AdmissionPermit {
    controller: Arc<AdmissionController>,
    completed: bool,
}

impl AdmissionPermit {
    /// Release the slot after the frame was absorbed.
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let counter = if self.completed {
            &self.controller.completed
        } else {
            &self.controller.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.controller.processing.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_frame_is_dropped_while_busy() {
        let controller = AdmissionController::new();
        let first = controller.try_admit().unwrap();
        assert_eq!(controller.state(), AdmissionState::Busy);

        assert!(controller.try_admit().is_none());
        assert_eq!(controller.stats().skipped, 1);

        first.complete();
        assert_eq!(controller.state(), AdmissionState::Idle);
        assert!(controller.try_admit().is_some());
        assert_eq!(
            controller.stats(),
            AdmissionStats {
                accepted: 2,
                skipped: 1,
                completed: 1,
                failed: 1,
            }
        );
    }

    #[test]
    fn dropped_permit_counts_as_failure_and_frees_slot() {
        let controller = AdmissionController::new();
        drop(controller.try_admit().unwrap());
        assert_eq!(controller.state(), AdmissionState::Idle);
        assert_eq!(controller.stats().failed, 1);
        assert_eq!(controller.stats().completed, 0);
    }

    #[test]
    fn shutdown_refuses_new_frames_but_lets_in_flight_finish() {
        let controller = AdmissionController::new();
        let permit = controller.try_admit().unwrap();
        controller.shutdown();
        assert!(!controller.is_accepting());
        assert!(controller.try_admit().is_none());
        // Refusals after shutdown are not backpressure skips.
        assert_eq!(controller.stats().skipped, 0);

        permit.complete();
        assert_eq!(controller.state(), AdmissionState::Idle);
        assert!(controller.try_admit().is_none());
    }

    #[test]
    fn exactly_one_admission_across_threads() {
        let controller = AdmissionController::new();
        let permits: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| controller.try_admit()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(permits.iter().filter(|p| p.is_some()).count(), 1);
        assert_eq!(controller.stats().skipped, 7);
    }
}
