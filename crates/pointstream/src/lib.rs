//! Stream and archive playback for animated point clouds.
//!
//! This crate sits between a transport and a renderer. It owns the
//! per-viewer state but does no rendering itself; renderers plug in through
//! [`RenderTarget`].
//!
//! # Live streams
//!
//! Transport messages flow through [`stream::pump`]: the
//! [`AdmissionController`] drops any frame that arrives while the previous
//! one is still in flight, admitted frames are inflated and decoded with
//! [`pointstream_codec`], and the consumer absorbs them into a
//! [`GeometryBuffer`] through a [`StreamSession`].
//!
//! # Archives
//!
//! Archives are fetched once with [`ArchiveClient`], decoded eagerly into
//! [`ArchiveFrame`]s and played back in numeric name order by a
//! [`FrameSequencer`].

mod error;
mod fetch;

pub mod admission;
pub mod archive;
pub mod geometry;
pub mod json;
pub mod sequencer;
pub mod session;
pub mod stream;
pub mod websocket;

pub use admission::{AdmissionController, AdmissionPermit, AdmissionState, AdmissionStats};
pub use archive::{ArchiveFrame, Container, Dataset, Entry, Layout, load_frames};
pub use error::{Error, Result};
pub use fetch::ArchiveClient;
pub use geometry::{Aabb, ColorTransition, GeometryBuffer, IngestReport, RenderTarget};
pub use json::JsonContainer;
pub use sequencer::{FrameSequencer, compare_frame_names};
pub use session::{ConnectionState, StreamSession};
pub use stream::{ReadyFrame, StreamUpdate, TransportEvent, pump};

pub use pointstream_codec::{CodecError, DecodedFrame};
