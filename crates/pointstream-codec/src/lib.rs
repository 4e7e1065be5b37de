//! Decode compressed point cloud frames.
//!
//! This crate provides pure synchronous functions for turning one
//! transport message into typed geometry arrays. It holds no state and
//! does no logging, so callers decide where decoding runs.
//!
//! # Key functions
//!
//! - [`decompress`]: Inflate a zlib payload
//! - [`decode`]: Parse the raw frame layout into a [`DecodedFrame`]
//! - [`encode`] / [`compress`]: The producer side, for tools and tests

mod error;

pub mod decompress;
pub mod frame;

pub use decompress::{compress, decompress, decompress_into};
pub use error::{CodecError, CodecResult};
pub use frame::{DecodedFrame, decode, encode, required_len};

/// Components per point for both positions and colors.
pub const COMPONENTS: usize = 3;

/// Size of the fixed frame header (point count + color flag).
pub const HEADER_LEN: usize = 5;

/// Decompress and decode in one step, reusing `scratch` for the inflated bytes.
pub fn decode_payload(compressed: &[u8], scratch: &mut Vec<u8>) -> CodecResult<DecodedFrame> {
    decompress_into(compressed, scratch)?;
    decode(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trip() {
        let frame = DecodedFrame::new(1, vec![0.5, -0.5, 2.0], Some(vec![1, 2, 3])).unwrap();
        let payload = compress(&encode(&frame), 6);
        let mut scratch = Vec::new();
        assert_eq!(decode_payload(&payload, &mut scratch).unwrap(), frame);
    }

    #[test]
    fn payload_with_short_frame_is_truncated() {
        let payload = compress(&[3, 0, 0, 0, 0, 1, 2], 6);
        let mut scratch = Vec::new();
        assert!(matches!(
            decode_payload(&payload, &mut scratch),
            Err(CodecError::TruncatedFrame { .. })
        ));
    }
}
