//! Payload inflation.
//!
//! Producers compress each frame as a zlib stream (RFC 1950), which wraps a
//! raw DEFLATE body with a two-byte header and an Adler-32 trailer. The
//! trailer is verified, so truncated payloads are rejected rather than
//! silently yielding a short frame.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{CodecError, CodecResult};

/// Output growth step when the inflated size is not yet known.
const INFLATE_CHUNK: usize = 64 * 1024;

/// Inflate a compressed payload into a fresh buffer.
pub fn decompress(compressed: &[u8]) -> CodecResult<Vec<u8>> {
    let mut raw = Vec::new();
    decompress_into(compressed, &mut raw)?;
    Ok(raw)
}

/// Inflate a compressed payload into `out`, reusing its allocation.
///
/// `out` is cleared first. On error its contents are unspecified.
pub fn decompress_into(compressed: &[u8], out: &mut Vec<u8>) -> CodecResult<()> {
    out.clear();
    let mut inflater = Decompress::new(true);

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_CHUNK.max(compressed.len() * 2));
        }

        let in_before = inflater.total_in();
        let out_before = inflater.total_out();
        let offset = usize::try_from(in_before).unwrap_or(compressed.len());
        let input = compressed.get(offset..).unwrap_or_default();

        let status = inflater
            .decompress_vec(input, out, FlushDecompress::Finish)
            .map_err(|e| CodecError::CorruptPayload(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        if status == Status::StreamEnd {
            return Ok(());
        }

        // No progress with room left in `out` means the input ran dry.
        let progressed = inflater.total_in() != in_before || inflater.total_out() != out_before;
        if !progressed && out.len() < out.capacity() {
            return Err(CodecError::CorruptPayload(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "compressed stream ended before its trailer",
            )));
        }
    }
}

/// Compress a raw frame the way producers do.
///
/// `level` ranges from 0 (store) to 9 (best); values above 9 are clamped.
#[must_use]
pub fn compress(raw: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::new(level.min(9)));
    encoder
        .write_all(raw)
        .and_then(|()| encoder.finish())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_clamps_level_and_keeps_every_byte() {
        let raw: Vec<u8> = (0..3 * INFLATE_CHUNK).map(|i| (i * 7 % 251) as u8).collect();
        let packed = compress(&raw, 42);
        assert!(!packed.is_empty());
        assert_eq!(decompress(&packed).unwrap(), raw);
        assert_eq!(packed, compress(&raw, 9));
    }

    #[test]
    fn inflates_what_compress_produces() {
        let raw: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let packed = compress(&raw, 6);
        assert!(packed.len() < raw.len());
        assert_eq!(decompress(&packed).unwrap(), raw);
    }

    #[test]
    fn empty_payload_round_trips() {
        let packed = compress(&[], 6);
        assert!(decompress(&packed).unwrap().is_empty());
    }

    #[test]
    fn scratch_buffer_is_reused() {
        let mut scratch = Vec::with_capacity(1024);
        let first = compress(&[7; 512], 9);
        decompress_into(&first, &mut scratch).unwrap();
        let ptr = scratch.as_ptr();

        let second = compress(&[3; 256], 9);
        decompress_into(&second, &mut scratch).unwrap();
        assert_eq!(scratch, vec![3; 256]);
        assert_eq!(scratch.as_ptr(), ptr);
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = decompress(&[0xde, 0xad, 0xbe, 0xef, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::CorruptPayload(_)));
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let raw = vec![42u8; 2048];
        let packed = compress(&raw, 6);
        let cut = &packed[..packed.len() - 6];
        assert!(matches!(
            decompress(cut).unwrap_err(),
            CodecError::CorruptPayload(_)
        ));
    }

    #[test]
    fn empty_input_is_corrupt() {
        assert!(matches!(
            decompress(&[]).unwrap_err(),
            CodecError::CorruptPayload(_)
        ));
    }
}
