//! Frame layout parsing.
//!
//! # Format
//!
//! All fields are little-endian:
//!
//! - Bytes 0-3: point count (u32)
//! - Byte 4: color flag (u8, any nonzero value means colors follow)
//! - Next 12 × N bytes: positions (N × 3 × f32)
//! - Next 3 × N bytes: colors (N × 3 × u8), only when the flag is set
//!
//! Colors stay in their 8-bit wire form here; normalization to [0, 1]
//! happens when a frame is copied into geometry storage.

use crate::error::{CodecError, CodecResult};
use crate::{COMPONENTS, HEADER_LEN};

/// Bytes per point for positions (3 × f32).
const POSITION_STRIDE: usize = COMPONENTS * size_of::<f32>();
/// Bytes per point for colors (3 × u8).
const COLOR_STRIDE: usize = COMPONENTS;

/// One decoded point cloud snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    point_count: u32,
    positions: Vec<f32>,
    colors: Option<Vec<u8>>,
}

impl DecodedFrame {
    /// Build a frame, checking that both arrays hold `3 × point_count` values.
    pub fn new(point_count: u32, positions: Vec<f32>, colors: Option<Vec<u8>>) -> CodecResult<Self> {
        let expected = component_count(point_count)
            .ok_or_else(|| CodecError::InvalidFrame(format!("point count {point_count} overflows")))?;
        if positions.len() != expected {
            return Err(CodecError::InvalidFrame(format!(
                "expected {expected} position components, got {}",
                positions.len()
            )));
        }
        if let Some(colors) = &colors
            && colors.len() != expected
        {
            return Err(CodecError::InvalidFrame(format!(
                "expected {expected} color components, got {}",
                colors.len()
            )));
        }
        Ok(Self {
            point_count,
            positions,
            colors,
        })
    }

    /// A frame with no points and no colors.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            point_count: 0,
            positions: Vec::new(),
            colors: None,
        }
    }

    #[must_use]
    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    #[must_use]
    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Interleaved XYZ positions, `3 × point_count` values.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Interleaved 8-bit RGB colors, absent when the frame carries none.
    #[must_use]
    pub fn colors(&self) -> Option<&[u8]> {
        self.colors.as_deref()
    }
}

fn component_count(point_count: u32) -> Option<usize> {
    usize::try_from(point_count).ok()?.checked_mul(COMPONENTS)
}

/// Number of bytes a frame with this header occupies on the wire.
///
/// Returns `None` when the size does not fit in `usize`.
#[must_use]
pub fn required_len(point_count: u32, has_colors: bool) -> Option<usize> {
    let points = usize::try_from(point_count).ok()?;
    let stride = if has_colors {
        POSITION_STRIDE + COLOR_STRIDE
    } else {
        POSITION_STRIDE
    };
    points.checked_mul(stride)?.checked_add(HEADER_LEN)
}

/// Parse a decompressed frame.
///
/// Bytes past the size implied by the header are ignored.
pub fn decode(raw: &[u8]) -> CodecResult<DecodedFrame> {
    let Some(header) = raw.get(..HEADER_LEN) else {
        return Err(CodecError::TruncatedFrame {
            expected: HEADER_LEN,
            actual: raw.len(),
        });
    };
    let point_count = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let has_colors = header[4] != 0;

    let expected = required_len(point_count, has_colors).unwrap_or(usize::MAX);
    if raw.len() < expected {
        return Err(CodecError::TruncatedFrame {
            expected,
            actual: raw.len(),
        });
    }

    // Bounded by the length check above.
    let points = point_count as usize;
    let positions_end = HEADER_LEN + points * POSITION_STRIDE;

    let positions = raw[HEADER_LEN..positions_end]
        .chunks_exact(size_of::<f32>())
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let colors = has_colors.then(|| raw[positions_end..positions_end + points * COLOR_STRIDE].to_vec());

    Ok(DecodedFrame {
        point_count,
        positions,
        colors,
    })
}

/// Serialize a frame in the wire layout (before compression).
#[must_use]
pub fn encode(frame: &DecodedFrame) -> Vec<u8> {
    let len = required_len(frame.point_count, frame.has_colors()).unwrap_or(HEADER_LEN);
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&frame.point_count.to_le_bytes());
    out.push(u8::from(frame.has_colors()));
    for value in &frame.positions {
        out.extend_from_slice(&value.to_le_bytes());
    }
    if let Some(colors) = &frame.colors {
        out.extend_from_slice(colors);
    }
    out
}
