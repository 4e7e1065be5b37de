//! Archive playback ordering and cadence.

use std::cmp::Ordering;
use std::time::Duration;

use crate::error::{Error, Result};

/// Digits of `name` in order, without leading zeros.
fn frame_number(name: &str) -> Option<String> {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
}

/// Order frame names by the number their digits spell.
///
/// Compares digit strings by length, then lexically, so arbitrarily long
/// numbers never overflow. Names without digits sort after numbered ones.
#[must_use]
pub fn compare_frame_names(a: &str, b: &str) -> Ordering {
    match (frame_number(a), frame_number(b)) {
        (Some(a), Some(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Cycles through named frames at a fixed cadence.
///
/// Advancement is driven by elapsed time, so render cost does not change
/// playback speed. A late tick advances by one frame only; missed frames
/// are not skipped over.
#[derive(Debug)]
pub struct FrameSequencer<T> {
    frames: Vec<(String, T)>,
    interval: Duration,
    index: usize,
    last_advance: Option<Duration>,
}

impl<T> FrameSequencer<T> {
    /// Sort `frames` numerically by name and start at the first one.
    ///
    /// Ties keep their original order.
    pub fn new(mut frames: Vec<(String, T)>, interval: Duration) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::EmptyArchive);
        }
        frames.sort_by(|(a, _), (b, _)| compare_frame_names(a, b));
        Ok(Self {
            frames,
            interval,
            index: 0,
            last_advance: None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn current(&self) -> (&str, &T) {
        let (name, frame) = &self.frames[self.index];
        (name, frame)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|(name, _)| name.as_str())
    }

    pub fn frames(&self) -> impl Iterator<Item = &T> {
        self.frames.iter().map(|(_, frame)| frame)
    }

    /// Advance if at least one interval has passed since the last advance.
    ///
    /// `now` is any monotonic timestamp. The first call only starts the
    /// clock. Returns the new index when the frame changed.
    pub fn tick(&mut self, now: Duration) -> Option<usize> {
        let last = *self.last_advance.get_or_insert(now);
        if now.saturating_sub(last) < self.interval {
            return None;
        }
        self.index = (self.index + 1) % self.frames.len();
        self.last_advance = Some(now);
        Some(self.index)
    }
}
