//! Reusable vertex storage for streamed frames.
//!
//! Storage is sized to the largest frame seen so far and never shrinks.
//! Once capacity is sufficient, ingesting a frame is a bounded copy into
//! the existing arrays plus an update of the active point count.

use glam::Vec3;
use pointstream_codec::{COMPONENTS, DecodedFrame};

/// Axis-aligned bounding box over a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Bounds of interleaved XYZ positions, `None` if there are none.
    #[must_use]
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut points = positions
            .chunks_exact(COMPONENTS)
            .map(|p| Vec3::new(p[0], p[1], p[2]));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the bounding sphere around [`Self::center`].
    #[must_use]
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }
}

/// How color availability changed with the last ingested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTransition {
    Unchanged,
    /// Colors are present again (or for the first time); draw them.
    Enabled,
    /// Colors stopped arriving; storage is kept but should not be drawn.
    Disabled,
}

/// What a single [`GeometryBuffer::ingest`] did to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Storage was reallocated; renderer views must be rebound.
    pub storage_replaced: bool,
    pub colors: ColorTransition,
    /// This was the first frame the buffer accepted.
    pub first_frame: bool,
}

/// The renderer-side geometry the buffer pushes its state into.
///
/// Slices passed to `bind_*` span full capacity; slices passed to
/// `update_*` span only the active range.
pub trait RenderTarget {
    /// Replace the position attribute with new storage (3 components per point).
    fn bind_positions(&mut self, storage: &[f32]);
    /// Overwrite the leading part of the current position attribute.
    fn update_positions(&mut self, active: &[f32]);
    /// Replace the color attribute with new storage (normalized RGB).
    fn bind_colors(&mut self, storage: &[f32]);
    /// Overwrite the leading part of the current color attribute.
    fn update_colors(&mut self, active: &[f32]);
    /// Stop drawing the color attribute without discarding it.
    fn disable_colors(&mut self);
    /// Restrict drawing to `count` points starting at `start`.
    fn set_draw_range(&mut self, start: u32, count: u32);
    /// Bounding volume of the active range.
    fn set_bounds(&mut self, bounds: Option<Aabb>);
}

/// Growable position/color storage with a separate active point count.
#[derive(Debug, Default)]
pub struct GeometryBuffer {
    capacity_points: u32,
    positions: Box<[f32]>,
    colors: Option<Box<[f32]>>,
    active_points: u32,
    colors_enabled: bool,
    bounds: Option<Aabb>,
    storage_replaced: bool,
    frames_ingested: u64,
    released: bool,
}

impl GeometryBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size storage for `points` points.
    #[must_use]
    pub fn with_capacity(points: u32) -> Self {
        Self {
            capacity_points: points,
            positions: zeroed(points),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn capacity_points(&self) -> u32 {
        self.capacity_points
    }

    #[must_use]
    pub fn active_points(&self) -> u32 {
        self.active_points
    }

    #[must_use]
    pub fn colors_enabled(&self) -> bool {
        self.colors_enabled
    }

    /// Whether the last ingest reallocated storage.
    #[must_use]
    pub fn storage_replaced(&self) -> bool {
        self.storage_replaced
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    #[must_use]
    pub fn frames_ingested(&self) -> u64 {
        self.frames_ingested
    }

    /// Whether [`Self::release`] has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Positions of the active points.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions[..self.active_components()]
    }

    /// Normalized colors of the active points, when colors are enabled.
    #[must_use]
    pub fn colors(&self) -> Option<&[f32]> {
        let active = self.active_components();
        self.colors
            .as_deref()
            .filter(|_| self.colors_enabled)
            .map(|c| &c[..active])
    }

    /// Full position storage, including slots past the active range.
    #[must_use]
    pub fn position_storage(&self) -> &[f32] {
        &self.positions
    }

    /// Full color storage, if it was ever allocated.
    #[must_use]
    pub fn color_storage(&self) -> Option<&[f32]> {
        self.colors.as_deref()
    }

    fn active_components(&self) -> usize {
        self.active_points as usize * COMPONENTS
    }

    /// Copy a decoded frame into storage.
    ///
    /// Returns `None` once the buffer has been released, in which case
    /// nothing is touched.
    pub fn ingest(&mut self, frame: &DecodedFrame) -> Option<IngestReport> {
        if self.released {
            return None;
        }

        let points = frame.point_count();
        let first_frame = self.frames_ingested == 0;

        let storage_replaced = points > self.capacity_points;
        if storage_replaced {
            self.capacity_points = points;
            self.positions = zeroed(points);
            if self.colors.is_some() {
                self.colors = Some(zeroed(points));
            }
        }
        self.storage_replaced = storage_replaced;

        let len = frame.positions().len();
        self.positions[..len].copy_from_slice(frame.positions());

        let colors = match frame.colors() {
            Some(wire) => {
                let storage = self
                    .colors
                    .get_or_insert_with(|| zeroed(self.capacity_points));
                for (dst, &src) in storage[..wire.len()].iter_mut().zip(wire) {
                    *dst = f32::from(src) / 255.0;
                }
                if self.colors_enabled {
                    ColorTransition::Unchanged
                } else {
                    self.colors_enabled = true;
                    ColorTransition::Enabled
                }
            }
            None if self.colors_enabled => {
                self.colors_enabled = false;
                ColorTransition::Disabled
            }
            None => ColorTransition::Unchanged,
        };

        self.active_points = points;
        self.bounds = Aabb::from_positions(self.positions());
        self.frames_ingested += 1;

        Some(IngestReport {
            storage_replaced,
            colors,
            first_frame,
        })
    }

    /// Push the current state into a renderer, following `report`.
    pub fn sync_to<T: RenderTarget + ?Sized>(&self, target: &mut T, report: &IngestReport) {
        let active = self.active_components();

        if report.storage_replaced || report.first_frame {
            target.bind_positions(&self.positions);
        } else {
            target.update_positions(&self.positions[..active]);
        }

        match (&self.colors, self.colors_enabled) {
            (Some(colors), true) => {
                let rebind = report.storage_replaced
                    || report.first_frame
                    || report.colors == ColorTransition::Enabled;
                if rebind {
                    target.bind_colors(colors);
                } else {
                    target.update_colors(&colors[..active]);
                }
            }
            _ if report.colors == ColorTransition::Disabled => target.disable_colors(),
            _ => {}
        }

        target.set_draw_range(0, self.active_points);
        target.set_bounds(self.bounds);
    }

    /// Drop storage on viewer teardown; later ingests are ignored.
    pub fn release(&mut self) {
        self.released = true;
        self.positions = Box::default();
        self.colors = None;
        self.capacity_points = 0;
        self.active_points = 0;
        self.colors_enabled = false;
        self.bounds = None;
    }
}

fn zeroed(points: u32) -> Box<[f32]> {
    vec![0.0; points as usize * COMPONENTS].into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(points: u32, colors: bool) -> DecodedFrame {
        let positions = (0..points * 3).map(|i| i as f32 * 0.5 - 3.0).collect();
        let colors = colors.then(|| (0..points * 3).map(|i| (i * 17 % 256) as u8).collect());
        DecodedFrame::new(points, positions, colors).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        positions: Vec<f32>,
        colors: Vec<f32>,
        range: (u32, u32),
    }

    impl RenderTarget for Recorder {
        fn bind_positions(&mut self, storage: &[f32]) {
            self.calls.push("bind_positions");
            self.positions = storage.to_vec();
        }
        fn update_positions(&mut self, active: &[f32]) {
            self.calls.push("update_positions");
            self.positions[..active.len()].copy_from_slice(active);
        }
        fn bind_colors(&mut self, storage: &[f32]) {
            self.calls.push("bind_colors");
            self.colors = storage.to_vec();
        }
        fn update_colors(&mut self, active: &[f32]) {
            self.calls.push("update_colors");
            self.colors[..active.len()].copy_from_slice(active);
        }
        fn disable_colors(&mut self) {
            self.calls.push("disable_colors");
        }
        fn set_draw_range(&mut self, start: u32, count: u32) {
            self.range = (start, count);
        }
        fn set_bounds(&mut self, _bounds: Option<Aabb>) {
            self.calls.push("set_bounds");
        }
    }

    #[test]
    fn first_frame_allocates_exactly() {
        let mut buffer = GeometryBuffer::new();
        let report = buffer.ingest(&frame(4, false)).unwrap();
        assert!(report.storage_replaced);
        assert!(report.first_frame);
        assert_eq!(buffer.capacity_points(), 4);
        assert_eq!(buffer.active_points(), 4);
        assert_eq!(buffer.positions(), frame(4, false).positions());
    }

    #[test]
    fn smaller_frame_reuses_storage() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(10, false));
        let ptr = buffer.position_storage().as_ptr();

        let report = buffer.ingest(&frame(3, false)).unwrap();
        assert!(!report.storage_replaced);
        assert!(!buffer.storage_replaced());
        assert_eq!(buffer.capacity_points(), 10);
        assert_eq!(buffer.active_points(), 3);
        assert_eq!(buffer.position_storage().as_ptr(), ptr);
        assert_eq!(buffer.positions().len(), 9);
    }

    #[test]
    fn larger_frame_grows_to_exact_count() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(5, false));
        let report = buffer.ingest(&frame(7, false)).unwrap();
        assert!(report.storage_replaced);
        assert_eq!(buffer.capacity_points(), 7);
        assert_eq!(buffer.position_storage().len(), 21);
    }

    #[test]
    fn colors_normalize_to_unit_range() {
        let mut buffer = GeometryBuffer::new();
        let f = DecodedFrame::new(1, vec![0.0; 3], Some(vec![0, 255, 51])).unwrap();
        let report = buffer.ingest(&f).unwrap();
        assert_eq!(report.colors, ColorTransition::Enabled);
        assert_eq!(buffer.colors(), Some(&[0.0, 1.0, 0.2][..]));
    }

    #[test]
    fn colors_disabled_keeps_storage() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(4, true));
        let report = buffer.ingest(&frame(4, false)).unwrap();
        assert_eq!(report.colors, ColorTransition::Disabled);
        assert!(!buffer.colors_enabled());
        assert!(buffer.colors().is_none());
        assert_eq!(buffer.color_storage().map(<[f32]>::len), Some(12));

        let report = buffer.ingest(&frame(2, true)).unwrap();
        assert_eq!(report.colors, ColorTransition::Enabled);
        assert!(!report.storage_replaced);
    }

    #[test]
    fn late_colors_are_sized_to_capacity() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(8, false));
        buffer.ingest(&frame(2, true));
        assert_eq!(buffer.color_storage().map(<[f32]>::len), Some(24));
    }

    #[test]
    fn growth_reallocates_colors_too() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(2, true));
        buffer.ingest(&frame(6, false));
        assert_eq!(buffer.color_storage().map(<[f32]>::len), Some(18));
    }

    #[test]
    fn bounds_cover_active_range_only() {
        let mut buffer = GeometryBuffer::new();
        let big = DecodedFrame::new(2, vec![0.0, 0.0, 0.0, 100.0, 100.0, 100.0], None).unwrap();
        buffer.ingest(&big);
        let small = DecodedFrame::new(1, vec![1.0, 2.0, 3.0], None).unwrap();
        buffer.ingest(&small);
        let bounds = buffer.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn empty_frame_is_accepted() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(3, false));
        let report = buffer.ingest(&DecodedFrame::empty()).unwrap();
        assert!(!report.storage_replaced);
        assert_eq!(buffer.active_points(), 0);
        assert!(buffer.positions().is_empty());
        assert!(buffer.bounds().is_none());
    }

    #[test]
    fn released_buffer_ignores_frames() {
        let mut buffer = GeometryBuffer::new();
        buffer.ingest(&frame(3, true));
        buffer.release();
        assert!(buffer.ingest(&frame(3, true)).is_none());
        assert_eq!(buffer.capacity_points(), 0);
        assert!(buffer.is_released());
    }

    #[test]
    fn sync_rebinds_only_on_replacement() {
        let mut buffer = GeometryBuffer::new();
        let mut target = Recorder::default();

        let report = buffer.ingest(&frame(4, true)).unwrap();
        buffer.sync_to(&mut target, &report);
        assert_eq!(target.calls, ["bind_positions", "bind_colors", "set_bounds"]);
        assert_eq!(target.range, (0, 4));

        target.calls.clear();
        let report = buffer.ingest(&frame(2, true)).unwrap();
        buffer.sync_to(&mut target, &report);
        assert_eq!(target.calls, ["update_positions", "update_colors", "set_bounds"]);
        assert_eq!(target.range, (0, 2));
        assert_eq!(&target.positions[..6], buffer.positions());

        target.calls.clear();
        let report = buffer.ingest(&frame(2, false)).unwrap();
        buffer.sync_to(&mut target, &report);
        assert_eq!(target.calls, ["update_positions", "disable_colors", "set_bounds"]);
    }

    proptest! {
        #[test]
        fn active_range_reads_back_exactly(counts in proptest::collection::vec(0u32..200, 1..12)) {
            let mut buffer = GeometryBuffer::new();
            let mut high_water = 0;
            for n in counts {
                let before = buffer.capacity_points();
                let f = frame(n, n % 2 == 0);
                let report = buffer.ingest(&f).unwrap();
                high_water = high_water.max(n);

                prop_assert_eq!(buffer.positions(), f.positions());
                prop_assert_eq!(buffer.capacity_points(), high_water);
                prop_assert_eq!(report.storage_replaced, n > before);
                prop_assert!(buffer.capacity_points() >= buffer.active_points());
            }
        }
    }
}
