//! Multi-frame archive loading.
//!
//! Archives are named-group containers. The frame group maps frame names to
//! datasets of six properties per point, in the fixed order
//! `x, y, z, red, green, blue`. Container bindings disagree on whether a
//! dataset's flat values are laid out per point or per property, so each
//! [`Dataset`] declares its [`Layout`] and is normalized here into
//! row-major [`ArchiveFrame`] geometry.

use crate::error::{Error, Result};
use crate::geometry::Aabb;

/// Properties stored per point.
pub const PROPERTIES: usize = 6;

/// Group name used when none is configured.
pub const DEFAULT_GROUP: &str = "frames";

/// Order of the flat values in a [`Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[x0, y0, z0, r0, g0, b0, x1, ...]`
    RowMajor,
    /// `[x0, x1, ..., y0, y1, ..., b0, b1, ...]`
    ColumnMajor,
}

/// Flat numeric values of one archive dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub values: Vec<f64>,
    pub layout: Layout,
}

/// A child of a container group.
pub enum Entry<'a> {
    Group(Box<dyn Container + 'a>),
    Dataset(Dataset),
}

/// A named-group container, as exposed by an archive reader.
pub trait Container {
    /// Names of the direct children, in container order.
    fn keys(&self) -> Vec<String>;
    /// Look up a direct child.
    fn get(&self, name: &str) -> Option<Entry<'_>>;
}

/// Renderable geometry of one archive frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveFrame {
    /// Interleaved XYZ positions.
    pub positions: Vec<f32>,
    /// Interleaved RGB colors normalized to [0, 1].
    pub colors: Vec<f32>,
}

impl ArchiveFrame {
    /// Normalize a dataset into row-major positions and colors.
    ///
    /// Color values are on an 8-bit [0, 255] scale in archives.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let values = &dataset.values;
        if values.len() % PROPERTIES != 0 {
            return Err(Error::InvalidArchive(format!(
                "dataset length {} is not a multiple of {PROPERTIES}",
                values.len()
            )));
        }
        let points = values.len() / PROPERTIES;

        let value = |point: usize, property: usize| match dataset.layout {
            Layout::RowMajor => values[point * PROPERTIES + property],
            Layout::ColumnMajor => values[property * points + point],
        };

        let mut positions = Vec::with_capacity(points * 3);
        let mut colors = Vec::with_capacity(points * 3);
        for point in 0..points {
            for property in 0..3 {
                #[allow(clippy::cast_possible_truncation)]
                positions.push(value(point, property) as f32);
            }
            for property in 3..PROPERTIES {
                #[allow(clippy::cast_possible_truncation)]
                colors.push((value(point, property) / 255.0).clamp(0.0, 1.0) as f32);
            }
        }

        Ok(Self { positions, colors })
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_positions(&self.positions)
    }
}

/// Read every valid frame from `group`, in container order.
///
/// Datasets that do not hold whole points are skipped with a warning.
pub fn load_frames(container: &dyn Container, group: &str) -> Result<Vec<(String, ArchiveFrame)>> {
    let Some(Entry::Group(frames)) = container.get(group) else {
        return Err(Error::MissingContainerGroup(group.to_string()));
    };

    let mut loaded = Vec::new();
    for name in frames.keys() {
        match frames.get(&name) {
            Some(Entry::Dataset(dataset)) => match ArchiveFrame::from_dataset(&dataset) {
                Ok(frame) => loaded.push((name, frame)),
                Err(e) => tracing::warn!("Skipping archive frame '{}': {}", name, e),
            },
            Some(Entry::Group(_)) => tracing::warn!("Skipping nested group '{}'", name),
            None => {}
        }
    }

    if loaded.is_empty() {
        return Err(Error::EmptyArchive);
    }
    tracing::info!("Loaded {} archive frames from group '{}'", loaded.len(), group);
    Ok(loaded)
}
