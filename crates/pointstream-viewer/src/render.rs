//! Bevy side of the point cloud geometry.
//!
//! Points are drawn as an unlit point list. A streamed cloud keeps one mesh
//! whose attributes mirror the [`GeometryBuffer`](pointstream::GeometryBuffer)
//! storage; the draw range is expressed as an index list over the active
//! points, since vertex attributes always span full capacity.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::*;
use bevy::render::renderer::RenderAdapterInfo;
use pointstream::{Aabb, RenderTarget};

use crate::status::ViewerStatus;

/// Shared material for every point cloud mesh.
#[derive(Resource)]
pub struct PointMaterial(pub Handle<StandardMaterial>);

/// Plugin for point cloud materials and render context checks.
pub struct PointRenderPlugin;

impl Plugin for PointRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, create_point_material)
            .add_systems(PostStartup, verify_render_context);
    }
}

fn create_point_material(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..Default::default()
    });
    commands.insert_resource(PointMaterial(material));
}

/// Report a missing graphics context instead of rendering nothing silently.
#[allow(clippy::needless_pass_by_value)]
fn verify_render_context(adapter: Option<Res<RenderAdapterInfo>>, mut status: ResMut<ViewerStatus>) {
    match adapter {
        Some(info) => tracing::info!("Rendering with {} ({:?})", info.name, info.backend),
        None => {
            let error = pointstream::Error::RenderInit("no graphics adapter available".into());
            tracing::error!("{}", error);
            status.fatal = Some(error.to_string());
        }
    }
}

fn to_vec3s(flat: &[f32]) -> Vec<[f32; 3]> {
    flat.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect()
}

fn to_rgba(flat: &[f32]) -> Vec<[f32; 4]> {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2], 1.0]).collect()
}

/// An empty point list mesh that will be filled by a [`MeshTarget`].
#[must_use]
pub fn empty_point_mesh() -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, Vec::<[f32; 3]>::new());
    mesh.insert_indices(Indices::U32(Vec::new()));
    mesh
}

/// A static point list mesh for one archive frame.
#[must_use]
pub fn point_mesh(positions: &[f32], colors: &[f32]) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, to_vec3s(positions));
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, to_rgba(colors));
    mesh
}

/// Adapts a Bevy [`Mesh`] to the geometry buffer's renderer interface.
pub struct MeshTarget<'a> {
    mesh: &'a mut Mesh,
    bounds: Option<Aabb>,
}

impl<'a> MeshTarget<'a> {
    pub fn new(mesh: &'a mut Mesh) -> Self {
        Self { mesh, bounds: None }
    }

    /// Bounds reported by the last sync.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}

impl RenderTarget for MeshTarget<'_> {
    fn bind_positions(&mut self, storage: &[f32]) {
        self.mesh
            .insert_attribute(Mesh::ATTRIBUTE_POSITION, to_vec3s(storage));
    }

    fn update_positions(&mut self, active: &[f32]) {
        if let Some(VertexAttributeValues::Float32x3(values)) =
            self.mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION)
        {
            for (dst, src) in values.iter_mut().zip(active.chunks_exact(3)) {
                *dst = [src[0], src[1], src[2]];
            }
        }
    }

    fn bind_colors(&mut self, storage: &[f32]) {
        self.mesh
            .insert_attribute(Mesh::ATTRIBUTE_COLOR, to_rgba(storage));
    }

    fn update_colors(&mut self, active: &[f32]) {
        if let Some(VertexAttributeValues::Float32x4(values)) =
            self.mesh.attribute_mut(Mesh::ATTRIBUTE_COLOR)
        {
            for (dst, src) in values.iter_mut().zip(active.chunks_exact(3)) {
                *dst = [src[0], src[1], src[2], 1.0];
            }
        }
    }

    fn disable_colors(&mut self) {
        self.mesh.remove_attribute(Mesh::ATTRIBUTE_COLOR);
    }

    fn set_draw_range(&mut self, start: u32, count: u32) {
        let end = start + count;
        match self.mesh.indices_mut() {
            // Indices are always a contiguous run, so only the tail changes.
            Some(Indices::U32(indices)) if indices.first().is_none_or(|&first| first == start) => {
                let len = indices.len();
                let wanted = count as usize;
                if len > wanted {
                    indices.truncate(wanted);
                } else {
                    #[allow(clippy::cast_possible_truncation)]
                    indices.extend(start + len as u32..end);
                }
            }
            _ => self.mesh.insert_indices(Indices::U32((start..end).collect())),
        }
    }

    fn set_bounds(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointstream::{DecodedFrame, GeometryBuffer};

    fn indices(mesh: &Mesh) -> Vec<u32> {
        match mesh.indices() {
            Some(Indices::U32(indices)) => indices.clone(),
            _ => Vec::new(),
        }
    }

    fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn mesh_follows_buffer_through_growth_and_shrink() {
        let mut mesh = empty_point_mesh();
        let mut buffer = GeometryBuffer::new();

        let big = DecodedFrame::new(3, vec![1.0; 9], Some(vec![255; 9])).unwrap();
        let report = buffer.ingest(&big).unwrap();
        let mut target = MeshTarget::new(&mut mesh);
        buffer.sync_to(&mut target, &report);
        assert!(target.bounds().is_some());
        assert_eq!(positions(&mesh).len(), 3);
        assert_eq!(indices(&mesh), [0, 1, 2]);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());

        let small = DecodedFrame::new(1, vec![7.0, 8.0, 9.0], None).unwrap();
        let report = buffer.ingest(&small).unwrap();
        buffer.sync_to(&mut MeshTarget::new(&mut mesh), &report);
        assert_eq!(positions(&mesh).len(), 3);
        assert_eq!(positions(&mesh)[0], [7.0, 8.0, 9.0]);
        assert_eq!(indices(&mesh), [0]);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_none());
    }

    #[test]
    fn archive_mesh_has_colors() {
        let mesh = point_mesh(&[0.0, 1.0, 2.0], &[1.0, 0.5, 0.0]);
        assert_eq!(mesh.count_vertices(), 1);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());
    }
}
