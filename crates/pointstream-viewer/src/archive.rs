//! Archive playback.
//!
//! The archive is fetched and decoded once in the background. Every frame
//! becomes its own hidden mesh entity; playback only toggles visibility.

use bevy::camera::visibility::NoFrustumCulling;
use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;
use pointstream::{Aabb, ArchiveClient, ArchiveFrame, FrameSequencer};

use crate::camera::FitCamera;
use crate::config::{Source, ViewerConfig};
use crate::render::{PointMaterial, point_mesh};

type LoadResult = pointstream::Result<Vec<(String, ArchiveFrame)>>;

/// Plugin for archive playback.
pub struct ArchivePlugin;

impl Plugin for ArchivePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArchiveState>()
            .init_resource::<ArchiveChannel>()
            .add_systems(Startup, start_archive_load)
            .add_systems(Update, (poll_archive_load, advance_playback).chain());
    }
}

/// One spawned archive frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameEntry {
    pub entity: Entity,
    pub points: usize,
    pub bounds: Option<Aabb>,
}

/// State for archive playback.
#[derive(Resource, Default)]
pub struct ArchiveState {
    /// Frames in playback order (once loaded).
    pub sequencer: Option<FrameSequencer<FrameEntry>>,
    /// Terminal load error, shown to the user.
    pub error: Option<String>,
}

/// Channel for receiving the loaded archive from the background task.
#[derive(Resource)]
struct ArchiveChannel {
    rx: async_channel::Receiver<LoadResult>,
    tx: async_channel::Sender<LoadResult>,
}

impl Default for ArchiveChannel {
    fn default() -> Self {
        let (tx, rx) = async_channel::bounded(1);
        Self { rx, tx }
    }
}

/// Start fetching the archive.
#[allow(clippy::needless_pass_by_value)]
fn start_archive_load(
    config: Res<ViewerConfig>,
    channel: Res<ArchiveChannel>,
    runtime: ResMut<TokioTasksRuntime>,
) {
    let Source::Archive(url) = &config.source else {
        return;
    };
    let url = url.clone();
    let group = config.group.clone();
    let tx = channel.tx.clone();

    tracing::info!("Started loading archive {}", url);
    runtime.spawn_background_task(move |_ctx| async move {
        let result = ArchiveClient::new().fetch_frames(&url, &group).await;
        let _ = tx.send(result).await;
    });
}

/// Spawn meshes for the loaded archive, or record why it failed.
#[allow(clippy::needless_pass_by_value)]
fn poll_archive_load(
    mut commands: Commands,
    mut state: ResMut<ArchiveState>,
    channel: Res<ArchiveChannel>,
    config: Res<ViewerConfig>,
    material: Res<PointMaterial>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut fit: MessageWriter<FitCamera>,
) {
    let Ok(result) = channel.rx.try_recv() else {
        return;
    };

    let frames = match result {
        Ok(frames) => frames,
        Err(e) => {
            tracing::error!("Failed to load archive: {}", e);
            state.error = Some(e.to_string());
            return;
        }
    };

    let entries = frames
        .into_iter()
        .map(|(name, frame)| {
            let entity = commands
                .spawn((
                    Mesh3d(meshes.add(point_mesh(&frame.positions, &frame.colors))),
                    MeshMaterial3d(material.0.clone()),
                    Transform::default(),
                    Visibility::Hidden,
                    NoFrustumCulling,
                ))
                .id();
            let entry = FrameEntry {
                entity,
                points: frame.point_count(),
                bounds: frame.bounds(),
            };
            (name, entry)
        })
        .collect();

    match FrameSequencer::new(entries, config.frame_interval) {
        Ok(sequencer) => {
            let (name, first) = sequencer.current();
            tracing::info!("Playing {} archive frames starting at '{}'", sequencer.len(), name);
            commands.entity(first.entity).insert(Visibility::Visible);
            if let Some(bounds) = first.bounds {
                fit.write(FitCamera(bounds));
            }
            state.sequencer = Some(sequencer);
        }
        Err(e) => {
            tracing::error!("Failed to start playback: {}", e);
            state.error = Some(e.to_string());
        }
    }
}

/// Show the next frame once the playback interval has elapsed.
#[allow(clippy::needless_pass_by_value)]
fn advance_playback(
    time: Res<Time<Real>>,
    mut state: ResMut<ArchiveState>,
    mut visibility: Query<&mut Visibility>,
) {
    let Some(sequencer) = state.sequencer.as_mut() else {
        return;
    };

    let previous = sequencer.current().1.entity;
    if sequencer.tick(time.elapsed()).is_none() {
        return;
    }
    let next = sequencer.current().1.entity;

    if let Ok(mut shown) = visibility.get_mut(previous) {
        *shown = Visibility::Hidden;
    }
    if let Ok(mut shown) = visibility.get_mut(next) {
        *shown = Visibility::Visible;
    }
}
