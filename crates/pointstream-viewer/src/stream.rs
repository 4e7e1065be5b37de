//! Live stream playback.
//!
//! The WebSocket receive loop runs on the Tokio runtime and does admission
//! and decoding there. Decoded frames reach the main thread through an
//! `async_channel` and are absorbed once per update into the session's
//! geometry buffer, which is mirrored into a single point list mesh.

use bevy::camera::visibility::NoFrustumCulling;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;
use pointstream::{StreamSession, StreamUpdate, websocket};

use crate::camera::FitCamera;
use crate::config::{Source, ViewerConfig};
use crate::render::{MeshTarget, PointMaterial, empty_point_mesh};

/// Plugin for live stream playback.
pub struct StreamPlugin;

impl Plugin for StreamPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StreamState>()
            .init_resource::<StreamChannel>()
            .add_systems(Startup, (spawn_point_cloud, start_stream))
            .add_systems(Update, absorb_updates)
            .add_systems(Last, teardown_on_exit);
    }
}

/// The viewer's live stream session and the mesh it feeds.
#[derive(Resource, Default)]
pub struct StreamState {
    pub session: StreamSession,
    mesh: Option<Handle<Mesh>>,
    fitted: bool,
}

impl Drop for StreamState {
    fn drop(&mut self) {
        self.session.teardown();
    }
}

/// Channel for receiving updates from the receive loop.
#[derive(Resource)]
struct StreamChannel {
    rx: async_channel::Receiver<StreamUpdate>,
    tx: async_channel::Sender<StreamUpdate>,
}

impl Default for StreamChannel {
    fn default() -> Self {
        // At most one frame is in flight; the slack is for open/close notices.
        let (tx, rx) = async_channel::bounded(4);
        Self { rx, tx }
    }
}

fn spawn_point_cloud(
    mut commands: Commands,
    mut state: ResMut<StreamState>,
    mut meshes: ResMut<Assets<Mesh>>,
    material: Res<PointMaterial>,
) {
    let mesh = meshes.add(empty_point_mesh());
    commands.spawn((
        Mesh3d(mesh.clone()),
        MeshMaterial3d(material.0.clone()),
        Transform::default(),
        NoFrustumCulling,
    ));
    state.mesh = Some(mesh);
}

/// Spawn the receive loop on the Tokio runtime.
#[allow(clippy::needless_pass_by_value)]
fn start_stream(
    config: Res<ViewerConfig>,
    state: Res<StreamState>,
    channel: Res<StreamChannel>,
    runtime: ResMut<TokioTasksRuntime>,
) {
    let Source::Stream(url) = &config.source else {
        return;
    };
    let url = url.clone();
    let controller = state.session.controller();
    let tx = channel.tx.clone();

    tracing::info!("Started streaming from {}", url);
    runtime.spawn_background_task(move |_ctx| async move {
        websocket::run(url, controller, tx).await;
    });
}

/// Absorb everything the receive loop has delivered since the last update.
#[allow(clippy::needless_pass_by_value)]
fn absorb_updates(
    mut state: ResMut<StreamState>,
    channel: Res<StreamChannel>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut fit: MessageWriter<FitCamera>,
) {
    let state = &mut *state;
    while let Ok(update) = channel.rx.try_recv() {
        let Some(report) = state.session.apply(update) else {
            continue;
        };

        let buffer = state.session.buffer();
        if let Some(handle) = &state.mesh
            && let Some(mut mesh) = meshes.get_mut(handle)
        {
            let mut target = MeshTarget::new(&mut *mesh);
            buffer.sync_to(&mut target, &report);
        }

        if !state.fitted
            && let Some(bounds) = buffer.bounds()
        {
            fit.write(FitCamera(bounds));
            state.fitted = true;
        }
    }
}

/// Stop admitting frames and release storage when the app exits.
fn teardown_on_exit(mut exits: MessageReader<AppExit>, mut state: ResMut<StreamState>) {
    if exits.read().next().is_some() {
        tracing::info!("Tearing down stream session");
        state.session.teardown();
    }
}
