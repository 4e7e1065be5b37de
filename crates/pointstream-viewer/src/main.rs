//! Viewer for animated point clouds, live or from an archive.
//!
//! Run: `pointstream-viewer --stream ws://127.0.0.1:9001`
//! or `pointstream-viewer --archive http://host/archive.json`

mod archive;
mod camera;
mod config;
mod render;
mod status;
mod stream;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_tokio_tasks::TokioTasksPlugin;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::archive::ArchivePlugin;
use crate::camera::CameraControllerPlugin;
use crate::config::{Args, ViewerConfig};
use crate::render::PointRenderPlugin;
use crate::status::StatusPlugin;
use crate::stream::StreamPlugin;

fn main() -> anyhow::Result<()> {
    let config = ViewerConfig::try_from(Args::parse())?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "pointstream".into(),
            ..default()
        }),
        ..default()
    }))
    .add_plugins((TokioTasksPlugin::default(), EguiPlugin::default()))
    .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
    .insert_resource(config.clone())
    .add_plugins((PointRenderPlugin, CameraControllerPlugin, StatusPlugin));

    if config.is_stream() {
        app.add_plugins(StreamPlugin);
    } else {
        app.add_plugins(ArchivePlugin);
    }

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("viewer exited with code {code}"),
    }
}
