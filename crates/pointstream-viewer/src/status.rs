//! On-screen status panel.

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use pointstream::ConnectionState;

use crate::archive::ArchiveState;
use crate::config::{Source, ViewerConfig};
use crate::stream::StreamState;

/// Plugin for the status overlay.
pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerStatus>()
            .add_systems(EguiPrimaryContextPass, draw_status);
    }
}

/// Session-wide problems that end playback.
#[derive(Resource, Default)]
pub struct ViewerStatus {
    pub fatal: Option<String>,
}

fn connection_label(state: &ConnectionState) -> (String, egui::Color32) {
    match state {
        ConnectionState::Connecting => ("connecting".into(), egui::Color32::YELLOW),
        ConnectionState::Open => ("open".into(), egui::Color32::GREEN),
        ConnectionState::Closed => ("closed by server".into(), egui::Color32::LIGHT_GRAY),
        ConnectionState::Failed(message) => (format!("failed: {message}"), egui::Color32::RED),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn draw_status(
    mut contexts: EguiContexts,
    config: Res<ViewerConfig>,
    status: Res<ViewerStatus>,
    stream: Option<Res<StreamState>>,
    archive: Option<Res<ArchiveState>>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    egui::Window::new("pointstream")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            match &config.source {
                Source::Stream(url) => ui.label(format!("Stream: {url}")),
                Source::Archive(url) => ui.label(format!("Archive: {url}")),
            };

            if let Some(stream) = &stream {
                let (label, color) = connection_label(stream.session.connection());
                ui.colored_label(color, format!("Connection: {label}"));

                let buffer = stream.session.buffer();
                let stats = stream.session.stats();
                ui.label(format!(
                    "Points: {} (capacity {})",
                    buffer.active_points(),
                    buffer.capacity_points()
                ));
                ui.label(format!("Colors: {}", if buffer.colors_enabled() { "on" } else { "off" }));
                ui.label(format!(
                    "Frames: {} shown, {} skipped, {} bad",
                    stats.completed, stats.skipped, stats.failed
                ));
            }

            if let Some(archive) = &archive {
                match &archive.sequencer {
                    Some(sequencer) => {
                        let (name, entry) = sequencer.current();
                        ui.label(format!(
                            "Frame {}/{}: {name} ({} points)",
                            sequencer.index() + 1,
                            sequencer.len(),
                            entry.points
                        ));
                    }
                    None if archive.error.is_none() => {
                        ui.label("Loading archive...");
                    }
                    None => {}
                }
                if let Some(error) = &archive.error {
                    ui.colored_label(egui::Color32::RED, error);
                }
            }

            if let Some(fatal) = &status.fatal {
                ui.colored_label(egui::Color32::RED, fatal);
            }
        });

    Ok(())
}
