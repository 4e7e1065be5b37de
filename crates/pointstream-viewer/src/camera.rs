//! Orbit camera controller for inspecting point clouds.
//!
//! Drag with the left mouse button to orbit, scroll to zoom. The camera
//! frames the cloud once, when the first frame with geometry arrives.

use bevy::ecs::message::{Message, MessageReader};
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy_egui::input::egui_wants_any_pointer_input;
use pointstream::Aabb;

/// Closest the camera may get to its focus point.
pub const MIN_RADIUS: f32 = 0.05;
/// Farthest the camera may get from its focus point.
pub const MAX_RADIUS: f32 = 100_000.0;

/// Plugin for orbit camera controls.
pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_message::<FitCamera>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (
                    fit_to_bounds,
                    camera_orbit.run_if(not(egui_wants_any_pointer_input)),
                    camera_zoom.run_if(not(egui_wants_any_pointer_input)),
                    apply_orbit,
                )
                    .chain(),
            );
    }
}

/// Request to frame a bounding volume.
#[derive(Message, Debug, Clone, Copy)]
pub struct FitCamera(pub Aabb);

/// Settings for camera movement.
#[derive(Resource)]
pub struct CameraSettings {
    /// Radians of rotation per pixel of mouse motion.
    pub orbit_sensitivity: f32,
    /// Zoom factor per scroll line.
    pub zoom_step: f32,
    /// Extra distance beyond the tight fit, as a multiplier.
    pub fit_margin: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 0.005,
            zoom_step: 1.1,
            fit_margin: 1.2,
        }
    }
}

/// Orbit state of the viewer camera.
#[derive(Component)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            radius: 20.0,
            yaw: 0.6,
            pitch: 0.4,
        }
    }
}

impl OrbitCamera {
    fn eye(&self) -> Vec3 {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0);
        self.focus + rotation * Vec3::new(0.0, 0.0, self.radius)
    }

    /// Place the camera so a sphere around `bounds` fills the view.
    fn fit(&mut self, bounds: &Aabb, fov: f32, margin: f32) {
        self.focus = bounds.center();
        let radius = bounds.radius().max(MIN_RADIUS);
        self.radius = (radius / (fov * 0.5).sin() * margin).clamp(MIN_RADIUS, MAX_RADIUS);
    }
}

fn spawn_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    let transform = Transform::from_translation(orbit.eye()).looking_at(orbit.focus, Vec3::Y);
    commands.spawn((Camera3d::default(), transform, orbit));
}

/// Frame the first bounds that arrive.
#[allow(clippy::needless_pass_by_value)]
fn fit_to_bounds(
    mut requests: MessageReader<FitCamera>,
    settings: Res<CameraSettings>,
    mut query: Query<(&mut OrbitCamera, &Projection)>,
) {
    let Some(FitCamera(bounds)) = requests.read().last().copied() else {
        return;
    };
    for (mut orbit, projection) in &mut query {
        let fov = match projection {
            Projection::Perspective(perspective) => perspective.fov,
            _ => std::f32::consts::FRAC_PI_4,
        };
        orbit.fit(&bounds, fov, settings.fit_margin);
        tracing::info!(
            "Camera fit to center={:?} distance={:.2}",
            orbit.focus,
            orbit.radius
        );
    }
}

/// Rotate around the focus while the left button is held.
#[allow(clippy::needless_pass_by_value)]
fn camera_orbit(
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    settings: Res<CameraSettings>,
    mut query: Query<&mut OrbitCamera>,
) {
    let delta: Vec2 = motion.read().map(|event| event.delta).sum();
    if !mouse.pressed(MouseButton::Left) || delta == Vec2::ZERO {
        return;
    }

    for mut orbit in &mut query {
        orbit.yaw -= delta.x * settings.orbit_sensitivity;
        // Stop short of the poles so `looking_at` keeps a stable up vector.
        orbit.pitch = (orbit.pitch + delta.y * settings.orbit_sensitivity).clamp(-1.5, 1.5);
    }
}

/// Zoom toward or away from the focus with the scroll wheel.
#[allow(clippy::needless_pass_by_value)]
fn camera_zoom(
    mut scroll: MessageReader<MouseWheel>,
    settings: Res<CameraSettings>,
    mut query: Query<&mut OrbitCamera>,
) {
    let lines: f32 = scroll.read().map(|event| event.y).sum();
    if lines == 0.0 {
        return;
    }
    let factor = settings.zoom_step.powf(-lines);
    for mut orbit in &mut query {
        orbit.radius = (orbit.radius * factor).clamp(MIN_RADIUS, MAX_RADIUS);
    }
}

fn apply_orbit(mut query: Query<(&OrbitCamera, &mut Transform), Changed<OrbitCamera>>) {
    for (orbit, mut transform) in &mut query {
        *transform = Transform::from_translation(orbit.eye()).looking_at(orbit.focus, Vec3::Y);
    }
}
