use glam::{Quat, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::camera::core::{Camera, CameraUniform};
use crate::gpu::render_context::RenderContext;
use crate::util::easing::EasingFunction;

/// Duration of a focus-point animation, per spec (1000 ms ease-out cubic).
const FOCUS_ANIMATION_MS: f32 = 1000.0;
const FOCUS_EASING: EasingFunction = EasingFunction::CubicOut;

/// Orbit controls around a focus point, with damped rotation/pan/zoom, a
/// min/max distance clamp, and a cancelable animated focus transition.
///
/// Mirrors the desktop `OrbitControls`-style camera described by the
/// spec's camera manager (C4): the camera never moves freely, only
/// orbits, pans, and zooms relative to `focus_point`.
pub struct CameraController {
    orientation: Quat,
    distance: f32,
    focus_point: Vec3,

    /// Radius of the currently loaded model's bounding sphere, used to
    /// scale the underwater fog falloff so it reads consistently across
    /// differently sized wrecks.
    bounding_radius: f32,

    min_distance: f32,
    max_distance: f32,

    /// Damping factor in `[0, 1)`; 0 disables damping (instant stop).
    pub damping_factor: f32,
    damping_enabled: bool,

    /// In-flight rotation/pan/zoom velocity, decayed each tick by
    /// `damping_factor` when damping is enabled.
    rotate_velocity: Vec2,
    pan_velocity: Vec2,
    zoom_velocity: f32,

    // Animated focus transition state. `None` means no animation is
    // in progress. Any direct user input (rotate/pan/zoom) cancels it.
    focus_animation: Option<FocusAnimation>,

    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,

    pub mouse_pressed: bool,
    pub shift_pressed: bool,
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
}

struct FocusAnimation {
    start_focus: Vec3,
    target_focus: Vec3,
    start_distance: f32,
    target_distance: f32,
    start_bounding_radius: f32,
    target_bounding_radius: f32,
    elapsed_ms: f32,
}

impl CameraController {
    pub fn new(context: &RenderContext) -> Self {
        let focus_point = Vec3::ZERO;
        let distance = 50.0;
        let orientation = Quat::IDENTITY;

        let camera = Camera {
            eye: focus_point + Vec3::new(0.0, 0.0, distance),
            target: focus_point,
            up: Vec3::Y,
            aspect: context.render_width() as f32 / context.render_height() as f32,
            fovy: 45.0,
            znear: 0.1,
            zfar: 10_000.0,
        };

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);

        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let layout = context
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("Camera Bind Group"),
            });

        Self {
            orientation,
            distance,
            focus_point,
            bounding_radius: 10.0,
            min_distance: 0.5,
            max_distance: 1000.0,
            damping_factor: 0.1,
            damping_enabled: true,
            rotate_velocity: Vec2::ZERO,
            pan_velocity: Vec2::ZERO,
            zoom_velocity: 0.0,
            focus_animation: None,
            camera,
            uniform,
            buffer,
            layout,
            bind_group,
            mouse_pressed: false,
            shift_pressed: false,
            rotate_speed: 0.01,
            pan_speed: 0.1,
            zoom_speed: 0.05,
        }
    }

    /// Advance the focus animation and damping decay by `dt` seconds.
    /// Returns `true` if the camera transform changed and the GPU
    /// uniform should be re-uploaded.
    pub fn update_animation(&mut self, dt: f32) -> bool {
        let mut dirty = false;

        if let Some(anim) = &mut self.focus_animation {
            anim.elapsed_ms += dt * 1000.0;
            let t = (anim.elapsed_ms / FOCUS_ANIMATION_MS).clamp(0.0, 1.0);
            let eased = FOCUS_EASING.evaluate(t);

            self.focus_point = anim.start_focus.lerp(anim.target_focus, eased);
            self.distance = anim.start_distance + (anim.target_distance - anim.start_distance) * eased;
            self.bounding_radius = anim.start_bounding_radius
                + (anim.target_bounding_radius - anim.start_bounding_radius) * eased;

            if t >= 1.0 {
                self.focus_animation = None;
            }
            dirty = true;
        }

        if self.damping_enabled {
            let decay = 1.0 - self.damping_factor.clamp(0.0, 0.999);
            if self.rotate_velocity.length_squared() > 1e-8 {
                self.apply_rotation(self.rotate_velocity);
                self.rotate_velocity *= decay;
                dirty = true;
            }
            if self.pan_velocity.length_squared() > 1e-8 {
                self.apply_pan(self.pan_velocity);
                self.pan_velocity *= decay;
                dirty = true;
            }
            if self.zoom_velocity.abs() > 1e-6 {
                self.apply_zoom(self.zoom_velocity);
                self.zoom_velocity *= decay;
                dirty = true;
            }
        }

        if dirty {
            self.update_camera_pos();
            self.update_fog_params();
        }

        dirty
    }

    /// True while a focus animation is in flight.
    pub fn is_animating(&self) -> bool {
        self.focus_animation.is_some()
    }

    /// Cancel any in-flight focus animation. Any direct user input
    /// (rotate/pan/zoom) does this implicitly.
    pub fn cancel_animation(&mut self) {
        self.focus_animation = None;
    }

    /// Underwater fog falloff derived from camera distance and the
    /// loaded model's bounding radius. Fog starts just past the model
    /// and reaches near-total density a few radii beyond it, so the
    /// effect scales with whatever wreck is currently loaded.
    fn update_fog_params(&mut self) {
        let fog_start = self.distance + self.bounding_radius * 0.5;
        let fog_density = 0.5 / self.bounding_radius.max(1.0);

        self.uniform.fog_start = fog_start;
        self.uniform.fog_density = fog_density;
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        -(self.orientation * Vec3::Z)
    }

    fn update_camera_pos(&mut self) {
        self.orientation = self.orientation.normalize();

        let dir = self.orientation * Vec3::Z;

        self.camera.eye = self.focus_point + (dir * self.distance);
        self.camera.target = self.focus_point;
        self.camera.up = self.orientation * Vec3::Y;
    }

    pub fn update_gpu(&mut self, queue: &wgpu::Queue) {
        self.uniform.update_view_proj(&self.camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.aspect = width as f32 / height as f32;
    }

    /// Apply an immediate rotation delta (pointer-drag input), canceling
    /// any focus animation and arming damping decay.
    pub fn rotate(&mut self, delta: Vec2) {
        self.cancel_animation();
        self.apply_rotation(delta);
        self.rotate_velocity = delta;
        self.update_camera_pos();
    }

    fn apply_rotation(&mut self, delta: Vec2) {
        let up = self.orientation * Vec3::Y;
        let horizontal_rotation = Quat::from_axis_angle(up, -delta.x * self.rotate_speed);
        self.orientation = horizontal_rotation * self.orientation;

        let right = self.orientation * Vec3::X;
        let vertical_rotation = Quat::from_axis_angle(right, -delta.y * self.rotate_speed);
        self.orientation = vertical_rotation * self.orientation;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.cancel_animation();
        self.apply_pan(delta);
        self.pan_velocity = delta;
        self.update_camera_pos();
    }

    fn apply_pan(&mut self, delta: Vec2) {
        let right = self.orientation * Vec3::X;
        let up = self.orientation * Vec3::Y;
        let translation = right * (-delta.x * self.pan_speed) + up * (delta.y * self.pan_speed);
        self.focus_point += translation;
    }

    pub fn zoom(&mut self, delta: f32) {
        self.cancel_animation();
        self.apply_zoom(delta);
        self.zoom_velocity = delta;
        self.update_camera_pos();
        self.update_fog_params();
    }

    fn apply_zoom(&mut self, delta: f32) {
        self.distance *= 1.0 - delta * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn set_distance_limits(&mut self, min_distance: f32, max_distance: f32) {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn set_damping(&mut self, enabled: bool, factor: f32) {
        self.damping_enabled = enabled;
        self.damping_factor = factor;
    }

    /// Directly set orbit state (focus point, orientation, distance),
    /// bypassing animation and velocity decay. Used by
    /// [`crate::camera::preservation::PreHmdCameraState::restore`].
    pub fn set_orbit_state(&mut self, focus_point: Vec3, orientation: Quat, distance: f32) {
        self.focus_animation = None;
        self.rotate_velocity = Vec2::ZERO;
        self.pan_velocity = Vec2::ZERO;
        self.zoom_velocity = 0.0;
        self.focus_point = focus_point;
        self.orientation = orientation;
        self.distance = distance;
        self.update_camera_pos();
        self.update_fog_params();
    }

    /// Place the camera at an explicit world-space eye position while
    /// keeping the current focus point, deriving orientation and
    /// distance from the offset. Used to apply a model's configured
    /// desktop initial pose (spec §3 `ModelEntry.initialPositions`),
    /// bypassing animation and velocity decay like
    /// [`Self::set_orbit_state`].
    pub fn set_eye_position(&mut self, eye: Vec3) {
        let offset = eye - self.focus_point;
        let distance = offset.length();
        if distance > 1e-5 {
            self.orientation = Quat::from_rotation_arc(Vec3::Z, offset.normalize());
        }
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self.focus_animation = None;
        self.rotate_velocity = Vec2::ZERO;
        self.pan_velocity = Vec2::ZERO;
        self.zoom_velocity = 0.0;
        self.update_camera_pos();
        self.update_fog_params();
    }

    #[must_use]
    pub fn focus_point(&self) -> Vec3 {
        self.focus_point
    }

    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    #[must_use]
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    #[must_use]
    pub fn damping_enabled(&self) -> bool {
        self.damping_enabled
    }

    /// Calculate fit parameters for the given positions.
    /// Returns (centroid, radius, fit_distance).
    fn calculate_fit_params(&self, positions: &[Vec3]) -> Option<(Vec3, f32, f32)> {
        if positions.is_empty() {
            return None;
        }

        let centroid: Vec3 = positions.iter().copied().sum::<Vec3>() / positions.len() as f32;

        let radius = positions
            .iter()
            .map(|p| (*p - centroid).length())
            .fold(0.0f32, f32::max);

        let fovy_rad = self.camera.fovy.to_radians();
        let fovx_rad = fovy_rad * self.camera.aspect;

        let fit_distance_y = radius / (fovy_rad / 2.0).tan();
        let fit_distance_x = radius / (fovx_rad / 2.0).tan();

        let fit_distance = fit_distance_y.max(fit_distance_x);

        Some((centroid, radius, fit_distance * 1.05))
    }

    /// Adjust camera to fit the given positions instantly (no animation).
    /// Used for the model's initial load.
    pub fn fit_to_positions(&mut self, positions: &[Vec3]) {
        if let Some((centroid, radius, fit_distance)) = self.calculate_fit_params(positions) {
            self.focus_point = centroid;
            self.bounding_radius = radius;
            self.distance = fit_distance.clamp(self.min_distance, self.max_distance);
            self.focus_animation = None;

            self.update_camera_pos();
            self.update_fog_params();
        }
    }

    /// Adjust camera to fit the given positions with the 1000 ms
    /// ease-out-cubic focus animation (double-click focus, model switch).
    pub fn fit_to_positions_animated(&mut self, positions: &[Vec3]) {
        if let Some((centroid, radius, fit_distance)) = self.calculate_fit_params(positions) {
            self.animate_focus_to(
                centroid,
                fit_distance.clamp(self.min_distance, self.max_distance),
                radius,
            );
        }
    }

    /// Start (or replace) an animated transition to the given focus
    /// point, distance, and bounding radius.
    pub fn animate_focus_to(&mut self, target_focus: Vec3, target_distance: f32, target_bounding_radius: f32) {
        self.focus_animation = Some(FocusAnimation {
            start_focus: self.focus_point,
            target_focus,
            start_distance: self.distance,
            target_distance,
            start_bounding_radius: self.bounding_radius,
            target_bounding_radius,
            elapsed_ms: 0.0,
        });
    }

    /// Convert screen delta (pixels) to world-space offset.
    pub fn screen_delta_to_world(&self, delta_x: f32, delta_y: f32) -> Vec3 {
        let scale = self.distance * 0.002;
        let right = self.right();
        let up = self.up();
        right * (delta_x * scale) + up * (-delta_y * scale)
    }

    /// Unproject screen coordinates to a world-space point on a plane at
    /// the given depth, used for measurement-point raycast fallback and
    /// desktop pointer-to-world conversions.
    pub fn screen_to_world_at_depth(
        &self,
        screen_x: f32,
        screen_y: f32,
        screen_width: u32,
        screen_height: u32,
        world_point: Vec3,
    ) -> Vec3 {
        let ndc_x = (2.0 * screen_x / screen_width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen_y / screen_height as f32);

        let to_point = world_point - self.camera.eye;
        let depth = to_point.dot(self.forward());

        let fovy_rad = self.camera.fovy.to_radians();
        let half_height = depth * (fovy_rad / 2.0).tan();
        let half_width = half_height * self.camera.aspect;

        let right = self.right();
        let up = self.up();
        let forward = self.forward();

        let center = self.camera.eye + forward * depth;
        center + right * (ndc_x * half_width) + up * (ndc_y * half_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_animation_duration_matches_spec() {
        assert_eq!(FOCUS_ANIMATION_MS, 1000.0);
    }
}
