//! Viewer orchestrator (C9): owns the scene, camera, model renderer, and
//! the optional particle/measurement/VR subsystems, and drives the
//! per-tick order (`vr.tick -> camera.update -> render`) plus the
//! mode-transition invariants around a model load or an HMD session
//! boundary.
//!
//! [`ViewerOrchestrator`] has no dependency on any windowing toolkit; a
//! browser embedder drives it directly (through [`crate::facade::Viewer`])
//! from `requestAnimationFrame`. The `viewer` feature additionally wraps
//! it in a winit [`ApplicationHandler`] for the desktop preview binary
//! (`src/main.rs`, `binary` feature).

use glam::{Mat4, Vec3};
use web_time::Instant;

use crate::camera::CameraController;
use crate::config::Config;
use crate::error::ViewerError;
use crate::event_bus::EventBus;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::RenderTarget;
use crate::measurement::raycast::{cast_ray_against_model, PointerAction, PointerGesture, Ray};
use crate::measurement::MeasurementSubsystem;
use crate::model::render::DEPTH_FORMAT;
use crate::model::{GltfModelLoader, ModelEntry, ModelLoader, ModelRenderer};
use crate::particles::ParticleEngine;
use crate::scene::{ObjectRole, Scene, SceneNode};
use crate::util::deferred::DeferredQueue;
use crate::util::frame_timing::FrameTiming;
use crate::vr::audio::NullAudioSink;
use crate::vr::xr_backend::NullXrBackend;
use crate::vr::VrCoordinator;

/// Which modality a model load (or initial pose application) targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Desktop orbit camera.
    Desktop,
    /// WebXR HMD rig.
    Hmd,
}

/// Point-in-time instrumentation for a host-side debug overlay. Purely
/// additive: no behavior in the crate depends on these numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerStats {
    /// Smoothed frames-per-second.
    pub fps: f32,
    /// Number of particles currently simulated (0 if the particle field
    /// is disabled or no model has been loaded yet).
    pub particle_count: usize,
    /// Number of placed measurement points (0, 1, or 2).
    pub measurement_point_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingClick {
    token: u64,
    position: Vec3,
}

/// Owns every per-model/per-tick subsystem and the render loop itself.
pub struct ViewerOrchestrator {
    context: RenderContext,
    depth: RenderTarget,
    scene: Scene,
    camera: CameraController,
    model_renderer: ModelRenderer,
    particles: Option<ParticleEngine>,
    measurement: Option<MeasurementSubsystem>,
    vr: Option<VrCoordinator>,
    events: EventBus,
    frame_timing: FrameTiming,
    pointer: PointerGesture,
    pending_clicks: DeferredQueue<PendingClick>,
    model: Option<ModelEntry>,
    loader: GltfModelLoader,
    config: Config,
    current_model_key: Option<String>,
    hmd_initial_pose: Option<Vec3>,
    desktop_initial_pose: Option<Vec3>,
    desktop_pose_reapply: DeferredQueue<()>,
}

impl ViewerOrchestrator {
    /// Build every subsystem named in `config.features` against an
    /// already-initialized GPU context. No model is loaded yet.
    #[must_use]
    pub fn new(context: RenderContext, config: Config) -> Self {
        let camera = build_camera(&context, &config);
        let model_renderer = ModelRenderer::new(&context, &camera.layout);
        let measurement = config
            .features
            .measurement
            .then(|| MeasurementSubsystem::new(config.show_measurement_labels));
        let vr = config.features.hmd.then(VrCoordinator::new);
        let depth = RenderTarget::new(&context.device, context.render_width(), context.render_height(), DEPTH_FORMAT);

        Self {
            scene: Scene::new(&config.scene),
            camera,
            model_renderer,
            particles: None,
            measurement,
            vr,
            events: EventBus::new(),
            frame_timing: FrameTiming::new(60),
            pointer: PointerGesture::new(),
            pending_clicks: DeferredQueue::new(),
            model: None,
            loader: GltfModelLoader,
            current_model_key: None,
            hmd_initial_pose: None,
            desktop_initial_pose: None,
            desktop_pose_reapply: DeferredQueue::new(),
            depth,
            context,
            config,
        }
    }

    /// Mutable access to the event bus, for the façade's `on`/`off`
    /// wiring and for hosts driving the orchestrator directly.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Current per-frame instrumentation.
    #[must_use]
    pub fn stats(&self) -> ViewerStats {
        ViewerStats {
            fps: self.frame_timing.fps(),
            particle_count: self.particles.as_ref().map_or(0, ParticleEngine::particle_count),
            measurement_point_count: self.measurement.as_ref().map_or(0, MeasurementSubsystem::point_count),
        }
    }

    /// Whether a model is currently loaded.
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// The VR coordinator, for the façade to drive session requests.
    #[must_use]
    pub fn vr_mut(&mut self) -> Option<&mut VrCoordinator> {
        self.vr.as_mut()
    }

    /// Apply new VR comfort settings, notifying the event bus if the
    /// locomotion mode changed. A no-op if the HMD feature is disabled.
    pub fn set_vr_comfort(&mut self, comfort: crate::vr::ComfortSettings) {
        if let Some(vr) = &mut self.vr {
            vr.set_comfort(comfort, &mut self.events);
        }
    }

    /// The browser granted a previously requested WebXR session.
    /// Captures desktop camera state, disables orbit controls, and
    /// applies the loaded model's HMD initial pose, if configured
    /// (spec §4.1 `idle -> presenting`). A no-op if HMD is disabled.
    pub fn begin_vr_session(&mut self) {
        let Self { vr: Some(vr), camera, events, hmd_initial_pose, .. } = self else {
            return;
        };
        let mut sink = NullAudioSink;
        vr.begin_session(camera, *hmd_initial_pose, &mut sink, events);
    }

    /// The browser denied or failed to grant a requested session.
    pub fn vr_session_denied(&mut self) {
        if let Some(vr) = &mut self.vr {
            vr.session_request_failed();
        }
    }

    /// The WebXR session ended, whether by explicit `XRSession.end()`
    /// or headset removal. Schedules the deferred desktop-camera
    /// restore, and, if the model defines a desktop initial pose,
    /// reapplies it immediately and again 50 ms later to defeat the
    /// race with the rig reset (spec §4.1 `presenting -> idle`).
    pub fn end_vr_session(&mut self) {
        let now = Instant::now();
        let Self { vr: Some(vr), events, .. } = self else {
            return;
        };
        let mut sink = NullAudioSink;
        vr.end_session(&mut sink, events, now);

        if let Some(eye) = self.desktop_initial_pose {
            self.camera.set_eye_position(eye);
            self.desktop_pose_reapply.schedule(crate::vr::core::DESKTOP_POSE_REAPPLY_DELAY_MS, (), now);
        }
    }

    /// The resolved configuration this orchestrator was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enable or disable the measurement subsystem, clearing any
    /// in-progress measurement if it is being disabled.
    pub fn set_measurement_enabled(&mut self, enabled: bool) {
        if let Some(measurement) = &mut self.measurement {
            measurement.set_enabled(enabled, &mut self.scene);
        }
    }

    /// Place a measurement point from a resolved HMD trigger-release
    /// world position. Per the resolved Open Question, this never
    /// implicitly enables measurement — the host must have already
    /// turned it on.
    #[must_use]
    pub fn place_hmd_measurement_point(&mut self, position: Vec3) -> bool {
        let presenting = self.vr.as_ref().is_some_and(VrCoordinator::is_presenting);
        if !presenting {
            return false;
        }
        self.measurement
            .as_mut()
            .is_some_and(|m| m.is_enabled() && m.place_hmd(&mut self.scene, position, Instant::now()))
    }

    /// Parse and load a glTF-binary model, applying the mode-transition
    /// invariants: clear any in-progress measurement, reframe the camera
    /// (instantly on the very first load, animated thereafter), and
    /// refit the particle field to the new bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ModelLoad`] if `bytes` do not parse.
    pub fn load_model(&mut self, bytes: &[u8], source_url: &str, modality: Modality, key: Option<&str>) -> Result<(), ViewerError> {
        let entry = self.loader.parse(bytes, source_url)?;
        let registered = key.and_then(|k| self.config.models.get(k));
        self.hmd_initial_pose = registered.and_then(|e| e.initial_position("hmd"));
        self.desktop_initial_pose = registered.and_then(|e| e.initial_position("desktop"));
        self.apply_loaded_model(entry, modality);
        self.current_model_key = key.map(str::to_owned);
        Ok(())
    }

    fn apply_loaded_model(&mut self, entry: ModelEntry, modality: Modality) {
        let is_first_load = self.model.is_none();

        if let Some(measurement) = &mut self.measurement {
            measurement.clear(&mut self.scene);
        }

        if let Some(root) = self.scene.model_root() {
            let _ = self.scene.remove(root);
        }
        let root = self.scene.insert(SceneNode::new(ObjectRole::Model));
        self.scene.set_model_root(Some(root));

        self.model_renderer.load(&self.context, &entry);
        self.model_renderer.set_fog_color(self.scene.background_color);

        let positions: Vec<Vec3> = entry.all_positions().collect();
        match (modality, self.desktop_initial_pose) {
            (Modality::Desktop, Some(eye)) => {
                self.camera.fit_to_positions(&positions);
                self.camera.set_eye_position(eye);
            }
            (Modality::Desktop, None) if is_first_load => self.camera.fit_to_positions(&positions),
            (Modality::Desktop, None) => self.camera.fit_to_positions_animated(&positions),
            (Modality::Hmd, _) => {}
        }

        if self.config.features.dive_system {
            if let Some(particles) = &mut self.particles {
                particles.update_for_model(&self.context.queue, &entry.bounding_box);
            } else {
                self.particles = Some(ParticleEngine::new(&self.context, &self.camera.layout, &entry.bounding_box));
            }
        }

        self.model = Some(entry);
    }

    /// Drop the currently loaded model (and any in-progress measurement),
    /// without touching the particle field or camera. Idempotent.
    pub fn clear_model(&mut self) {
        if let Some(measurement) = &mut self.measurement {
            measurement.clear(&mut self.scene);
        }
        if let Some(root) = self.scene.model_root() {
            let _ = self.scene.remove(root);
        }
        self.scene.set_model_root(None);
        self.model_renderer.clear();
        self.model = None;
        self.current_model_key = None;
    }

    /// Key of the currently loaded model in the host's registry, if any.
    #[must_use]
    pub fn current_model_key(&self) -> Option<&str> {
        self.current_model_key.as_deref()
    }

    /// Reconfigure the GPU surface and camera projection for a new
    /// canvas/window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.camera.resize(width, height);
        self.depth = RenderTarget::new(&self.context.device, self.context.render_width(), self.context.render_height(), DEPTH_FORMAT);
        self.events.emit("resize", Box::new((width, height)));
    }

    /// Record a pointer-down position for drag/double-click
    /// classification.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32) {
        self.pointer.on_pointer_down((x, y));
    }

    /// Classify a pointer-up event and route it to the measurement
    /// subsystem (if it captures the click) or the camera's
    /// double-click focus animation.
    pub fn handle_pointer_up(&mut self, x: f32, y: f32, width: u32, height: u32) {
        let now = Instant::now();
        match self.pointer.on_pointer_up((x, y), now) {
            PointerAction::Drag => {}
            PointerAction::DoubleClick => self.handle_double_click(x, y, width, height),
            PointerAction::PendingClick { token } => {
                let measurement_enabled = self.measurement.as_ref().is_some_and(MeasurementSubsystem::is_enabled);
                if measurement_enabled {
                    if let Some(point) = self.raycast_model(x, y, width, height) {
                        self.pending_clicks.schedule(
                            crate::measurement::raycast::DOUBLE_CLICK_MS,
                            PendingClick { token, position: point },
                            now,
                        );
                    }
                }
            }
        }
    }

    /// Measurement captures the double-click, stopping it from also
    /// re-centering the camera; otherwise it re-centers the camera's
    /// focus animation on the point under the cursor.
    fn handle_double_click(&mut self, x: f32, y: f32, width: u32, height: u32) {
        if self.measurement.as_ref().is_some_and(MeasurementSubsystem::is_enabled) {
            return;
        }
        if let Some(point) = self.raycast_model(x, y, width, height) {
            let radius = self.model.as_ref().map_or(10.0, |m| m.bounding_box.bounding_radius());
            self.camera.animate_focus_to(point, self.camera.distance(), radius);
        }
    }

    fn raycast_model(&self, x: f32, y: f32, width: u32, height: u32) -> Option<Vec3> {
        let model = self.model.as_ref()?;
        let ray = pointer_ray(&self.camera, x, y, width, height);
        cast_ray_against_model(&ray, model, Mat4::IDENTITY).map(|hit| hit.point)
    }

    /// Advance every subsystem by `dt` seconds and draw one frame.
    ///
    /// # Errors
    ///
    /// Propagates [`wgpu::SurfaceError`] from surface acquisition.
    pub fn tick_and_render(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        if let Some(vr) = &mut self.vr {
            let dt_ms = (dt * 1000.0) as u64;
            let mut sink = NullAudioSink;
            vr.tick(dt, dt_ms, &NullXrBackend, &mut sink, &mut self.events);
            vr.drain_deferred(&mut self.camera, now);
        }
        if let Some(eye) = self.desktop_initial_pose {
            if !self.desktop_pose_reapply.drain_due(now).is_empty() {
                self.camera.set_eye_position(eye);
            }
        }

        let _ = self.camera.update_animation(dt);
        self.camera.update_gpu(&self.context.queue);

        if let Some(particles) = &mut self.particles {
            particles.tick(dt, &self.context.queue);
        }

        let now = Instant::now();
        for pending in self.pending_clicks.drain_due(now) {
            if self.pointer.confirm_pending(pending.token) {
                if let Some(measurement) = &mut self.measurement {
                    measurement.place_desktop(&mut self.scene, pending.position);
                }
            }
        }

        self.render()?;
        self.frame_timing.end_frame();
        Ok(())
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_encoder();

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Wreck Viewer Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(self.scene.background_color[0]),
                            g: f64::from(self.scene.background_color[1]),
                            b: f64::from(self.scene.background_color[2]),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            self.model_renderer.render(&mut pass, &self.camera.bind_group);
            if let Some(particles) = &self.particles {
                particles.render(&mut pass, &self.camera.bind_group);
            }
        }

        self.context.submit(encoder);
        frame.present();
        Ok(())
    }
}

fn build_camera(context: &RenderContext, config: &Config) -> CameraController {
    let mut camera = CameraController::new(context);
    camera.camera.fovy = config.camera.fov_degrees;
    camera.camera.znear = config.camera.near;
    camera.camera.zfar = config.camera.far;
    camera.set_distance_limits(config.camera.desktop.min_distance, config.camera.desktop.max_distance);
    camera.set_damping(true, config.camera.desktop.damping_factor);
    camera
}

fn pointer_ray(camera: &CameraController, x: f32, y: f32, width: u32, height: u32) -> Ray {
    let ndc_x = (2.0 * x / width as f32) - 1.0;
    let ndc_y = 1.0 - (2.0 * y / height as f32);
    let fovy_rad = camera.camera.fovy.to_radians();
    let half_height = (fovy_rad * 0.5).tan();
    let half_width = half_height * camera.camera.aspect;
    let direction =
        (camera.forward() + camera.right() * (ndc_x * half_width) + camera.up() * (ndc_y * half_height)).normalize_or_zero();
    Ray {
        origin: camera.camera.eye,
        direction,
    }
}

#[cfg(feature = "viewer")]
mod desktop_preview {
    use std::sync::Arc;

    use winit::application::ApplicationHandler;
    use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
    use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
    use winit::window::{Window, WindowId};

    use super::{Modality, ViewerOrchestrator};
    use crate::config::Config;
    use crate::error::ViewerError;
    use crate::gpu::render_context::RenderContext;

    /// Fluent builder for [`DesktopPreview`], the native winit-backed
    /// preview of the embeddable viewer.
    pub struct DesktopPreviewBuilder {
        model_path: Option<String>,
        config: Config,
        title: String,
    }

    impl DesktopPreviewBuilder {
        fn new() -> Self {
            Self {
                model_path: None,
                config: Config::default(),
                title: "Wreck Viewer".into(),
            }
        }

        /// Load a `.glb` file from disk on startup.
        #[must_use]
        pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
            self.model_path = Some(path.into());
            self
        }

        /// Override the default configuration.
        #[must_use]
        pub fn with_config(mut self, config: Config) -> Self {
            self.config = config;
            self
        }

        /// Set the window title.
        #[must_use]
        pub fn with_title(mut self, title: impl Into<String>) -> Self {
            self.title = title.into();
            self
        }

        /// Consume the builder and produce a [`DesktopPreview`].
        #[must_use]
        pub fn build(self) -> DesktopPreview {
            DesktopPreview {
                model_path: self.model_path,
                config: self.config,
                title: self.title,
            }
        }
    }

    /// A standalone window that previews the viewer outside a browser
    /// host, for local development.
    pub struct DesktopPreview {
        model_path: Option<String>,
        config: Config,
        title: String,
    }

    impl DesktopPreview {
        /// Start a new builder.
        #[must_use]
        pub fn builder() -> DesktopPreviewBuilder {
            DesktopPreviewBuilder::new()
        }

        /// Open the window and run the event loop. Blocks until closed.
        ///
        /// # Errors
        ///
        /// Returns [`ViewerError::Viewer`] if the event loop fails to
        /// initialize.
        pub fn run(self) -> Result<(), ViewerError> {
            let event_loop = EventLoop::new().map_err(|e| ViewerError::Viewer(e.to_string()))?;
            event_loop.set_control_flow(ControlFlow::Poll);

            let mut app = PreviewApp {
                window: None,
                orchestrator: None,
                last_frame: web_time::Instant::now(),
                last_cursor: None,
                model_path: self.model_path,
                config: Some(self.config),
                title: self.title,
            };

            event_loop.run_app(&mut app).map_err(|e| ViewerError::Viewer(e.to_string()))
        }
    }

    struct PreviewApp {
        window: Option<Arc<Window>>,
        orchestrator: Option<ViewerOrchestrator>,
        last_frame: web_time::Instant,
        last_cursor: Option<(f64, f64)>,
        model_path: Option<String>,
        config: Option<Config>,
        title: String,
    }

    impl PreviewApp {
        fn window_size(&self) -> (u32, u32) {
            self.window.as_ref().map_or((1, 1), |w| {
                let size = w.inner_size();
                (size.width.max(1), size.height.max(1))
            })
        }
    }

    impl ApplicationHandler for PreviewApp {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }

            let attrs = Window::default_attributes().with_title(&self.title);
            let window = match event_loop.create_window(attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

            let size = window.inner_size();
            let context = match pollster::block_on(RenderContext::new(window.clone(), (size.width.max(1), size.height.max(1)))) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("failed to initialize GPU context: {e}");
                    event_loop.exit();
                    return;
                }
            };

            let config = self.config.take().unwrap_or_default();
            let mut orchestrator = ViewerOrchestrator::new(context, config);

            if let Some(path) = &self.model_path {
                match std::fs::read(path) {
                    Ok(bytes) => {
                        if let Err(e) = orchestrator.load_model(&bytes, path, Modality::Desktop, None) {
                            log::error!("failed to load {path}: {e}");
                        }
                    }
                    Err(e) => log::error!("failed to read {path}: {e}"),
                }
            }

            window.request_redraw();
            self.window = Some(window);
            self.orchestrator = Some(orchestrator);
        }

        fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            if matches!(event, WindowEvent::CloseRequested) {
                event_loop.exit();
                return;
            }

            let (Some(window), Some(orchestrator)) = (&self.window, &mut self.orchestrator) else {
                return;
            };

            match event {
                WindowEvent::Resized(size) => orchestrator.resize(size.width, size.height),
                WindowEvent::RedrawRequested => {
                    let now = web_time::Instant::now();
                    let dt = now.duration_since(self.last_frame).as_secs_f32();
                    self.last_frame = now;
                    match orchestrator.tick_and_render(dt) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                            let size = window.inner_size();
                            orchestrator.resize(size.width, size.height);
                        }
                        Err(e) => log::error!("render error: {e}"),
                    }
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        if orchestrator.camera.mouse_pressed {
                            let delta = glam::Vec2::new((position.x - last_x) as f32, (position.y - last_y) as f32);
                            if orchestrator.camera.shift_pressed {
                                orchestrator.camera.pan(delta);
                            } else {
                                orchestrator.camera.rotate(delta);
                            }
                        }
                    }
                    self.last_cursor = Some((position.x, position.y));
                }
                WindowEvent::MouseInput { button: MouseButton::Left, state, .. } => {
                    let (width, height) = self.window_size();
                    let (x, y) = self.last_cursor.unwrap_or_default();
                    #[allow(clippy::cast_possible_truncation)]
                    let (x, y) = (x as f32, y as f32);
                    orchestrator.camera.mouse_pressed = state == ElementState::Pressed;
                    if state == ElementState::Pressed {
                        orchestrator.handle_pointer_down(x, y);
                    } else {
                        orchestrator.handle_pointer_up(x, y, width, height);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    #[allow(clippy::cast_possible_truncation)]
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                    };
                    orchestrator.camera.zoom(scroll);
                }
                WindowEvent::ModifiersChanged(modifiers) => {
                    orchestrator.camera.shift_pressed = modifiers.state().shift_key();
                }
                _ => {}
            }
        }
    }
}

#[cfg(feature = "viewer")]
pub use desktop_preview::{DesktopPreview, DesktopPreviewBuilder};
