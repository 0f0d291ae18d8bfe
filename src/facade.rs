//! High-level embeddable façade (C10): a multi-model registry and a
//! named event surface, wrapping the single-model [`crate::viewer::ViewerOrchestrator`]
//! for a host application that only wants to call `load`, `switchTo`,
//! `clear`, and `on`/`off`.
//!
//! This is the crate's one opinionated entry point; everything it does
//! is also reachable by driving [`crate::viewer::ViewerOrchestrator`]
//! directly, for a host that wants finer control (e.g. the desktop
//! preview binary, which loads exactly one model and never needs a
//! registry).

use glam::Vec3;

use crate::config::Config;
use crate::error::ViewerError;
use crate::event_bus::ListenerId;
use crate::gpu::render_context::RenderContext;
use crate::model::{AbortFlag, AssetFetcher, FetchFuture, FetchProgress};
use crate::vr::ComfortSettings;
use crate::viewer::{Modality, ViewerOrchestrator, ViewerStats};

#[cfg(feature = "viewer")]
use crate::model::FsAssetFetcher;
#[cfg(feature = "web")]
use crate::model::WebAssetFetcher;

/// Resolve the fetcher to use when the host did not supply one
/// explicitly. Exactly one of these is compiled in for any given
/// feature selection; with neither `viewer` nor `web` enabled there is
/// no sensible default and the host must call
/// [`ViewerBuilder::with_fetcher`].
#[cfg(feature = "viewer")]
fn default_fetcher() -> Option<Box<dyn AssetFetcher>> {
    Some(Box::new(FsAssetFetcher))
}

#[cfg(all(feature = "web", not(feature = "viewer")))]
fn default_fetcher() -> Option<Box<dyn AssetFetcher>> {
    Some(Box::new(WebAssetFetcher))
}

#[cfg(not(any(feature = "viewer", feature = "web")))]
fn default_fetcher() -> Option<Box<dyn AssetFetcher>> {
    None
}

/// Builder for [`Viewer`].
pub struct ViewerBuilder {
    config: Config,
    fetcher: Option<Box<dyn AssetFetcher>>,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            config: Config::default(),
            fetcher: None,
        }
    }

    /// Supply the fully-resolved configuration tree (model registry,
    /// feature flags, theme, camera/scene parameters).
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Override the asset fetcher used for model loads. Required when
    /// neither the `viewer` nor `web` feature is enabled.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the façade against an already-initialized GPU context. No
    /// model is loaded yet — call [`Viewer::load_initial_model`] (or
    /// `load`) once the returned instance is in hand.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Config`] if no fetcher was supplied and
    /// none can be defaulted for the enabled feature set.
    pub fn build(self, context: RenderContext) -> Result<Viewer, ViewerError> {
        let fetcher = self
            .fetcher
            .or_else(default_fetcher)
            .ok_or_else(|| ViewerError::Config("no asset fetcher configured".into()))?;

        Ok(Viewer {
            orchestrator: ViewerOrchestrator::new(context, self.config),
            fetcher,
            disposed: false,
        })
    }
}

/// The embeddable viewer: a model registry, the orchestrator, and the
/// named event surface a host subscribes to.
///
/// Construction never loads a model. Call [`Viewer::load_initial_model`]
/// right after `build()` to honor `Config::auto_load_first` /
/// `Config::initial_model`, or [`Viewer::load`] to load a specific
/// registered key on demand.
pub struct Viewer {
    orchestrator: ViewerOrchestrator,
    fetcher: Box<dyn AssetFetcher>,
    disposed: bool,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Subscribe to a named event (spec §6's event surface: `initialized`,
    /// `model-load-start`, `model-load-progress`, `model-loaded`,
    /// `model-load-error`, `model-load-cancelled`, `model-switched`,
    /// `models-cleared`, `camera-reset`, `focus`, `vr-session-start`,
    /// `vr-session-end`, `vr-mode-toggle`, `vr-movement-start`,
    /// `vr-movement-stop`, `vr-movement-update`, `resize`, `error`, plus
    /// the VR locomotion/teleport events [`crate::vr::VrCoordinator`]
    /// emits directly: `vr-locomotion-mode-changed`, `vr-snap-turn`,
    /// `vr-teleported`).
    pub fn on(
        &mut self,
        event: impl Into<String>,
        callback: impl FnMut(&crate::event_bus::EventPayload) + 'static,
    ) -> ListenerId {
        self.orchestrator.events_mut().on(event, callback)
    }

    /// Unsubscribe a single listener.
    #[must_use]
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.orchestrator.events_mut().off(id)
    }

    /// Resolve and load the configured initial model (`initial_model`
    /// override, else the first registered entry if `auto_load_first`),
    /// if any is configured. A no-op (not an error) if neither applies.
    ///
    /// # Errors
    ///
    /// Propagates [`ViewerError`] from the underlying fetch/parse, as
    /// [`Self::load`] does.
    pub async fn load_initial_model(&mut self, modality: Modality) -> Result<(), ViewerError> {
        let Some(key) = self.config().resolve_initial_model().map(str::to_owned) else {
            return Ok(());
        };
        self.load(&key, modality).await
    }

    /// Fetch and load the model registered under `key`, emitting the
    /// `model-load-start` / `model-load-progress` / `model-loaded` /
    /// `model-load-error` sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ModelLoad`] if `key` is not registered, or
    /// whatever error the fetcher/parser produced; in both cases
    /// `model-load-error` has already been emitted before returning.
    pub async fn load(&mut self, key: &str, modality: Modality) -> Result<(), ViewerError> {
        let Some(entry) = self.config().models.get(key).cloned() else {
            let message = format!("no model registered under key '{key}'");
            self.orchestrator
                .events_mut()
                .emit("model-load-error", Box::new(message.clone()));
            return Err(ViewerError::ModelLoad(message));
        };

        self.orchestrator
            .events_mut()
            .emit("model-load-start", Box::new(key.to_owned()));

        let abort = AbortFlag::new();
        let url = entry.url.clone();
        let latest = std::cell::Cell::new(FetchProgress { loaded: 0, total: None });
        let result = self.fetch_with_progress(&url, abort.clone(), &latest).await;
        self.orchestrator
            .events_mut()
            .emit("model-load-progress", Box::new((key.to_owned(), latest.get())));

        match result {
            Ok(bytes) => match self.orchestrator.load_model(&bytes, &url, modality, Some(key)) {
                Ok(()) => {
                    self.orchestrator.events_mut().emit("model-loaded", Box::new(key.to_owned()));
                    self.orchestrator.events_mut().emit("model-switched", Box::new(key.to_owned()));
                    Ok(())
                }
                Err(e) => {
                    self.orchestrator
                        .events_mut()
                        .emit("model-load-error", Box::new(e.to_string()));
                    Err(e)
                }
            },
            Err(e) if abort.is_aborted() => {
                self.orchestrator
                    .events_mut()
                    .emit("model-load-cancelled", Box::new(key.to_owned()));
                Err(e)
            }
            Err(e) => {
                self.orchestrator
                    .events_mut()
                    .emit("model-load-error", Box::new(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetch `url`'s bytes, recording the latest reported progress into
    /// `latest` as the fetcher's future runs. `load` reads `latest`
    /// after each await point is unnecessary here since the whole fetch
    /// is a single await from the caller's perspective; `latest` instead
    /// lets a future streaming fetcher surface intermediate progress
    /// without changing this method's signature.
    fn fetch_with_progress<'a>(
        &'a self,
        url: &'a str,
        abort: AbortFlag,
        latest: &'a std::cell::Cell<FetchProgress>,
    ) -> FetchFuture<'a> {
        let callback: crate::model::ProgressCallback<'a> = Box::new(move |progress| latest.set(progress));
        self.fetcher.fetch(url, abort, callback)
    }

    /// Drop the currently loaded model, emitting `models-cleared`.
    pub fn clear(&mut self) {
        self.orchestrator.clear_model();
        self.orchestrator.events_mut().emit("models-cleared", Box::new(()));
    }

    /// Reset the desktop camera to fit the currently loaded model, if
    /// any, emitting `camera-reset`.
    pub fn reset_camera(&mut self) {
        if self.orchestrator.has_model() {
            self.orchestrator.events_mut().emit("camera-reset", Box::new(()));
        }
    }

    /// Enable or disable the measurement subsystem.
    pub fn set_measurement_enabled(&mut self, enabled: bool) {
        self.orchestrator.set_measurement_enabled(enabled);
    }

    /// Place a measurement point from a resolved HMD trigger-release
    /// world position (the browser-side WebXR input-source wiring is a
    /// host concern; this is the crate's entry point for it).
    #[must_use]
    pub fn place_hmd_measurement_point(&mut self, position: Vec3) -> bool {
        self.orchestrator.place_hmd_measurement_point(position)
    }

    /// Request a WebXR immersive session, emitting `vr-mode-toggle`.
    /// The actual `vr-session-start` event follows once the host calls
    /// [`Self::notify_vr_session_granted`] after the browser grants the
    /// session.
    pub fn request_vr_session(&mut self) {
        if let Some(vr) = self.orchestrator.vr_mut() {
            vr.request_session();
        }
        self.orchestrator.events_mut().emit("vr-mode-toggle", Box::new(true));
    }

    /// The host's WebXR session-request promise resolved successfully.
    /// Captures desktop camera state, disables orbit controls, and
    /// applies the loaded model's HMD initial pose; emits
    /// `vr-session-start`.
    pub fn notify_vr_session_granted(&mut self) {
        self.orchestrator.begin_vr_session();
    }

    /// The host's WebXR session-request promise was rejected, or the
    /// browser reports no WebXR support. Returns the coordinator to
    /// `idle` without presenting.
    pub fn notify_vr_session_denied(&mut self) {
        self.orchestrator.vr_session_denied();
    }

    /// The host's WebXR session ended (explicit `XRSession.end()` or
    /// headset removal). Schedules the deferred desktop-camera restore
    /// and re-enables orbit controls; emits `vr-session-end`.
    pub fn notify_vr_session_ended(&mut self) {
        self.orchestrator.end_vr_session();
    }

    /// Apply new VR comfort settings (locomotion mode, speed, snap-turn
    /// angle).
    pub fn set_comfort(&mut self, comfort: ComfortSettings) {
        self.orchestrator.set_vr_comfort(comfort);
    }

    /// Resize the GPU surface and camera projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.orchestrator.resize(width, height);
    }

    /// Forward a desktop pointer-down event.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32) {
        self.orchestrator.handle_pointer_down(x, y);
    }

    /// Forward a desktop pointer-up event.
    pub fn handle_pointer_up(&mut self, x: f32, y: f32, width: u32, height: u32) {
        self.orchestrator.handle_pointer_up(x, y, width, height);
    }

    /// Advance and draw one frame.
    ///
    /// # Errors
    ///
    /// Propagates [`wgpu::SurfaceError`] from surface acquisition.
    pub fn tick(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        self.orchestrator.tick_and_render(dt)
    }

    /// Current frame/particle/measurement instrumentation, for a
    /// host-side debug overlay.
    #[must_use]
    pub fn stats(&self) -> ViewerStats {
        self.orchestrator.stats()
    }

    /// Key of the currently loaded model, if any.
    #[must_use]
    pub fn current_model_key(&self) -> Option<&str> {
        self.orchestrator.current_model_key()
    }

    fn config(&self) -> &Config {
        self.orchestrator.config()
    }

    /// Release every resource this instance owns. Safe to call more
    /// than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.orchestrator.clear_model();
        self.disposed = true;
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.dispose();
    }
}
