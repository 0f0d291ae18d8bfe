// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! An embeddable browser-side 3D viewer for large underwater
//! photogrammetry meshes (glTF shipwreck models), with a desktop orbit
//! mode, a WebXR dive mode, a cross-modal point-to-point measurement
//! tool, and a GPU marine-snow particle field.
//!
//! # Key entry points
//!
//! - [`facade::Viewer`] - the high-level, embeddable façade: configure a
//!   model registry, load/switch/clear models, and subscribe to named
//!   events.
//! - [`scene::Scene`] - the scene graph holding the loaded model and its
//!   measurement/particle helper nodes.
//! - [`config::Config`] - the fully-defaulted, schema-validated
//!   configuration tree.
//! - [`vr::VrCoordinator`] - WebXR session lifecycle, locomotion,
//!   teleport, and comfort settings.
//!
//! # Architecture
//!
//! Each subsystem (camera, model loader, particle field, measurement,
//! VR coordinator) is an independently testable component communicating
//! with the rest of the crate only through explicit references and the
//! [`event_bus::EventBus`] — there is no global mutable state. The
//! viewer orchestrator (`viewer` feature) composes them into a per-tick
//! draw loop; the façade composes the orchestrator into a multi-model,
//! host-facing API.
//!
//! For the desktop preview binary, see `src/main.rs` (`binary` feature).

/// Desktop orbit camera: projection, orbit controls, animated focus
/// transitions, and HMD-session state preservation.
pub mod camera;
/// Schema-validated, fully-defaulted configuration tree.
pub mod config;
/// Crate-level error types.
pub mod error;
/// Named pub/sub event bus.
pub mod event_bus;
/// GPU resource management utilities.
pub mod gpu;
/// Cross-modal point-to-point measurement subsystem.
pub mod measurement;
/// glTF model loading, centering, and GPU draw path.
pub mod model;
/// Adaptive GPU marine-snow particle field.
pub mod particles;
/// Scene graph: node arena, background color, fog parameters.
pub mod scene;
/// Shared math/timing/easing utilities.
pub mod util;
/// WebXR VR coordinator: session lifecycle, locomotion, comfort.
pub mod vr;

/// High-level embeddable façade: multi-model registry and named event
/// surface for a host application.
pub mod facade;
/// Viewer orchestrator (C9) driving the per-tick render loop. The
/// native winit preview window is additionally available under the
/// `viewer` feature.
pub mod viewer;

pub use config::Config;
pub use error::ViewerError;
pub use event_bus::{EventBus, ListenerId};
pub use facade::{Viewer, ViewerBuilder};
