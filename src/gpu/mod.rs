//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization and the small set of shared
//! boilerplate helpers (bind-group-layout entries, samplers) used by the
//! particle engine's point-sprite pipeline.

/// Shared wgpu boilerplate helpers for building render pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Framework-agnostic render-target texture abstraction.
pub mod texture;
