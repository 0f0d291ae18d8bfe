//! Desktop orbit camera (C4): projection, orbit controls, animated focus
//! transitions, and HMD-session state preservation.

/// Orbital camera controller: rotation, pan, zoom, animated focus.
pub mod controller;
/// Core perspective camera and its GPU uniform buffer layout.
pub mod core;
/// Capture/restore of desktop orbit-camera state across an HMD session.
pub mod preservation;

pub use controller::CameraController;
pub use core::{Camera, CameraUniform};
pub use preservation::PreHmdCameraState;
