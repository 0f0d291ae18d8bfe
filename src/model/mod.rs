//! Model loader adapter (C5): turns fetched glTF bytes into a centered
//! [`ModelEntry`] with a computed bounding volume, and the async fetch
//! abstraction that gets those bytes in the first place.

mod entry;
mod fetch;
mod loader;
/// GPU draw path for a loaded model (vertex/index buffers, flat-shaded
/// mesh pipeline, shared transform uniform).
pub mod render;

pub use entry::{BoundingBox, MeshPrimitive, ModelEntry, Vertex};
pub use fetch::{AbortFlag, AssetFetcher, FetchFuture, FetchProgress, ProgressCallback};
#[cfg(feature = "viewer")]
pub use fetch::FsAssetFetcher;
#[cfg(feature = "web")]
pub use fetch::WebAssetFetcher;
pub use loader::{GltfModelLoader, ModelLoader};
pub use render::ModelRenderer;
