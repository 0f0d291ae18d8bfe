//! glTF binary parsing into a [`ModelEntry`] (C5): the model loader
//! adapter. Decompression and vertex (de)quantization are treated as the
//! loader's external concern, not reimplemented here — the `gltf` crate
//! with the `utils` feature gives raw attribute iterators without
//! pulling in its full `import` convenience path (which would also want
//! filesystem/URI resolution this crate does its own fetching for).

use glam::Vec3;

use crate::error::ViewerError;
use crate::model::entry::{MeshPrimitive, ModelEntry, Vertex};

/// Parses already-fetched model bytes into a centered [`ModelEntry`].
/// Kept as a trait (rather than a bare function) so the orchestrator can
/// be exercised in tests against a fake loader that doesn't need real
/// glTF bytes.
pub trait ModelLoader {
    /// # Errors
    ///
    /// Returns [`ViewerError::ModelLoad`] if the bytes are not valid
    /// glTF, contain no embedded binary buffer, or yield no geometry.
    fn parse(&self, bytes: &[u8], source_url: &str) -> Result<ModelEntry, ViewerError>;
}

/// Parses glTF-Binary (`.glb`) models with an embedded `BIN` chunk.
pub struct GltfModelLoader;

impl ModelLoader for GltfModelLoader {
    fn parse(&self, bytes: &[u8], source_url: &str) -> Result<ModelEntry, ViewerError> {
        let gltf = gltf::Gltf::from_slice(bytes)
            .map_err(|e| ViewerError::ModelLoad(format!("{source_url}: {e}")))?;

        let blob = gltf.blob.as_deref();

        let mut primitives = Vec::new();
        for mesh in gltf.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| {
                    if buffer.index() == 0 {
                        blob
                    } else {
                        None
                    }
                });

                let Some(position_iter) = reader.read_positions() else {
                    continue;
                };
                let vertices: Vec<Vertex> = position_iter
                    .map(|p| Vertex {
                        position: Vec3::from_array(p),
                    })
                    .collect();

                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|iter| iter.into_u32().collect())
                    .unwrap_or_else(|| (0..vertices.len() as u32).collect());

                if !vertices.is_empty() {
                    primitives.push(MeshPrimitive { vertices, indices });
                }
            }
        }

        ModelEntry::from_raw(primitives, source_url.to_owned())
            .ok_or_else(|| ViewerError::ModelLoad(format!("{source_url}: no geometry found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLoader {
        entry: ModelEntry,
    }

    impl ModelLoader for FakeLoader {
        fn parse(&self, _bytes: &[u8], _source_url: &str) -> Result<ModelEntry, ViewerError> {
            Ok(self.entry.clone())
        }
    }

    #[test]
    fn fake_loader_round_trips_for_orchestrator_tests() {
        let prim = MeshPrimitive {
            vertices: vec![Vertex {
                position: Vec3::ZERO,
            }],
            indices: vec![0],
        };
        let entry = ModelEntry::from_raw(vec![prim], "fake.glb".to_owned()).unwrap();
        let loader = FakeLoader { entry: entry.clone() };
        let parsed = loader.parse(&[], "fake.glb").unwrap();
        assert_eq!(parsed.source_url, entry.source_url);
    }

    #[test]
    fn parse_rejects_non_gltf_bytes() {
        let loader = GltfModelLoader;
        let result = loader.parse(b"not a glb file", "bad.glb");
        assert!(result.is_err());
    }
}
