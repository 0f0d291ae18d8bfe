//! Asset fetching abstraction and cooperative cancellation.
//!
//! Model loads run as futures against a host-provided fetch mechanism
//! (the browser `fetch` API in `web` builds, plain file I/O for the
//! desktop preview binary) and are cancellable via an [`AbortFlag`] —
//! the simplest correct primitive for a single-threaded consumer
//! checking between awaited chunks, using a plain shared flag rather
//! than a cancellation-token crate.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ViewerError;

#[cfg(feature = "web")]
use wasm_bindgen::JsCast;

/// Shared, cloneable cancellation flag for one in-flight model load.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Download progress, mirroring the façade's
/// `model-load-progress({url, progress:{loaded,total}})` event payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Per-chunk progress callback.
pub type ProgressCallback<'a> = Box<dyn FnMut(FetchProgress) + 'a>;

/// Boxed future type used by [`AssetFetcher::fetch`] so the trait stays
/// object-safe across the `web`/`binary` feature split without an
/// `async_trait` dependency.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, ViewerError>> + 'a>>;

/// Host-provided mechanism for retrieving a model's raw bytes.
pub trait AssetFetcher {
    /// Fetch `url`, reporting progress via `on_progress` and checking
    /// `abort` between any internal suspension points. Returns
    /// `Err(ViewerError::ModelLoad)` on fetch/decode failure; the
    /// orchestrator distinguishes cancellation (checked by the caller
    /// via `abort.is_aborted()` after this returns) from a genuine
    /// error, emitting `model-load-cancelled` instead of `model-load-error`
    /// in the former case.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        abort: AbortFlag,
        on_progress: ProgressCallback<'a>,
    ) -> FetchFuture<'a>;
}

/// Desktop preview binary fetcher: reads a local path with `std::fs`.
/// No real progress granularity — reports a single 0% / 100% pair.
#[cfg(feature = "viewer")]
pub struct FsAssetFetcher;

#[cfg(feature = "viewer")]
impl AssetFetcher for FsAssetFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        abort: AbortFlag,
        mut on_progress: ProgressCallback<'a>,
    ) -> FetchFuture<'a> {
        Box::pin(async move {
            let total = std::fs::metadata(url).ok().map(|m| m.len());
            on_progress(FetchProgress { loaded: 0, total });
            let bytes = std::fs::read(url)
                .map_err(|e| ViewerError::ModelLoad(format!("{url}: {e}")))?;
            if abort.is_aborted() {
                return Ok(bytes);
            }
            on_progress(FetchProgress {
                loaded: bytes.len() as u64,
                total,
            });
            Ok(bytes)
        })
    }
}

/// Browser fetcher: uses `window.fetch`, reporting total size from the
/// `Content-Length` response header (when present) and a single
/// completion progress update once the body has been read into memory.
///
/// True streaming (`ReadableStream`) progress is not implemented — glTF
/// binaries for a single wreck model are fetched as one body, and the
/// façade's progress event is primarily there for a host-side loading
/// bar, not byte-accurate telemetry.
#[cfg(feature = "web")]
pub struct WebAssetFetcher;

#[cfg(feature = "web")]
impl AssetFetcher for WebAssetFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        abort: AbortFlag,
        mut on_progress: ProgressCallback<'a>,
    ) -> FetchFuture<'a> {
        Box::pin(async move {
            let window = web_sys::window()
                .ok_or_else(|| ViewerError::ModelLoad("no window in this context".into()))?;

            on_progress(FetchProgress {
                loaded: 0,
                total: None,
            });

            let response_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url))
                .await
                .map_err(|_| ViewerError::ModelLoad(format!("fetch failed: {url}")))?;
            let response: web_sys::Response = response_value
                .dyn_into()
                .map_err(|_| ViewerError::ModelLoad("fetch did not return a Response".into()))?;

            if !response.ok() {
                return Err(ViewerError::ModelLoad(format!(
                    "{url}: HTTP {}",
                    response.status()
                )));
            }

            let total = response
                .headers()
                .get("content-length")
                .ok()
                .flatten()
                .and_then(|s| s.parse::<u64>().ok());

            if abort.is_aborted() {
                return Err(ViewerError::ModelLoad("aborted".into()));
            }

            let buffer = wasm_bindgen_futures::JsFuture::from(
                response
                    .array_buffer()
                    .map_err(|_| ViewerError::ModelLoad("response has no body".into()))?,
            )
            .await
            .map_err(|_| ViewerError::ModelLoad(format!("{url}: failed reading body")))?;

            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

            on_progress(FetchProgress {
                loaded: bytes.len() as u64,
                total,
            });

            Ok(bytes)
        })
    }
}

#[cfg(all(test, feature = "viewer"))]
mod tests {
    use super::*;

    #[test]
    fn abort_flag_starts_clear_and_latches_true() {
        let flag = AbortFlag::new();
        assert!(!flag.is_aborted());
        flag.abort();
        assert!(flag.is_aborted());
    }

    #[test]
    fn cloned_abort_flag_shares_state() {
        let flag = AbortFlag::new();
        let clone = flag.clone();
        clone.abort();
        assert!(flag.is_aborted());
    }
}
