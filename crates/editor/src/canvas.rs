//! Canvas-side collaborators of the snapshot applier.
//!
//! The applier only talks to the traits in this module:
//!
//! - [`SurfaceLocator`] finds the drawable [`Surface`] mounted for a layer.
//! - [`BitmapCodec`] turns a layer's bitmap reference into pixels.
//! - [`RenderBarrier`] waits one frame so surfaces for new layers exist.
//!
//! The in-process implementations keep pixels in `image::RgbaImage` buffers
//! and encode bitmap references as PNG data URLs.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use layerdraw_core::types::LayerId;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A drawable pixel surface bound to one layer.
pub trait Surface: Send + Sync {
    /// Reset every pixel to transparent.
    fn clear(&self);

    /// Composite `image` with its top-left corner at `(x, y)`.
    fn draw_image_at(&self, image: &RgbaImage, x: i64, y: i64);
}

pub trait SurfaceLocator: Send + Sync {
    /// The surface mounted for `layer_id`, if any.
    fn locate(&self, layer_id: &str) -> Option<Arc<dyn Surface>>;
}

#[async_trait]
pub trait BitmapCodec: Send + Sync {
    async fn decode(&self, bitmap_ref: &str) -> Result<RgbaImage, BitmapError>;
}

/// Rendering-readiness barrier.
#[async_trait]
pub trait RenderBarrier: Send + Sync {
    /// Resolve once the next frame has rendered `layer_ids`.
    async fn next_frame(&self, layer_ids: &[LayerId]);
}

#[derive(Debug, thiserror::Error)]
pub enum BitmapError {
    #[error("Bitmap reference is not a base64 PNG data URL")]
    NotDataUrl,

    #[error("Bitmap payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Bitmap payload is not a valid image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Bitmap decode task failed: {0}")]
    Task(String),
}

// ---------------------------------------------------------------------------
// DataUrlCodec
// ---------------------------------------------------------------------------

/// PNG data URL codec. Decoding runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlCodec;

impl DataUrlCodec {
    pub fn decode_sync(bitmap_ref: &str) -> Result<RgbaImage, BitmapError> {
        let payload = bitmap_ref
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or(BitmapError::NotDataUrl)?;
        let bytes = BASE64.decode(payload.trim())?;
        let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;
        Ok(image.to_rgba8())
    }

    /// Encode pixels as a `data:image/png;base64,...` reference.
    pub fn encode(image: &RgbaImage) -> Result<String, BitmapError> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", BASE64.encode(&bytes)))
    }
}

#[async_trait]
impl BitmapCodec for DataUrlCodec {
    async fn decode(&self, bitmap_ref: &str) -> Result<RgbaImage, BitmapError> {
        let owned = bitmap_ref.to_owned();
        tokio::task::spawn_blocking(move || Self::decode_sync(&owned))
            .await
            .map_err(|e| BitmapError::Task(e.to_string()))?
    }
}

// ---------------------------------------------------------------------------
// PixelSurface
// ---------------------------------------------------------------------------

/// In-memory RGBA surface.
#[derive(Debug)]
pub struct PixelSurface {
    pixels: Mutex<RgbaImage>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: Mutex::new(RgbaImage::new(width, height)),
        }
    }

    /// Copy of the current pixels.
    pub fn pixels(&self) -> RgbaImage {
        self.lock().clone()
    }

    pub fn is_blank(&self) -> bool {
        self.lock().pixels().all(|p| p.0[3] == 0)
    }

    /// Export the surface as a bitmap reference.
    pub fn to_data_url(&self) -> Result<String, BitmapError> {
        DataUrlCodec::encode(&self.lock())
    }

    /// Fill an axis-aligned rectangle, clipped to the surface.
    pub fn fill_rect(&self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
        let mut pixels = self.lock();
        let (w, h) = pixels.dimensions();
        for py in y..y.saturating_add(height).min(h) {
            for px in x..x.saturating_add(width).min(w) {
                pixels.put_pixel(px, py, color);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RgbaImage> {
        self.pixels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Surface for PixelSurface {
    fn clear(&self) {
        let mut pixels = self.lock();
        for p in pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image_at(&self, image: &RgbaImage, x: i64, y: i64) {
        image::imageops::overlay(&mut *self.lock(), image, x, y);
    }
}

// ---------------------------------------------------------------------------
// SurfaceRegistry
// ---------------------------------------------------------------------------

/// Layer id to surface map, standing in for the mounted canvas elements.
///
/// As a [`RenderBarrier`] it plays the render pipeline: each frame mounts a
/// surface for every listed layer and unmounts the rest.
#[derive(Debug)]
pub struct SurfaceRegistry {
    width: u32,
    height: u32,
    surfaces: RwLock<HashMap<LayerId, Arc<PixelSurface>>>,
}

impl SurfaceRegistry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            surfaces: RwLock::new(HashMap::new()),
        }
    }

    /// Mount a blank surface for `layer_id`, keeping an existing one.
    pub fn mount(&self, layer_id: &str) -> Arc<PixelSurface> {
        let mut surfaces = self.surfaces.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            surfaces
                .entry(layer_id.to_string())
                .or_insert_with(|| Arc::new(PixelSurface::new(self.width, self.height))),
        )
    }

    pub fn unmount(&self, layer_id: &str) {
        self.surfaces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(layer_id);
    }

    pub fn surface(&self, layer_id: &str) -> Option<Arc<PixelSurface>> {
        self.surfaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(layer_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.surfaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mount surfaces for `layer_ids` and drop every other surface.
    pub fn sync(&self, layer_ids: &[LayerId]) {
        {
            let mut surfaces = self.surfaces.write().unwrap_or_else(PoisonError::into_inner);
            surfaces.retain(|id, _| layer_ids.contains(id));
        }
        for id in layer_ids {
            self.mount(id);
        }
    }
}

impl SurfaceLocator for SurfaceRegistry {
    fn locate(&self, layer_id: &str) -> Option<Arc<dyn Surface>> {
        self.surface(layer_id).map(|s| s as Arc<dyn Surface>)
    }
}

#[async_trait]
impl RenderBarrier for SurfaceRegistry {
    async fn next_frame(&self, layer_ids: &[LayerId]) {
        self.sync(layer_ids);
        tokio::task::yield_now().await;
    }
}

/// Barrier that only yields to the scheduler. Surfaces are mounted by
/// someone else.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameBarrier;

#[async_trait]
impl RenderBarrier for FrameBarrier {
    async fn next_frame(&self, _layer_ids: &[LayerId]) {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// The canvas collaborators handed to the applier.
#[derive(Clone)]
pub struct Canvas {
    pub surfaces: Arc<dyn SurfaceLocator>,
    pub codec: Arc<dyn BitmapCodec>,
    pub barrier: Arc<dyn RenderBarrier>,
}

impl Canvas {
    /// Headless canvas where `registry` is both locator and render pipeline.
    pub fn headless(registry: Arc<SurfaceRegistry>) -> Self {
        Self {
            surfaces: Arc::clone(&registry) as Arc<dyn SurfaceLocator>,
            codec: Arc::new(DataUrlCodec),
            barrier: registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn red_square(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255]))
    }

    #[tokio::test]
    async fn data_url_survives_encode_decode() {
        let original = red_square(3);
        let url = DataUrlCodec::encode(&original).unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));

        let decoded = DataUrlCodec.decode(&url).await.unwrap();
        assert_eq!(decoded, original);
    }

    #[tokio::test]
    async fn corrupt_references_are_rejected() {
        assert_matches!(
            DataUrlCodec.decode("not a url").await,
            Err(BitmapError::NotDataUrl)
        );
        assert_matches!(
            DataUrlCodec.decode("data:image/png;base64,!!!").await,
            Err(BitmapError::Base64(_))
        );
        assert_matches!(
            DataUrlCodec.decode("data:image/png;base64,AAAA").await,
            Err(BitmapError::Image(_))
        );
    }

    #[test]
    fn surface_draw_and_clear() {
        let surface = PixelSurface::new(4, 4);
        assert!(surface.is_blank());

        surface.draw_image_at(&red_square(2), 1, 1);
        let pixels = surface.pixels();
        assert_eq!(pixels.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(pixels.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));

        surface.clear();
        assert!(surface.is_blank());
    }

    #[test]
    fn fill_rect_is_clipped() {
        let surface = PixelSurface::new(2, 2);
        surface.fill_rect(1, 1, 10, 10, Rgba([0, 0, 255, 255]));
        let pixels = surface.pixels();
        assert_eq!(pixels.get_pixel(1, 1), &Rgba([0, 0, 255, 255]));
        assert_eq!(pixels.get_pixel(0, 1), &Rgba([0, 0, 0, 0]));
    }

    #[tokio::test]
    async fn registry_frame_mounts_listed_layers_only() {
        let registry = SurfaceRegistry::new(2, 2);
        registry.mount("stale");
        let kept = registry.mount("a");
        kept.fill_rect(0, 0, 1, 1, Rgba([1, 2, 3, 255]));

        registry
            .next_frame(&["a".to_string(), "b".to_string()])
            .await;

        assert_eq!(registry.len(), 2);
        assert!(registry.locate("stale").is_none());
        assert!(registry.locate("b").is_some());
        // Existing surfaces keep their pixels across frames.
        assert!(!registry.surface("a").unwrap().is_blank());
    }
}
