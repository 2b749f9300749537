//! Layered compositor: photos + styling + stickers -> one strip raster.
//!
//! Layers, bottom to top:
//! 1. Frame: flat `frame_color`, or the frame template stretched over the
//!    whole strip, clipped to `frame_border_radius_px`
//! 2. Photos in sequence order, cover-fitted into their slots, filtered,
//!    clipped to `photo_border_radius_px`
//! 3. Blank caption area (`bottom_space_px`) below the last photo
//! 4. Stickers in insertion order, rotated about their own centers
//!
//! [`Compositor::compose`] resolves every referenced template and sticker
//! image before drawing anything; [`render_strip`] itself is pure, so the
//! same inputs always give the same pixels.

mod layout;
mod loader;

pub use layout::StripLayout;
pub use loader::{ImageLoader, MemoryLoader};

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use kurbo::{Affine, Point};
use thiserror::Error;

use crate::config::StripConfig;
use crate::decode::{DecodeError, RasterImage};
use crate::encode::{EncodeError, StillFormat};
use crate::filter::filtered;
use crate::session::Photo;
use crate::style::{Sticker, StickerLayer, StyleError, StyleState};
use crate::surface::RasterSurface;
use crate::transform::{center_crop_rect, compose_transform, Rect};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// A template or sticker image could not be fetched or decoded
    #[error("Could not load image '{src}': {source}")]
    Decode {
        src: String,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    InvalidStyle(#[from] StyleError),
}

/// Decoded images referenced by a composition, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    images: HashMap<String, RasterImage>,
}

impl ResolvedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, image: RasterImage) {
        self.images.insert(src.into(), image);
    }

    pub fn get(&self, src: &str) -> Option<&RasterImage> {
        self.images.get(src)
    }
}

/// Handle to a rendered strip, passed explicitly to the exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedStrip {
    image: Arc<RasterImage>,
    layout: StripLayout,
}

impl ComposedStrip {
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    pub fn encode(&self, format: StillFormat) -> Result<Vec<u8>, EncodeError> {
        format.encode(&self.image)
    }
}

/// Every image URL a composition needs, deduplicated, in first-use order.
fn referenced_sources(style: &StyleState, stickers: &StickerLayer) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    let candidates = style
        .frame_template
        .iter()
        .chain(stickers.iter().map(|s| &s.src));
    for src in candidates {
        if !sources.contains(src) {
            sources.push(src.clone());
        }
    }
    sources
}

/// Fetch and decode every referenced image; fails on the first error.
pub async fn resolve_assets<L: ImageLoader>(
    style: &StyleState,
    stickers: &StickerLayer,
    loader: &L,
) -> Result<ResolvedAssets, ComposeError> {
    let sources = referenced_sources(style, stickers);
    let loads = sources.iter().map(|src| async move {
        loader
            .load(src)
            .await
            .map(|image| (src.clone(), image))
            .map_err(|source| ComposeError::Decode {
                src: src.clone(),
                source,
            })
    });

    let mut assets = ResolvedAssets::new();
    for (src, image) in try_join_all(loads).await? {
        assets.insert(src, image);
    }
    Ok(assets)
}

#[derive(Debug, Clone, Default)]
pub struct Compositor {
    config: StripConfig,
}

impl Compositor {
    pub fn new(config: StripConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StripConfig {
        &self.config
    }

    pub fn layout(&self, photo_count: usize, style: &StyleState) -> StripLayout {
        StripLayout::compute(photo_count, style, &self.config)
    }

    /// Center point of the strip, where new stickers are placed.
    pub fn sticker_origin(&self, photo_count: usize, style: &StyleState) -> (f64, f64) {
        self.layout(photo_count, style).center()
    }

    /// Validate the style, load every referenced image, then render.
    pub async fn compose<L: ImageLoader>(
        &self,
        photos: &[Photo],
        style: &StyleState,
        stickers: &StickerLayer,
        loader: &L,
    ) -> Result<ComposedStrip, ComposeError> {
        style.validate()?;
        let assets = resolve_assets(style, stickers, loader).await?;
        let layout = self.layout(photos.len(), style);
        let image = render_strip(photos, style, stickers, &assets, &layout);
        log::debug!(
            "Composed {} photo(s) into {}x{} strip",
            photos.len(),
            image.width,
            image.height
        );
        Ok(ComposedStrip {
            image: Arc::new(image),
            layout,
        })
    }
}

/// Draw every layer of the strip.
///
/// Stickers or templates missing from `assets` are skipped.
pub fn render_strip(
    photos: &[Photo],
    style: &StyleState,
    stickers: &StickerLayer,
    assets: &ResolvedAssets,
    layout: &StripLayout,
) -> RasterImage {
    let bounds = layout.bounds();
    let mut surface = RasterSurface::new(layout.width, layout.height);

    // 1. Frame
    surface.clip_rounded_rect(bounds, style.frame_border_radius_px);
    surface.fill(style.frame_color);
    if let Some(template) = style.frame_template.as_deref().and_then(|src| assets.get(src)) {
        surface.draw_image(
            template,
            Rect::from_size(template.width, template.height),
            bounds,
            Affine::IDENTITY,
        );
    }

    // 2. Photos
    for (photo, slot) in photos.iter().zip(&layout.slots) {
        draw_photo(&mut surface, photo, style, *slot);
    }

    // 3. Caption area is left as frame

    // 4. Stickers
    surface.clip_rounded_rect(bounds, style.frame_border_radius_px);
    for sticker in stickers.iter() {
        if let Some(image) = assets.get(&sticker.src) {
            draw_sticker(&mut surface, sticker, image);
        }
    }

    surface.into_image()
}

fn draw_photo(surface: &mut RasterSurface, photo: &Photo, style: &StyleState, slot: Rect) {
    let image = filtered(&photo.image, style.filter);
    let source = center_crop_rect(image.width as f64, image.height as f64, slot.aspect_ratio());

    surface.clip_rounded_rect(slot, style.photo_border_radius_px);
    surface.draw_image(&image, source, slot, Affine::IDENTITY);
    surface.reset_clip();
}

fn draw_sticker(surface: &mut RasterSurface, sticker: &Sticker, image: &RasterImage) {
    if sticker.size <= 0.0 || image.is_empty() {
        return;
    }
    let height = sticker.size / image.aspect_ratio();
    let dst = Rect::new(sticker.x, sticker.y, sticker.size, height);
    let (cx, cy) = dst.center();
    let transform = compose_transform(Point::new(cx, cy), sticker.rotation_degrees, 1.0);

    surface.draw_image(image, Rect::from_size(image.width, image.height), dst, transform);
}
