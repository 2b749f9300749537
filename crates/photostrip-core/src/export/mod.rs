//! Multi-format export of the composed strip.
//!
//! - Static: the composed strip encoded as PNG (default) or JPEG
//! - Loop: one GIF frame per photo, looping forever
//! - Print: the strip contain-fitted onto a physical page
//!
//! The exporter remembers the last good artifact of each kind. A failed
//! export reports its error and leaves that artifact untouched. All export
//! methods take `&mut self`, so one exporter runs one export at a time.

mod target;

pub use target::{
    download_name, plan_share, ArtifactKind, ArtifactLocation, PrintTarget, ShareAction,
    ShareCapabilities,
};

use kurbo::Affine;
use thiserror::Error;

use crate::color::Color;
use crate::compositor::{ComposeError, ComposedStrip, Compositor, ImageLoader};
use crate::config::ExportConfig;
use crate::decode::RasterImage;
use crate::encode::{encode_gif, EncodeError, StillFormat};
use crate::session::Photo;
use crate::style::{StickerLayer, StyleState};
use crate::surface::RasterSurface;
use crate::transform::{contain_rect, Rect};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("There are no photos to export")]
    NothingToExport,

    #[error("Printing failed: {0}")]
    Print(String),
}

/// Encoded still of the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticArtifact {
    pub bytes: Vec<u8>,
    pub format: StillFormat,
    pub width: u32,
    pub height: u32,
}

impl StaticArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Encoded looping animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedArtifact {
    pub bytes: Vec<u8>,
    pub frame_count: usize,
    pub frame_delay_ms: u32,
    pub width: u32,
    pub height: u32,
}

impl AnimatedArtifact {
    pub fn mime_type(&self) -> &'static str {
        "image/gif"
    }
}

/// A rendered page plus the physical size it must be printed at.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintPage {
    pub image: RasterImage,
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: u32,
}

pub struct Exporter {
    config: ExportConfig,
    compositor: Compositor,
    last_static: Option<StaticArtifact>,
    last_loop: Option<AnimatedArtifact>,
    last_print: Option<PrintPage>,
}

impl Exporter {
    pub fn new(config: ExportConfig, compositor: Compositor) -> Self {
        Self {
            config,
            compositor,
            last_static: None,
            last_loop: None,
            last_print: None,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn last_static(&self) -> Option<&StaticArtifact> {
        self.last_static.as_ref()
    }

    pub fn last_loop(&self) -> Option<&AnimatedArtifact> {
        self.last_loop.as_ref()
    }

    pub fn last_print(&self) -> Option<&PrintPage> {
        self.last_print.as_ref()
    }

    /// JPEG at the configured quality.
    pub fn default_jpeg(&self) -> StillFormat {
        StillFormat::Jpeg(self.config.jpeg_quality)
    }

    /// Snapshot an already composed strip.
    pub fn export_static(
        &mut self,
        strip: &ComposedStrip,
        format: StillFormat,
    ) -> Result<&StaticArtifact, ExportError> {
        let bytes = strip.encode(format)?;
        log::info!(
            "Exported {}x{} strip as {} ({} bytes)",
            strip.width(),
            strip.height(),
            format.mime_type(),
            bytes.len()
        );
        Ok(self.last_static.insert(StaticArtifact {
            bytes,
            format,
            width: strip.width(),
            height: strip.height(),
        }))
    }

    /// Compose (waiting for every referenced image) and snapshot in one go.
    pub async fn export_strip<L: ImageLoader>(
        &mut self,
        photos: &[Photo],
        style: &StyleState,
        stickers: &StickerLayer,
        loader: &L,
        format: StillFormat,
    ) -> Result<&StaticArtifact, ExportError> {
        let strip = self.compositor.compose(photos, style, stickers, loader).await?;
        self.export_static(&strip, format)
    }

    /// Encode the photos as a looping animation.
    ///
    /// Frames take the first photo's size; each is the frame color with the
    /// photo stretched over it. Filters and stickers are not applied.
    pub fn export_loop(
        &mut self,
        photos: &[Photo],
        style: &StyleState,
    ) -> Result<&AnimatedArtifact, ExportError> {
        let first = photos.first().ok_or(ExportError::NothingToExport)?;
        let (width, height) = (first.image.width, first.image.height);

        let frames: Vec<RasterImage> = photos
            .iter()
            .map(|photo| render_loop_frame(&photo.image, width, height, style.frame_color))
            .collect();

        let delay = self.config.loop_frame_delay_ms;
        let bytes = encode_gif(&frames, delay)?;
        log::info!(
            "Exported {}-frame loop at {}x{} ({} bytes)",
            frames.len(),
            width,
            height,
            bytes.len()
        );
        Ok(self.last_loop.insert(AnimatedArtifact {
            bytes,
            frame_count: frames.len(),
            frame_delay_ms: delay,
            width,
            height,
        }))
    }

    /// Fit the strip onto the printable area of the configured page.
    pub fn export_print(&mut self, strip: &ComposedStrip) -> Result<&PrintPage, ExportError> {
        let (width_mm, height_mm) = self.config.printable_mm();
        let page_w = self.config.mm_to_px(width_mm);
        let page_h = self.config.mm_to_px(height_mm);
        if page_w == 0 || page_h == 0 {
            return Err(EncodeError::InvalidDimensions {
                width: page_w,
                height: page_h,
            }
            .into());
        }

        let image = strip.image();
        let placement = contain_rect(
            image.width as f64,
            image.height as f64,
            page_w as f64,
            page_h as f64,
        );

        let mut surface = RasterSurface::new(page_w, page_h);
        surface.fill(Color::WHITE);
        surface.draw_image(
            image,
            Rect::from_size(image.width, image.height),
            placement,
            Affine::IDENTITY,
        );

        log::info!("Rendered print page {page_w}x{page_h} px ({width_mm}x{height_mm} mm)");
        Ok(self.last_print.insert(PrintPage {
            image: surface.into_image(),
            width_mm,
            height_mm,
            dpi: self.config.print_dpi,
        }))
    }

    /// Render the print page and hand it to `target`.
    pub fn print<T: PrintTarget>(&mut self, strip: &ComposedStrip, target: &T) -> Result<(), ExportError> {
        let page = self.export_print(strip)?;
        target.print(page)
    }
}

fn render_loop_frame(photo: &RasterImage, width: u32, height: u32, background: Color) -> RasterImage {
    let mut surface = RasterSurface::new(width, height);
    surface.fill(background);
    surface.draw_image(
        photo,
        Rect::from_size(photo.width, photo.height),
        Rect::from_size(width, height),
        Affine::IDENTITY,
    );
    surface.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::MemoryLoader;
    use crate::config::StripConfig;
    use crate::decode::decode_image;
    use crate::filter::PhotoFilter;
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;
    use pollster::block_on;
    use std::cell::RefCell;
    use std::io::Cursor;

    fn exporter() -> Exporter {
        // Roughly one pixel per millimetre keeps pages small
        let config = ExportConfig {
            print_dpi: 25,
            ..Default::default()
        };
        let strip = StripConfig {
            photo_width: 40,
            photo_height: 30,
            padding_px: 4,
            default_sticker_size: 10.0,
        };
        Exporter::new(config, Compositor::new(strip))
    }

    fn photos(colors: &[[u8; 4]]) -> Vec<Photo> {
        colors
            .iter()
            .enumerate()
            .map(|(i, c)| Photo::new(i, RasterImage::filled(16, 12, *c)))
            .collect()
    }

    fn compose(exporter: &Exporter, photos: &[Photo], style: &StyleState) -> ComposedStrip {
        block_on(exporter.compositor().compose(
            photos,
            style,
            &StickerLayer::new(),
            &MemoryLoader::new(),
        ))
        .unwrap()
    }

    #[test]
    fn test_static_png_matches_strip() {
        let mut exporter = exporter();
        let strip = compose(&exporter, &photos(&[[200, 0, 0, 255]]), &StyleState::default());
        let artifact = exporter.export_static(&strip, StillFormat::Png).unwrap();
        assert_eq!(artifact.mime_type(), "image/png");
        assert_eq!(&decode_image(&artifact.bytes).unwrap(), strip.image());
        assert!(exporter.last_static().is_some());
    }

    #[test]
    fn test_static_jpeg() {
        let mut exporter = exporter();
        let strip = compose(&exporter, &photos(&[[0, 0, 200, 255]]), &StyleState::default());
        let format = exporter.default_jpeg();
        let artifact = exporter.export_static(&strip, format).unwrap();
        assert_eq!(artifact.format, StillFormat::Jpeg(92));
        assert_eq!(&artifact.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_export_strip_waits_for_stickers() {
        let mut exporter = exporter();
        let mut stickers = StickerLayer::new();
        stickers.add("dot.png", (10.0, 10.0), 6.0);
        let dot = crate::encode::encode_png(&RasterImage::filled(2, 2, [0, 0, 0, 255])).unwrap();
        let loader = MemoryLoader::new().with("dot.png", dot);

        let artifact = block_on(exporter.export_strip(
            &photos(&[[255, 255, 255, 255]]),
            &StyleState::default(),
            &stickers,
            &loader,
            StillFormat::Png,
        ))
        .unwrap();
        let decoded = decode_image(&artifact.bytes).unwrap();
        assert_eq!(decoded.get(10, 10), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_failed_export_keeps_last_good() {
        let mut exporter = exporter();
        let shots = photos(&[[1, 2, 3, 255]]);
        block_on(exporter.export_strip(
            &shots,
            &StyleState::default(),
            &StickerLayer::new(),
            &MemoryLoader::new(),
            StillFormat::Png,
        ))
        .unwrap();
        let good = exporter.last_static().cloned();

        let mut stickers = StickerLayer::new();
        stickers.add("missing.png", (0.0, 0.0), 5.0);
        let result = block_on(exporter.export_strip(
            &shots,
            &StyleState::default(),
            &stickers,
            &MemoryLoader::new(),
            StillFormat::Png,
        ));
        assert!(matches!(result, Err(ExportError::Compose(_))));
        assert_eq!(exporter.last_static().cloned(), good);
    }

    #[test]
    fn test_loop_one_frame_per_photo() {
        let mut exporter = exporter();
        let mut shots = photos(&[[255, 0, 0, 255], [0, 0, 255, 255], [0, 255, 0, 255]]);
        shots[1] = Photo::new(1, RasterImage::filled(32, 8, [0, 0, 255, 255]));

        let artifact = exporter.export_loop(&shots, &StyleState::default()).unwrap();
        assert_eq!(artifact.frame_count, 3);
        assert_eq!(artifact.frame_delay_ms, 800);
        assert_eq!((artifact.width, artifact.height), (16, 12));
        assert_eq!(artifact.mime_type(), "image/gif");

        let decoder = GifDecoder::new(Cursor::new(artifact.bytes.clone())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.buffer().dimensions() == (16, 12)));
    }

    #[test]
    fn test_loop_frames_skip_filters() {
        // Intentional: loop frames are never filtered
        let mut exporter = exporter();
        let style = StyleState {
            filter: PhotoFilter::Grayscale,
            ..Default::default()
        };
        let artifact = exporter.export_loop(&photos(&[[255, 0, 0, 255]]), &style).unwrap();

        let decoder = GifDecoder::new(Cursor::new(artifact.bytes.clone())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        let px = frames[0].buffer().get_pixel(8, 6).0;
        assert!(px[0] > 200 && px[1] < 60 && px[2] < 60, "got {px:?}");
    }

    #[test]
    fn test_loop_without_photos_fails_softly() {
        let mut exporter = exporter();
        exporter.export_loop(&photos(&[[9, 9, 9, 255]]), &StyleState::default()).unwrap();
        let good = exporter.last_loop().cloned();

        assert!(matches!(
            exporter.export_loop(&[], &StyleState::default()),
            Err(ExportError::NothingToExport)
        ));
        assert_eq!(exporter.last_loop().cloned(), good);
    }

    #[test]
    fn test_print_page_contains_strip() {
        let mut exporter = exporter();
        let strip = compose(&exporter, &photos(&[[255, 0, 0, 255]; 4]), &StyleState::default());
        let page = exporter.export_print(&strip).unwrap().clone();

        assert_eq!((page.width_mm, page.height_mm), (277.0, 190.0));
        assert_eq!(page.dpi, 25);
        let expected_w = exporter.config().mm_to_px(277.0);
        let expected_h = exporter.config().mm_to_px(190.0);
        assert_eq!((page.image.width, page.image.height), (expected_w, expected_h));

        // Tall strip on a landscape page: white bars left and right
        assert_eq!(page.image.get(0, page.image.height / 2), Some([255, 255, 255, 255]));
        let cx = page.image.width / 2;
        let red_row = (page.image.height as f64 * 0.1) as u32;
        let px = page.image.get(cx, red_row).unwrap();
        assert!(px[0] > 200 && px[1] < 60, "got {px:?}");
    }

    struct RecordingPrinter {
        pages: RefCell<Vec<(f64, f64)>>,
    }

    impl PrintTarget for RecordingPrinter {
        fn print(&self, page: &PrintPage) -> Result<(), ExportError> {
            self.pages.borrow_mut().push((page.width_mm, page.height_mm));
            Ok(())
        }
    }

    #[test]
    fn test_print_hands_page_to_target() {
        let mut exporter = exporter();
        let strip = compose(&exporter, &photos(&[[0, 0, 0, 255]]), &StyleState::default());
        let printer = RecordingPrinter {
            pages: RefCell::new(Vec::new()),
        };
        exporter.print(&strip, &printer).unwrap();
        assert_eq!(printer.pages.borrow().as_slice(), &[(277.0, 190.0)]);
    }
}
