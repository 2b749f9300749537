//! Live capture: turns frames from an imaging source into stored stills.
//!
//! [`CaptureUnit`] is a small state machine (`Idle -> Capturing -> Idle`).
//! At most one capture is in flight at a time, and a fixed cool-down after
//! each successful capture swallows rapid repeated triggers. Every captured
//! frame is center-cropped to the configured ratio and rasterized at the
//! configured output size.

use std::cell::Cell;
use std::future::Future;

use kurbo::Affine;
use thiserror::Error;

use crate::config::CaptureConfig;
use crate::decode::RasterImage;
use crate::surface::RasterSurface;
use crate::transform::{center_crop_rect, Rect};

/// Capture failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The camera could not be opened (permission denied, no device, ...)
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// No session is running or no decodable frame has arrived yet
    #[error("Camera is not ready yet, please try again")]
    NotReady,
}

/// A live video source.
pub trait FrameSource {
    /// Open the device. Not retried on failure.
    fn acquire(&self) -> impl Future<Output = Result<(), CaptureError>>;

    /// Close the device.
    fn release(&self);

    /// The most recent decodable frame, if any.
    fn grab_frame(&self) -> impl Future<Output = Option<RasterImage>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
}

/// Resets the unit to `Idle` however the capture future ends.
struct InFlight<'a>(&'a Cell<CaptureState>);

impl<'a> InFlight<'a> {
    fn enter(state: &'a Cell<CaptureState>) -> Self {
        state.set(CaptureState::Capturing);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(CaptureState::Idle);
    }
}

/// Guarded capture over a [`FrameSource`].
pub struct CaptureUnit<S> {
    source: S,
    config: CaptureConfig,
    active: Cell<bool>,
    state: Cell<CaptureState>,
    last_capture_ms: Cell<Option<f64>>,
}

impl<S: FrameSource> CaptureUnit<S> {
    pub fn new(source: S, config: CaptureConfig) -> Self {
        Self {
            source,
            config,
            active: Cell::new(false),
            state: Cell::new(CaptureState::Idle),
            last_capture_ms: Cell::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> CaptureState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Acquire the imaging source.
    pub async fn start_session(&self) -> Result<(), CaptureError> {
        if self.active.get() {
            return Ok(());
        }
        match self.source.acquire().await {
            Ok(()) => {
                self.active.set(true);
                log::info!("Capture session started");
                Ok(())
            }
            Err(e) => {
                log::warn!("Capture session failed to start: {e}");
                Err(e)
            }
        }
    }

    pub fn stop_session(&self) {
        if self.active.replace(false) {
            self.source.release();
            log::info!("Capture session stopped");
        }
    }

    /// Capture one still at time `now_ms`.
    ///
    /// Returns `Ok(None)` without touching the source when another capture
    /// is in flight or the cool-down since the last capture has not elapsed.
    pub async fn capture_frame(&self, now_ms: f64) -> Result<Option<RasterImage>, CaptureError> {
        if self.state.get() == CaptureState::Capturing {
            log::debug!("Capture ignored: another capture is in flight");
            return Ok(None);
        }
        if let Some(last) = self.last_capture_ms.get() {
            // A clock that jumped backwards ends the cool-down
            let elapsed = now_ms - last;
            if (0.0..self.config.cooldown_ms as f64).contains(&elapsed) {
                log::debug!("Capture ignored: cooling down");
                return Ok(None);
            }
        }
        if !self.active.get() {
            return Err(CaptureError::NotReady);
        }

        let _guard = InFlight::enter(&self.state);

        let frame = match self.source.grab_frame().await {
            Some(frame) if !frame.is_empty() => frame,
            _ => return Err(CaptureError::NotReady),
        };

        let still = rasterize_frame(&frame, &self.config);
        self.last_capture_ms.set(Some(now_ms));
        log::debug!(
            "Captured {}x{} frame as {}x{}",
            frame.width,
            frame.height,
            still.width,
            still.height
        );
        Ok(Some(still))
    }
}

/// Center-crop `frame` to the target ratio and scale it to the output size.
pub fn rasterize_frame(frame: &RasterImage, config: &CaptureConfig) -> RasterImage {
    let crop = center_crop_rect(frame.width as f64, frame.height as f64, config.target_ratio);
    let mut surface = RasterSurface::new(config.output_width, config.output_height);
    surface.draw_image(
        frame,
        crop,
        Rect::from_size(config.output_width, config.output_height),
        Affine::IDENTITY,
    );
    surface.into_image()
}
