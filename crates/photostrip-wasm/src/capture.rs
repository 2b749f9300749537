//! Camera capture bindings.
//!
//! The browser owns the `<video>` element and the media stream. It pushes
//! decoded frames into a [`JsCaptureUnit`] (typically from a
//! `requestVideoFrameCallback` loop) and asks the unit to capture a still,
//! which goes through the same busy/cooldown guards as the native pipeline.
//!
//! ```typescript
//! const camera = new JsCaptureUnit(
//!   () => navigator.mediaDevices.getUserMedia({ video: true }).then(attach),
//!   () => stream.getTracks().forEach((t) => t.stop()),
//!   config,
//! );
//! await camera.start_session();
//! camera.push_frame(w, h, rgba);
//! const still = await camera.capture_frame(); // JsRasterImage or null
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use photostrip_core::capture::{CaptureError, CaptureState, CaptureUnit, FrameSource};
use photostrip_core::decode::{RasterImage, CHANNELS};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::config::JsBoothConfig;
use crate::types::{describe, to_js, JsRasterImage};

/// Frame source fed from JavaScript.
pub struct LiveSource {
    acquire: Function,
    release: Function,
    latest: RefCell<Option<RasterImage>>,
}

impl LiveSource {
    pub fn new(acquire: Function, release: Function) -> Self {
        Self {
            acquire,
            release,
            latest: RefCell::new(None),
        }
    }

    /// Replace the most recent frame.
    pub fn push_frame(&self, frame: RasterImage) {
        *self.latest.borrow_mut() = Some(frame);
    }
}

impl FrameSource for LiveSource {
    async fn acquire(&self) -> Result<(), CaptureError> {
        let returned = self
            .acquire
            .call0(&JsValue::NULL)
            .map_err(|e| CaptureError::DeviceUnavailable(describe(&e)))?;
        JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|e| CaptureError::DeviceUnavailable(describe(&e)))?;
        Ok(())
    }

    fn release(&self) {
        self.latest.borrow_mut().take();
        if let Err(e) = self.release.call0(&JsValue::NULL) {
            log::warn!("Camera release callback failed: {}", describe(&e));
        }
    }

    async fn grab_frame(&self) -> Option<RasterImage> {
        self.latest.borrow().clone()
    }
}

/// Guarded still capture over a JS-fed live stream.
#[wasm_bindgen]
pub struct JsCaptureUnit {
    unit: Rc<CaptureUnit<LiveSource>>,
}

#[wasm_bindgen]
impl JsCaptureUnit {
    /// `acquire` opens the camera and may return a Promise; `release` stops it.
    #[wasm_bindgen(constructor)]
    pub fn new(acquire: Function, release: Function, config: &JsBoothConfig) -> JsCaptureUnit {
        let source = LiveSource::new(acquire, release);
        Self {
            unit: Rc::new(CaptureUnit::new(source, config.inner().capture.clone())),
        }
    }

    /// Open the camera. Resolves once the device is live; rejects (without
    /// retrying) when access is denied.
    pub fn start_session(&self) -> Promise {
        let unit = Rc::clone(&self.unit);
        future_to_promise(async move {
            unit.start_session().await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn stop_session(&self) {
        self.unit.stop_session();
    }

    /// Feed the latest decoded video frame (RGBA).
    pub fn push_frame(&self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), JsValue> {
        let expected = width as usize * height as usize * CHANNELS;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(JsValue::from_str(&format!(
                "Frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        self.unit.source().push_frame(RasterImage::new(width, height, rgba));
        Ok(())
    }

    /// Capture a still from the latest frame.
    ///
    /// Resolves to a `JsRasterImage`, or to `null` when the request was
    /// dropped (a capture already in flight, or within the cooldown).
    /// Rejects when the camera is not ready.
    pub fn capture_frame(&self) -> Promise {
        let unit = Rc::clone(&self.unit);
        let now_ms = js_sys::Date::now();
        future_to_promise(async move {
            match unit.capture_frame(now_ms).await.map_err(to_js)? {
                Some(still) => Ok(JsRasterImage::from_raster(still).into()),
                None => Ok(JsValue::NULL),
            }
        })
    }

    #[wasm_bindgen(getter)]
    pub fn is_active(&self) -> bool {
        self.unit.is_active()
    }

    #[wasm_bindgen(getter)]
    pub fn is_capturing(&self) -> bool {
        self.unit.state() == CaptureState::Capturing
    }
}
