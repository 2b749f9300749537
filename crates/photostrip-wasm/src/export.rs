//! Export bindings: still, loop and print artifacts plus hand-off helpers.
//!
//! Still and print exports re-render the strip from the session, style
//! and stickers as they are when the export is requested.
//!
//! ```typescript
//! const png = await composer.export_png(session);
//! const url = composer.loop_object_url(session); // <img src={url}> or download
//! a.download = download_name({ kind: 'strip' });
//! await composer.print(session, (page) => openPrintWindow(page));
//! ```

use std::future::Future;
use std::rc::Rc;

use js_sys::{Array, Function, Promise, Uint8Array};
use photostrip_core::encode::StillFormat;
use photostrip_core::export::{
    download_name as core_download_name, plan_share as core_plan_share, ArtifactKind,
    ArtifactLocation, ExportError, PrintPage, PrintTarget, ShareCapabilities,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Blob, BlobPropertyBag, Url};

use crate::compose::JsComposer;
use crate::session::JsPhotoSession;
use crate::types::{describe, to_js, JsRasterImage};

/// A print-ready page and the physical size to print it at.
#[wasm_bindgen]
pub struct JsPrintPage {
    page: PrintPage,
}

#[wasm_bindgen]
impl JsPrintPage {
    pub fn image(&self) -> JsRasterImage {
        JsRasterImage::from_raster(self.page.image.clone())
    }

    #[wasm_bindgen(getter)]
    pub fn width_mm(&self) -> f64 {
        self.page.width_mm
    }

    #[wasm_bindgen(getter)]
    pub fn height_mm(&self) -> f64 {
        self.page.height_mm
    }

    #[wasm_bindgen(getter)]
    pub fn dpi(&self) -> u32 {
        self.page.dpi
    }
}

/// Print facility implemented by a JS callback receiving a `JsPrintPage`.
struct JsPrintTarget {
    callback: Function,
}

impl PrintTarget for JsPrintTarget {
    fn print(&self, page: &PrintPage) -> Result<(), ExportError> {
        let page = JsPrintPage { page: page.clone() };
        self.callback
            .call1(&JsValue::NULL, &page.into())
            .map(|_| ())
            .map_err(|e| ExportError::Print(describe(&e)))
    }
}

/// Wrap encoded bytes in a Blob and return an object URL for it.
fn object_url(bytes: &[u8], mime_type: &str) -> Result<String, JsValue> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Url::create_object_url_with_blob(&blob)
}

#[wasm_bindgen]
impl JsComposer {
    /// Render the strip and encode it as PNG. Resolves to a `Uint8Array`.
    pub fn export_png(&self, session: &JsPhotoSession) -> Promise {
        let bytes = self.still_bytes(session, StillFormat::Png);
        future_to_promise(async move { Ok(Uint8Array::from(bytes.await?.as_slice()).into()) })
    }

    /// Render the strip and encode it as JPEG; `quality` defaults to the
    /// configured value.
    pub fn export_jpeg(&self, session: &JsPhotoSession, quality: Option<u8>) -> Promise {
        let format = match quality {
            Some(q) => StillFormat::Jpeg(q),
            None => self.exporter.borrow().default_jpeg(),
        };
        let bytes = self.still_bytes(session, format);
        future_to_promise(async move { Ok(Uint8Array::from(bytes.await?.as_slice()).into()) })
    }

    /// Render the strip as PNG. Resolves to an object URL.
    pub fn strip_object_url(&self, session: &JsPhotoSession) -> Promise {
        let bytes = self.still_bytes(session, StillFormat::Png);
        future_to_promise(async move {
            let url = object_url(&bytes.await?, StillFormat::Png.mime_type())?;
            Ok(url.into())
        })
    }

    /// Encode the session photos as a looping GIF.
    pub fn export_loop(&self, session: &JsPhotoSession) -> Result<Vec<u8>, JsValue> {
        let photos = session.photos();
        let style = self.style.borrow();
        let mut exporter = self.exporter.borrow_mut();
        let artifact = exporter.export_loop(&photos, &style).map_err(to_js)?;
        Ok(artifact.bytes.clone())
    }

    /// Encode the loop and return an object URL for it.
    pub fn loop_object_url(&self, session: &JsPhotoSession) -> Result<String, JsValue> {
        let bytes = self.export_loop(session)?;
        object_url(&bytes, "image/gif")
    }

    /// Render the strip onto the configured page. Resolves to a
    /// `JsPrintPage`.
    pub fn export_print(&self, session: &JsPhotoSession) -> Promise {
        let page = self.print_page(session);
        future_to_promise(async move { Ok(JsPrintPage { page: page.await? }.into()) })
    }

    /// Render the print page and pass it to `callback`. Rejects when the
    /// callback throws.
    pub fn print(&self, session: &JsPhotoSession, callback: Function) -> Promise {
        let page = self.print_page(session);
        future_to_promise(async move {
            let page = page.await?;
            JsPrintTarget { callback }.print(&page).map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

impl JsComposer {
    fn still_bytes(
        &self,
        session: &JsPhotoSession,
        format: StillFormat,
    ) -> impl Future<Output = Result<Vec<u8>, JsValue>> + 'static {
        let strip = self.render(session);
        let exporter = Rc::clone(&self.exporter);
        async move {
            let strip = strip.await?;
            let mut exporter = exporter.borrow_mut();
            let artifact = exporter.export_static(&strip, format).map_err(to_js)?;
            Ok(artifact.bytes.clone())
        }
    }

    /// The exporter is released before the page is returned, so a print
    /// callback may call back into the composer.
    fn print_page(
        &self,
        session: &JsPhotoSession,
    ) -> impl Future<Output = Result<PrintPage, JsValue>> + 'static {
        let strip = self.render(session);
        let exporter = Rc::clone(&self.exporter);
        async move {
            let strip = strip.await?;
            let mut exporter = exporter.borrow_mut();
            let page = exporter.export_print(&strip).map_err(to_js)?;
            Ok(page.clone())
        }
    }
}

/// Suggested filename: `{kind: 'photo', ordinal: 0}` gives `photo_1.png`,
/// `{kind: 'strip'}` gives `photostrip.png`, `{kind: 'loop'}` gives
/// `photobooth.gif`.
#[wasm_bindgen]
pub fn download_name(kind: JsValue) -> Result<String, JsValue> {
    let kind: ArtifactKind = serde_wasm_bindgen::from_value(kind).map_err(to_js)?;
    Ok(core_download_name(kind))
}

/// Choose how to share an artifact.
///
/// `capabilities` is `{canShare, canShareFiles, canWriteClipboard}` and
/// `location` is `{type: 'local'}` or `{type: 'remote', url}`. Resolves to
/// `{action: 'shareFile' | 'shareUrl' | 'copyUrl' | 'unsupported', url?}`.
#[wasm_bindgen]
pub fn plan_share(capabilities: JsValue, location: JsValue) -> Result<JsValue, JsValue> {
    let capabilities: ShareCapabilities = serde_wasm_bindgen::from_value(capabilities).map_err(to_js)?;
    let location: ArtifactLocation = serde_wasm_bindgen::from_value(location).map_err(to_js)?;
    let action = core_plan_share(capabilities, &location);
    log::debug!("Share plan: {action:?}");
    serde_wasm_bindgen::to_value(&action).map_err(to_js)
}
