//! Strip composition bindings: style, stickers and the compositor.
//!
//! Template and sticker images are fetched through a JS callback that
//! resolves to the image bytes (`ArrayBuffer` or `Uint8Array`). Composition
//! waits for every referenced image before drawing; one failed fetch
//! rejects the whole composition.
//!
//! ```typescript
//! const composer = new JsComposer(config, (url) => fetch(url).then((r) => r.arrayBuffer()));
//! composer.set_style({ frameColor: '#ffc0cb', filter: 'sepia' });
//! const heart = composer.add_sticker(session, 'https://cdn.example/heart.png');
//! const strip = await composer.compose(session);
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use js_sys::{Function, Promise, Uint8Array};
use photostrip_core::compositor::{ComposedStrip, ImageLoader};
use photostrip_core::decode::{decode_image, DecodeError, RasterImage};
use photostrip_core::export::Exporter;
use photostrip_core::style::{ResizeOutcome, StickerId, StickerLayer, StyleState};
use photostrip_core::Compositor;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::config::JsBoothConfig;
use crate::session::JsPhotoSession;
use crate::types::{describe, to_js, JsRasterImage};

/// Image loader over a JS fetch callback.
pub struct JsImageLoader {
    fetch: Function,
}

impl JsImageLoader {
    pub fn new(fetch: Function) -> Self {
        Self { fetch }
    }
}

impl ImageLoader for JsImageLoader {
    async fn load(&self, src: &str) -> Result<RasterImage, DecodeError> {
        let failed = |e: JsValue| DecodeError::FetchFailed {
            src: src.to_string(),
            reason: describe(&e),
        };
        let returned = self
            .fetch
            .call1(&JsValue::NULL, &JsValue::from_str(src))
            .map_err(failed)?;
        let body = JsFuture::from(Promise::resolve(&returned)).await.map_err(failed)?;
        decode_image(&Uint8Array::new(&body).to_vec())
    }
}

/// Style, sticker layer and export state for one strip.
#[wasm_bindgen]
pub struct JsComposer {
    pub(crate) style: Rc<RefCell<StyleState>>,
    pub(crate) stickers: Rc<RefCell<StickerLayer>>,
    pub(crate) exporter: Rc<RefCell<Exporter>>,
    pub(crate) loader: Rc<JsImageLoader>,
    default_sticker_size: f64,
}

#[wasm_bindgen]
impl JsComposer {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &JsBoothConfig, fetch: Function) -> JsComposer {
        let config = config.inner();
        let compositor = Compositor::new(config.strip.clone());
        Self {
            style: Rc::new(RefCell::new(StyleState::default())),
            stickers: Rc::new(RefCell::new(StickerLayer::new())),
            exporter: Rc::new(RefCell::new(Exporter::new(config.export.clone(), compositor))),
            loader: Rc::new(JsImageLoader::new(fetch)),
            default_sticker_size: config.strip.default_sticker_size,
        }
    }

    /// Replace the style. Missing fields take their defaults; out-of-range
    /// values are rejected and the current style is kept.
    pub fn set_style(&self, style: JsValue) -> Result<(), JsValue> {
        let style: StyleState = serde_wasm_bindgen::from_value(style).map_err(to_js)?;
        style.validate().map_err(to_js)?;
        *self.style.borrow_mut() = style;
        Ok(())
    }

    pub fn style(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&*self.style.borrow()).map_err(to_js)
    }

    pub fn reset_style(&self) {
        self.style.borrow_mut().reset();
    }

    /// Place a sticker at the center of the strip; returns its id.
    pub fn add_sticker(&self, session: &JsPhotoSession, src: String) -> u64 {
        let origin = self
            .exporter
            .borrow()
            .compositor()
            .sticker_origin(session.len(), &self.style.borrow());
        self.stickers
            .borrow_mut()
            .add(src, origin, self.default_sticker_size)
            .0
    }

    pub fn move_sticker(&self, id: u64, x: f64, y: f64) -> Result<(), JsValue> {
        self.stickers
            .borrow_mut()
            .move_to(StickerId(id), x, y)
            .map_err(to_js)
    }

    pub fn move_sticker_by(&self, id: u64, dx: f64, dy: f64) -> Result<(), JsValue> {
        self.stickers
            .borrow_mut()
            .move_by(StickerId(id), dx, dy)
            .map_err(to_js)
    }

    /// Returns `true` when the sticker was removed (size of zero or less).
    pub fn resize_sticker(&self, id: u64, size: f64) -> Result<bool, JsValue> {
        let outcome = self
            .stickers
            .borrow_mut()
            .resize(StickerId(id), size)
            .map_err(to_js)?;
        Ok(matches!(outcome, ResizeOutcome::Removed(_)))
    }

    /// Returns the new rotation in degrees.
    pub fn rotate_sticker(&self, id: u64, delta_degrees: f64) -> Result<f64, JsValue> {
        self.stickers
            .borrow_mut()
            .rotate(StickerId(id), delta_degrees)
            .map_err(to_js)
    }

    pub fn remove_sticker(&self, id: u64) -> Result<(), JsValue> {
        self.stickers
            .borrow_mut()
            .remove(StickerId(id))
            .map(|_| ())
            .map_err(to_js)
    }

    pub fn clear_stickers(&self) {
        self.stickers.borrow_mut().clear();
    }

    /// Stickers in draw order.
    pub fn stickers(&self) -> Result<JsValue, JsValue> {
        let stickers = self.stickers.borrow();
        let list: Vec<_> = stickers.iter().collect();
        serde_wasm_bindgen::to_value(&list).map_err(to_js)
    }

    /// Render the strip for the session's current photos.
    pub fn compose(&self, session: &JsPhotoSession) -> Promise {
        let strip = self.render(session);
        future_to_promise(async move {
            let strip = strip.await?;
            Ok(JsRasterImage::from_raster(strip.image().clone()).into())
        })
    }
}

impl JsComposer {
    /// Snapshot the session, style and stickers now; the returned future
    /// loads assets and renders without touching the composer again.
    pub(crate) fn render(
        &self,
        session: &JsPhotoSession,
    ) -> impl Future<Output = Result<ComposedStrip, JsValue>> + 'static {
        let photos = session.photos();
        let style = self.style.borrow().clone();
        let stickers = self.stickers.borrow().clone();
        let compositor = self.exporter.borrow().compositor().clone();
        let loader = Rc::clone(&self.loader);

        async move {
            compositor
                .compose(&photos, &style, &stickers, loader.as_ref())
                .await
                .map_err(to_js)
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::session::JsRecordBackend;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn offline_session() -> JsPhotoSession {
        let ok = Function::new_no_args("return Promise.resolve()");
        JsPhotoSession::new(
            &JsBoothConfig::default(),
            JsRecordBackend::new(ok.clone(), ok.clone(), ok, false),
        )
    }

    fn composer(fetch: &str) -> JsComposer {
        JsComposer::new(&JsBoothConfig::default(), Function::new_with_args("url", fetch))
    }

    #[wasm_bindgen_test]
    async fn test_failed_fetch_rejects_compose() {
        let composer = composer("return Promise.reject('404')");
        let session = offline_session();
        composer.add_sticker(&session, "missing.png".to_string());
        assert!(JsFuture::from(composer.compose(&session)).await.is_err());
    }

    #[wasm_bindgen_test]
    async fn test_compose_without_assets() {
        let composer = composer("return Promise.reject('unused')");
        let session = offline_session();
        let photo = JsRasterImage::from_raster(RasterImage::filled(40, 30, [50, 60, 70, 255]));
        JsFuture::from(session.push(&photo).unwrap()).await.unwrap();

        let value = JsFuture::from(composer.compose(&session)).await.unwrap();
        assert!(!value.is_null());
    }

    #[wasm_bindgen_test]
    fn test_sticker_resize_to_zero_removes() {
        let composer = composer("return Promise.reject('unused')");
        let id = composer.add_sticker(&offline_session(), "heart.png".to_string());
        assert!(!composer.resize_sticker(id, 40.0).unwrap());
        assert!(composer.resize_sticker(id, 0.0).unwrap());
        assert!(composer.remove_sticker(id).is_err());
    }

    #[wasm_bindgen_test]
    fn test_partial_style_object() {
        let composer = composer("return Promise.reject('unused')");
        let value = js_sys::JSON::parse(r#"{"filter": "grayscale"}"#).unwrap();
        composer.set_style(value).unwrap();
        assert_eq!(composer.style.borrow().filter, photostrip_core::PhotoFilter::Grayscale);
        assert_eq!(composer.style.borrow().bottom_space_px, 85);
    }

    #[wasm_bindgen_test]
    fn test_oversized_style_rejected_and_kept() {
        let composer = composer("return Promise.reject('unused')");
        composer
            .set_style(js_sys::JSON::parse(r#"{"photoGapPx": 12}"#).unwrap())
            .unwrap();

        let huge = js_sys::JSON::parse(r#"{"photoGapPx": 2000000000}"#).unwrap();
        assert!(composer.set_style(huge).is_err());
        assert_eq!(composer.style.borrow().photo_gap_px, 12);
    }
}
