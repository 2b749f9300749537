//! Photo session bindings with IndexedDB-style persistence.
//!
//! The JS side owns the database and hands in three promise-returning
//! callbacks. Session mutations apply synchronously (errors throw); the
//! returned promise settles once the snapshot has been handed to storage.
//! Storage failures never reject: they are logged and the in-memory session
//! stays authoritative.
//!
//! ```typescript
//! const backend = new JsRecordBackend(
//!   (records) => db.replaceAll('photos', records),
//!   () => db.getAll('photos'),
//!   () => db.clear('photos'),
//!   'indexedDB' in window,
//! );
//! const session = new JsPhotoSession(config, backend);
//! await session.restore();
//! await session.push(still);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use photostrip_core::session::{Photo, PhotoRecord, PhotoSession, RecordBackend, SessionStore, StoreError};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::config::JsBoothConfig;
use crate::types::{describe, to_js, JsRasterImage};

/// Record table implemented in JavaScript.
#[wasm_bindgen]
pub struct JsRecordBackend {
    put_all: Function,
    get_all: Function,
    clear: Function,
    supported: bool,
}

#[wasm_bindgen]
impl JsRecordBackend {
    /// `put_all(records)` replaces the table, `get_all()` resolves to an
    /// array of `{ordinal, imageData, savedAt}`, `clear()` empties it.
    #[wasm_bindgen(constructor)]
    pub fn new(put_all: Function, get_all: Function, clear: Function, supported: bool) -> JsRecordBackend {
        Self {
            put_all,
            get_all,
            clear,
            supported,
        }
    }
}

fn backend_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Call `callback` and wait for whatever it returns.
async fn settle(callback: &Function, args: &[JsValue]) -> Result<JsValue, StoreError> {
    let returned = match args {
        [] => callback.call0(&JsValue::NULL),
        [first, ..] => callback.call1(&JsValue::NULL, first),
    }
    .map_err(|e| StoreError::Backend(describe(&e)))?;

    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(|e| StoreError::Backend(describe(&e)))
}

impl RecordBackend for JsRecordBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn put_all(&self, records: Vec<PhotoRecord>) -> Result<(), StoreError> {
        let value = serde_wasm_bindgen::to_value(&records).map_err(backend_error)?;
        settle(&self.put_all, &[value]).await?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<PhotoRecord>, StoreError> {
        let value = settle(&self.get_all, &[]).await?;
        if value.is_undefined() || value.is_null() {
            return Ok(Vec::new());
        }
        serde_wasm_bindgen::from_value(value).map_err(backend_error)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        settle(&self.clear, &[]).await?;
        Ok(())
    }
}

/// The bounded photo sequence of one booth session.
#[wasm_bindgen]
pub struct JsPhotoSession {
    session: Rc<RefCell<PhotoSession>>,
    store: Rc<SessionStore<JsRecordBackend>>,
}

#[wasm_bindgen]
impl JsPhotoSession {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &JsBoothConfig, backend: JsRecordBackend) -> JsPhotoSession {
        Self {
            session: Rc::new(RefCell::new(PhotoSession::new(config.inner().layout_count))),
            store: Rc::new(SessionStore::new(backend, js_sys::Date::now)),
        }
    }

    /// Load persisted photos. Resolves to the number restored.
    pub fn restore(&self) -> Promise {
        let session = Rc::clone(&self.session);
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            let photos = store.load().await;
            let mut session = session.borrow_mut();
            session.restore(photos);
            log::info!("Restored {} of {} photo(s)", session.len(), session.capacity());
            Ok(JsValue::from(session.len() as u32))
        })
    }

    /// Append a captured or uploaded photo. Resolves to its ordinal.
    pub fn push(&self, image: &JsRasterImage) -> Result<Promise, JsValue> {
        let ordinal = self
            .session
            .borrow_mut()
            .push(image.raster().clone())
            .map_err(to_js)?;
        Ok(self.persist(JsValue::from(ordinal as u32)))
    }

    /// Swap in a re-cropped photo.
    pub fn replace(&self, ordinal: usize, image: &JsRasterImage) -> Result<Promise, JsValue> {
        self.session
            .borrow_mut()
            .replace(ordinal, image.raster().clone())
            .map_err(to_js)?;
        Ok(self.persist(JsValue::UNDEFINED))
    }

    /// Remove one photo; later photos shift down.
    pub fn retake(&self, ordinal: usize) -> Result<Promise, JsValue> {
        self.session.borrow_mut().retake(ordinal).map_err(to_js)?;
        Ok(self.persist(JsValue::UNDEFINED))
    }

    /// Start over: drop every photo and the stored copy.
    pub fn retake_all(&self) -> Promise {
        self.session.borrow_mut().retake_all();
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            store.clear().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Add several uploads at once (all or nothing). Resolves to the
    /// assigned ordinals.
    pub fn add_uploads(&self, images: Vec<JsRasterImage>) -> Result<Promise, JsValue> {
        let rasters = images.into_iter().map(JsRasterImage::into_raster).collect();
        let ordinals = self
            .session
            .borrow_mut()
            .add_uploads(rasters)
            .map_err(to_js)?;
        let ordinals: Vec<u32> = ordinals.into_iter().map(|o| o as u32).collect();
        Ok(self.persist(js_sys::Uint32Array::from(ordinals.as_slice()).into()))
    }

    pub fn photo(&self, ordinal: usize) -> Option<JsRasterImage> {
        self.session
            .borrow()
            .get(ordinal)
            .map(|photo| JsRasterImage::from_raster(photo.image.as_ref().clone()))
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.session.borrow().len()
    }

    #[wasm_bindgen(getter)]
    pub fn is_empty(&self) -> bool {
        self.session.borrow().is_empty()
    }

    #[wasm_bindgen(getter)]
    pub fn capacity(&self) -> usize {
        self.session.borrow().capacity()
    }

    #[wasm_bindgen(getter)]
    pub fn remaining(&self) -> usize {
        self.session.borrow().remaining()
    }

    #[wasm_bindgen(getter)]
    pub fn is_complete(&self) -> bool {
        self.session.borrow().is_complete()
    }

    #[wasm_bindgen(getter)]
    pub fn storage_supported(&self) -> bool {
        self.store.is_supported()
    }
}

impl JsPhotoSession {
    /// Cheap snapshot of the current photos.
    pub(crate) fn photos(&self) -> Vec<Photo> {
        self.session.borrow().photos().to_vec()
    }

    pub(crate) fn photo_at(&self, ordinal: usize) -> Option<Photo> {
        self.session.borrow().get(ordinal).cloned()
    }

    /// Save the current snapshot, resolving to `result` afterwards.
    fn persist(&self, result: JsValue) -> Promise {
        let photos = self.photos();
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            store.save(&photos).await;
            Ok(result)
        })
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use photostrip_core::decode::RasterImage;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// Backend over a plain JS array held in a closure.
    fn array_backend() -> JsRecordBackend {
        let table = Function::new_no_args(
            "const t = { rows: [] };
             return {
               put: (r) => { t.rows = r; return Promise.resolve(); },
               get: () => Promise.resolve(t.rows),
               clear: () => { t.rows = []; return Promise.resolve(); },
             };",
        )
        .call0(&JsValue::NULL)
        .unwrap();
        let get = |name: &str| -> Function {
            js_sys::Reflect::get(&table, &JsValue::from_str(name))
                .unwrap()
                .into()
        };
        JsRecordBackend::new(get("put"), get("get"), get("clear"), true)
    }

    fn config(count: usize) -> JsBoothConfig {
        let value = js_sys::JSON::parse(&format!(r#"{{"layoutCount": {count}}}"#)).unwrap();
        JsBoothConfig::new(value).unwrap()
    }

    fn shot(shade: u8) -> JsRasterImage {
        JsRasterImage::from_raster(RasterImage::filled(4, 3, [shade, shade, shade, 255]))
    }

    #[wasm_bindgen_test]
    async fn test_push_past_capacity_throws() {
        let session = JsPhotoSession::new(&config(1), array_backend());
        JsFuture::from(session.push(&shot(10)).unwrap()).await.unwrap();
        assert!(session.is_complete());
        assert!(session.push(&shot(20)).is_err());
    }

    #[wasm_bindgen_test]
    async fn test_retake_shifts_later_photos() {
        let session = JsPhotoSession::new(&config(3), array_backend());
        for shade in [10, 20, 30] {
            JsFuture::from(session.push(&shot(shade)).unwrap()).await.unwrap();
        }
        JsFuture::from(session.retake(0).unwrap()).await.unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.photo(0).unwrap().pixels()[0], 20);
    }

    #[wasm_bindgen_test]
    async fn test_upload_overflow_adds_nothing() {
        let session = JsPhotoSession::new(&config(2), array_backend());
        assert!(session.add_uploads(vec![shot(1), shot(2), shot(3)]).is_err());
        assert_eq!(session.len(), 0);
    }

    #[wasm_bindgen_test]
    async fn test_failing_storage_keeps_memory_session() {
        let reject = Function::new_no_args("return Promise.reject('QuotaExceededError')");
        let backend = JsRecordBackend::new(reject.clone(), reject.clone(), reject, true);
        let session = JsPhotoSession::new(&config(2), backend);
        JsFuture::from(session.push(&shot(5)).unwrap()).await.unwrap();
        assert_eq!(session.len(), 1);
    }
}
