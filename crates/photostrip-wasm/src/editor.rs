//! Crop editor bindings.
//!
//! Pointer coordinates are in display pixels of the preview element; call
//! `set_display_size` whenever the element is laid out.
//!
//! ```typescript
//! const editor = new JsCropEditor(session, 0, config);
//! editor.set_display_size(canvas.clientWidth, canvas.clientHeight);
//! canvas.onpointerdown = (e) => editor.begin_drag(e.offsetX, e.offsetY);
//! canvas.onpointermove = (e) => { editor.on_drag(e.offsetX, e.offsetY); draw(editor.render_preview()); };
//! const ordinal = editor.ordinal;
//! await session.replace(ordinal, editor.commit());
//! ```

use photostrip_core::editor::{AspectPreset, CropEditor, DragMode};
use photostrip_core::transform::Rect;
use wasm_bindgen::prelude::*;

use crate::config::JsBoothConfig;
use crate::session::JsPhotoSession;
use crate::types::{to_js, JsRasterImage};

/// An open edit of one session photo.
#[wasm_bindgen]
pub struct JsCropEditor {
    editor: CropEditor,
}

#[wasm_bindgen]
impl JsCropEditor {
    /// Open the editor on the photo at `ordinal`.
    #[wasm_bindgen(constructor)]
    pub fn new(session: &JsPhotoSession, ordinal: usize, config: &JsBoothConfig) -> Result<JsCropEditor, JsValue> {
        let photo = session
            .photo_at(ordinal)
            .ok_or_else(|| JsValue::from_str(&format!("No photo at position {ordinal}")))?;
        Ok(Self {
            editor: CropEditor::open(photo, &config.inner().editor),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn ordinal(&self) -> usize {
        self.editor.photo().ordinal
    }

    pub fn set_display_size(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.editor.set_display_size(width, height).map_err(to_js)
    }

    /// Start a gesture. Returns `"resize"`, `"drag"` or `"none"`.
    pub fn begin_drag(&mut self, x: f64, y: f64) -> String {
        match self.editor.begin_drag(x, y) {
            DragMode::Resizing { .. } => "resize",
            DragMode::Dragging { .. } => "drag",
            DragMode::None => "none",
        }
        .to_string()
    }

    pub fn on_drag(&mut self, x: f64, y: f64) {
        self.editor.on_drag(x, y);
    }

    pub fn end_drag(&mut self) {
        self.editor.end_drag();
    }

    /// Rotate by +90 or -90 degrees; returns the new rotation.
    pub fn rotate(&mut self, delta_degrees: i32) -> Result<u16, JsValue> {
        self.editor.rotate(delta_degrees).map_err(to_js)
    }

    pub fn rotate_left(&mut self) -> u16 {
        self.editor.rotate_left()
    }

    pub fn rotate_right(&mut self) -> u16 {
        self.editor.rotate_right()
    }

    /// Returns the zoom actually applied after clamping.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.editor.set_zoom(zoom)
    }

    /// Lock the box to `ratio` (width / height), or unlock with `undefined`.
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> Result<(), JsValue> {
        self.editor.set_aspect_ratio(ratio).map_err(to_js)
    }

    /// `"free"`, `"square"`, `"fourThree"`, `"threeFour"` or `"sixteenNine"`.
    pub fn set_preset(&mut self, preset: JsValue) -> Result<(), JsValue> {
        let preset: AspectPreset = serde_wasm_bindgen::from_value(preset).map_err(to_js)?;
        self.editor.set_preset(preset);
        Ok(())
    }

    /// Set the crop box in source pixels.
    pub fn set_crop_box(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), JsValue> {
        self.editor
            .set_crop_box(Rect::new(x, y, width, height))
            .map_err(to_js)
    }

    /// `{cropBox, zoom, rotationDegrees, aspectRatio}`.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.editor.state()).map_err(to_js)
    }

    pub fn render_preview(&self) -> JsRasterImage {
        JsRasterImage::from_raster(self.editor.render_preview())
    }

    /// Close the editor and return the cropped photo.
    pub fn commit(self) -> JsRasterImage {
        let photo = self.editor.commit();
        JsRasterImage::from_raster(photo.image.as_ref().clone())
    }

    /// Close the editor, leaving the photo untouched.
    pub fn cancel(self) {
        self.editor.cancel();
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::session::JsRecordBackend;
    use js_sys::Function;
    use photostrip_core::decode::RasterImage;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn session_with_photo(width: u32, height: u32) -> JsPhotoSession {
        let ok = Function::new_no_args("return Promise.resolve()");
        let backend = JsRecordBackend::new(ok.clone(), ok.clone(), ok, false);
        let session = JsPhotoSession::new(&JsBoothConfig::default(), backend);
        let photo = JsRasterImage::from_raster(RasterImage::filled(width, height, [9, 9, 9, 255]));
        JsFuture::from(session.push(&photo).unwrap()).await.unwrap();
        session
    }

    #[wasm_bindgen_test]
    async fn test_missing_photo_errors() {
        let session = session_with_photo(40, 30).await;
        assert!(JsCropEditor::new(&session, 3, &JsBoothConfig::default()).is_err());
    }

    #[wasm_bindgen_test]
    async fn test_square_preset_commit() {
        let session = session_with_photo(40, 30).await;
        let mut editor = JsCropEditor::new(&session, 0, &JsBoothConfig::default()).unwrap();
        editor.set_preset(JsValue::from_str("square")).unwrap();
        let cropped = editor.commit();
        assert_eq!((cropped.width(), cropped.height()), (30, 30));
    }

    #[wasm_bindgen_test]
    async fn test_rejects_odd_rotation() {
        let session = session_with_photo(40, 30).await;
        let mut editor = JsCropEditor::new(&session, 0, &JsBoothConfig::default()).unwrap();
        assert!(editor.rotate(45).is_err());
        assert_eq!(editor.rotate_right(), 90);
        assert_eq!(editor.rotate(-90).unwrap(), 0);
    }
}
