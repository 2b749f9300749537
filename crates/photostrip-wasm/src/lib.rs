//! Photostrip WASM - WebAssembly bindings for the photo booth pipeline
//!
//! This crate exposes `photostrip-core` to a browser front end. The
//! browser keeps the platform pieces (camera stream, IndexedDB, `fetch`,
//! the print dialog) and hands them in as callbacks; everything else runs
//! here.
//!
//! # Module Structure
//!
//! - `types` - JS wrapper for RGBA rasters
//! - `config` - Booth configuration from a plain object
//! - `decode` / `encode` - Single-image decoding and encoding
//! - `capture` - Guarded still capture over JS-pushed video frames
//! - `session` - Photo session persisted through JS record callbacks
//! - `editor` - Crop/rotate/zoom editor
//! - `catalog` - Frame template and sticker lists
//! - `compose` / `export` - Strip composition, exports and share planning
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsBoothConfig, JsCaptureUnit, JsPhotoSession } from '@photostrip/wasm';
//!
//! await init();
//! const config = new JsBoothConfig({ layoutCount: 4 });
//! const session = new JsPhotoSession(config, backend);
//! await session.restore();
//! ```

use wasm_bindgen::prelude::*;

mod capture;
mod catalog;
mod compose;
mod config;
mod decode;
mod editor;
mod encode;
mod export;
mod session;
mod types;

// Re-export public types
pub use capture::{JsCaptureUnit, LiveSource};
pub use catalog::{JsAssetCatalog, JsCatalogSubscription};
pub use compose::{JsComposer, JsImageLoader};
pub use config::JsBoothConfig;
pub use decode::{decode_image, get_orientation};
pub use editor::JsCropEditor;
pub use encode::{encode_jpeg, encode_png};
pub use export::{download_name, plan_share, JsPrintPage};
pub use session::{JsPhotoSession, JsRecordBackend};
pub use types::JsRasterImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Already initialized by an earlier instance
        return;
    }
    log::info!("photostrip-wasm {} ready", version());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
