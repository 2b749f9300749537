//! Booth configuration passed in from JavaScript.

use crate::types::to_js;
use photostrip_core::config::BoothConfig;
use wasm_bindgen::prelude::*;

/// Validated booth configuration.
///
/// ```typescript
/// const config = new JsBoothConfig({ layoutCount: 3, export: { printDpi: 300 } });
/// ```
#[wasm_bindgen]
#[derive(Debug, Clone, Default)]
pub struct JsBoothConfig {
    inner: BoothConfig,
}

#[wasm_bindgen]
impl JsBoothConfig {
    /// Build from a (possibly partial) plain object; `undefined` gives the
    /// defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(value: JsValue) -> Result<JsBoothConfig, JsValue> {
        let inner: BoothConfig = if value.is_undefined() || value.is_null() {
            BoothConfig::default()
        } else {
            serde_wasm_bindgen::from_value(value).map_err(to_js)?
        };
        inner.validate().map_err(to_js)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn layout_count(&self) -> usize {
        self.inner.layout_count
    }

    /// The full configuration with defaults filled in.
    pub fn to_object(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(to_js)
    }
}

impl JsBoothConfig {
    pub(crate) fn inner(&self) -> &BoothConfig {
        &self.inner
    }
}
