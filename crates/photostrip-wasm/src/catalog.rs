//! Frame template and sticker catalog bindings.
//!
//! Whatever syncs remote asset storage publishes fresh lists here; UI
//! components subscribe and re-read on change.

use js_sys::Function;
use photostrip_core::catalog::{AssetCatalog, CatalogEvent, CatalogSubscription, FrameTemplate, StickerAsset};
use wasm_bindgen::prelude::*;

use crate::types::{describe, to_js};

#[wasm_bindgen]
#[derive(Default)]
pub struct JsAssetCatalog {
    catalog: AssetCatalog,
}

/// Live subscription; call `free()` (or drop it) to unsubscribe.
#[wasm_bindgen]
pub struct JsCatalogSubscription {
    _subscription: CatalogSubscription,
}

fn event_name(event: CatalogEvent) -> &'static str {
    match event {
        CatalogEvent::TemplatesChanged => "templates",
        CatalogEvent::StickersChanged => "stickers",
    }
}

#[wasm_bindgen]
impl JsAssetCatalog {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsAssetCatalog {
        Self::default()
    }

    /// `callback` receives `"templates"` or `"stickers"`.
    pub fn subscribe(&self, callback: Function) -> JsCatalogSubscription {
        let subscription = self.catalog.subscribe(move |event| {
            let name = JsValue::from_str(event_name(event));
            if let Err(e) = callback.call1(&JsValue::NULL, &name) {
                log::warn!("Catalog listener threw: {}", describe(&e));
            }
        });
        JsCatalogSubscription {
            _subscription: subscription,
        }
    }

    /// Publish `[{name, imageUrl}]`.
    pub fn publish_templates(&self, templates: JsValue) -> Result<(), JsValue> {
        let templates: Vec<FrameTemplate> = serde_wasm_bindgen::from_value(templates).map_err(to_js)?;
        self.catalog.publish_templates(templates);
        Ok(())
    }

    /// Publish `[{imageUrl}]`.
    pub fn publish_stickers(&self, stickers: JsValue) -> Result<(), JsValue> {
        let stickers: Vec<StickerAsset> = serde_wasm_bindgen::from_value(stickers).map_err(to_js)?;
        self.catalog.publish_stickers(stickers);
        Ok(())
    }

    pub fn templates(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.catalog.templates()).map_err(to_js)
    }

    pub fn stickers(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.catalog.stickers()).map_err(to_js)
    }

    /// Image URL of the template called `name`, if any.
    pub fn template_url(&self, name: &str) -> Option<String> {
        self.catalog.template(name).map(|t| t.image_url)
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_publish_notifies_until_freed() {
        let catalog = JsAssetCatalog::new();
        let seen = Function::new_no_args("globalThis.__catalogEvents = []; return (e) => globalThis.__catalogEvents.push(e);")
            .call0(&JsValue::NULL)
            .unwrap();
        let subscription = catalog.subscribe(seen.into());

        let templates = js_sys::JSON::parse(r#"[{"name": "hearts", "imageUrl": "https://x/hearts.png"}]"#).unwrap();
        catalog.publish_templates(templates).unwrap();
        assert_eq!(catalog.template_url("hearts").as_deref(), Some("https://x/hearts.png"));

        drop(subscription);
        catalog.publish_stickers(js_sys::JSON::parse("[]").unwrap()).unwrap();

        let events = js_sys::eval("globalThis.__catalogEvents.length").unwrap();
        assert_eq!(events.as_f64(), Some(1.0));
    }
}
