//! Selectable frame templates and stickers.
//!
//! The lists are owned by whatever manages remote asset storage. It pushes
//! refreshed lists through [`AssetCatalog::publish_templates`] /
//! [`AssetCatalog::publish_stickers`]; interested parties either pull the
//! current lists or subscribe for change notifications. Entries are opaque
//! fetchable image URLs.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTemplate {
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerAsset {
    pub image_url: String,
}

/// Which list changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEvent {
    TemplatesChanged,
    StickersChanged,
}

pub type CatalogListener = Rc<dyn Fn(CatalogEvent)>;

/// Keeps a listener registered until dropped.
pub struct CatalogSubscription {
    listener: CatalogListener,
    listeners: Rc<RefCell<Vec<CatalogListener>>>,
}

impl Drop for CatalogSubscription {
    fn drop(&mut self) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|item| !Rc::ptr_eq(item, &self.listener));
    }
}

#[derive(Default)]
pub struct AssetCatalog {
    templates: RefCell<Vec<FrameTemplate>>,
    stickers: RefCell<Vec<StickerAsset>>,
    listeners: Rc<RefCell<Vec<CatalogListener>>>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(CatalogEvent) + 'static) -> CatalogSubscription {
        let listener: CatalogListener = Rc::new(listener);
        self.listeners.borrow_mut().push(listener.clone());
        CatalogSubscription {
            listener,
            listeners: Rc::clone(&self.listeners),
        }
    }

    fn notify(&self, event: CatalogEvent) {
        // Listeners may pull from the catalog or subscribe again
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn publish_templates(&self, templates: Vec<FrameTemplate>) {
        log::debug!("Frame templates updated ({} available)", templates.len());
        *self.templates.borrow_mut() = templates;
        self.notify(CatalogEvent::TemplatesChanged);
    }

    pub fn publish_stickers(&self, stickers: Vec<StickerAsset>) {
        log::debug!("Stickers updated ({} available)", stickers.len());
        *self.stickers.borrow_mut() = stickers;
        self.notify(CatalogEvent::StickersChanged);
    }

    pub fn templates(&self) -> Vec<FrameTemplate> {
        self.templates.borrow().clone()
    }

    pub fn stickers(&self) -> Vec<StickerAsset> {
        self.stickers.borrow().clone()
    }

    pub fn template(&self, name: &str) -> Option<FrameTemplate> {
        self.templates.borrow().iter().find(|t| t.name == name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn template(name: &str) -> FrameTemplate {
        FrameTemplate {
            name: name.to_string(),
            image_url: format!("https://assets.example/{name}.png"),
        }
    }

    #[test]
    fn test_pull_after_publish() {
        let catalog = AssetCatalog::new();
        assert!(catalog.templates().is_empty());
        catalog.publish_templates(vec![template("hearts"), template("stars")]);
        assert_eq!(catalog.templates().len(), 2);
        assert_eq!(catalog.template("stars"), Some(template("stars")));
        assert_eq!(catalog.template("nope"), None);
    }

    #[test]
    fn test_subscribers_notified_and_can_pull() {
        let catalog = Rc::new(AssetCatalog::new());
        let seen = Rc::new(Cell::new(0usize));

        let _sub = {
            let seen = Rc::clone(&seen);
            let pulled = Rc::clone(&catalog);
            catalog.subscribe(move |event| {
                if event == CatalogEvent::StickersChanged {
                    seen.set(pulled.stickers().len());
                }
            })
        };

        catalog.publish_stickers(vec![
            StickerAsset {
                image_url: "a.png".to_string(),
            },
            StickerAsset {
                image_url: "b.png".to_string(),
            },
        ]);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let catalog = AssetCatalog::new();
        let calls = Rc::new(Cell::new(0usize));

        let sub = {
            let calls = Rc::clone(&calls);
            catalog.subscribe(move |_| calls.set(calls.get() + 1))
        };
        catalog.publish_templates(vec![]);
        drop(sub);
        catalog.publish_templates(vec![]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&template("x")).unwrap();
        assert!(json.contains("\"imageUrl\""));
    }
}
