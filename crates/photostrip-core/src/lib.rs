//! Photostrip Core - capture-to-composite pipeline
//!
//! This crate provides the core of a photo booth: live capture into a
//! bounded photo session, local persistence of that session, an interactive
//! crop/rotate/zoom editor, a layered compositor that renders the photo
//! strip, and exporters for still, animated and print-ready artifacts.
//!
//! Platform collaborators (camera, local record store, image fetching,
//! printing) are reached through traits so the whole pipeline runs natively
//! in tests and in the browser through `photostrip-wasm`.

pub mod capture;
pub mod catalog;
pub mod color;
pub mod compositor;
pub mod config;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod export;
pub mod filter;
pub mod session;
pub mod style;
pub mod surface;
pub mod transform;

pub use capture::{CaptureError, CaptureState, CaptureUnit, FrameSource};
pub use catalog::{AssetCatalog, CatalogEvent, FrameTemplate, StickerAsset};
pub use color::Color;
pub use compositor::{ComposeError, ComposedStrip, Compositor, ImageLoader, MemoryLoader, StripLayout};
pub use config::{BoothConfig, ConfigError};
pub use decode::{DecodeError, RasterImage};
pub use editor::{AspectPreset, CropEditor, CropState, EditorError};
pub use encode::{EncodeError, StillFormat};
pub use export::{AnimatedArtifact, ExportError, Exporter, PrintPage, StaticArtifact};
pub use filter::PhotoFilter;
pub use session::{PersistentSession, Photo, PhotoSession, SessionError, SessionStore};
pub use style::{Sticker, StickerId, StickerLayer, StyleError, StyleState};
pub use surface::RasterSurface;
