//! Local persistence for the photo session.
//!
//! The store holds one logical table of `{ordinal, imageData, savedAt}`
//! records behind a [`RecordBackend`]. Saving is a full replace, so writing
//! the same sequence twice is observably a no-op, and loading always
//! returns photos in ordinal order regardless of write order.
//!
//! Every failure here is soft: it is logged and the in-memory session stays
//! authoritative.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Photo;
use crate::decode::decode_image_no_orientation;
use crate::encode::{encode_png, EncodeError};

/// Backend failures. Never escape [`SessionStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persistent storage is not available on this platform
    #[error("Local storage is not supported")]
    Unsupported,

    /// The backend rejected a read or write
    #[error("Storage backend failed: {0}")]
    Backend(String),

    /// A photo could not be serialized
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// One persisted photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub ordinal: usize,
    /// PNG-encoded raster
    pub image_data: Vec<u8>,
    /// Milliseconds since the Unix epoch
    pub saved_at: f64,
}

/// Record table the store persists into.
pub trait RecordBackend {
    /// Whether this platform can persist at all.
    fn is_supported(&self) -> bool;

    /// Replace the whole table with `records`.
    fn put_all(&self, records: Vec<PhotoRecord>) -> impl Future<Output = Result<(), StoreError>>;

    /// Read every record, in any order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<PhotoRecord>, StoreError>>;

    fn clear(&self) -> impl Future<Output = Result<(), StoreError>>;
}

/// In-process backend for native hosts and tests.
#[derive(Debug)]
pub struct MemoryBackend {
    records: RefCell<Vec<PhotoRecord>>,
    supported: bool,
    failing: Cell<bool>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RefCell::new(Vec::new()),
            supported: true,
            failing: Cell::new(false),
        }
    }

    /// Backend for a platform without local storage.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Make every subsequent operation fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Snapshot of the raw table.
    pub fn records(&self) -> Vec<PhotoRecord> {
        self.records.borrow().clone()
    }

    /// Overwrite the raw table, bypassing the store.
    pub fn seed(&self, records: Vec<PhotoRecord>) {
        *self.records.borrow_mut() = records;
    }

    fn check(&self) -> Result<(), StoreError> {
        if !self.supported {
            return Err(StoreError::Unsupported);
        }
        if self.failing.get() {
            return Err(StoreError::Backend("simulated failure".to_string()));
        }
        Ok(())
    }
}

impl RecordBackend for MemoryBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn put_all(&self, records: Vec<PhotoRecord>) -> Result<(), StoreError> {
        self.check()?;
        *self.records.borrow_mut() = records;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<PhotoRecord>, StoreError> {
        self.check()?;
        Ok(self.records.borrow().clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        self.records.borrow_mut().clear();
        Ok(())
    }
}

/// Soft-failing persistence facade over a [`RecordBackend`].
pub struct SessionStore<B> {
    backend: B,
    clock: Box<dyn Fn() -> f64>,
}

impl<B: RecordBackend> SessionStore<B> {
    /// Create a store stamping records with `clock()` (ms since epoch).
    pub fn new(backend: B, clock: impl Fn() -> f64 + 'static) -> Self {
        Self {
            backend,
            clock: Box::new(clock),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    fn to_records(&self, photos: &[Photo]) -> Result<Vec<PhotoRecord>, StoreError> {
        let saved_at = (self.clock)();
        photos
            .iter()
            .map(|photo| {
                Ok(PhotoRecord {
                    ordinal: photo.ordinal,
                    image_data: encode_png(&photo.image)?,
                    saved_at,
                })
            })
            .collect()
    }

    /// Replace the persisted sequence with `photos`.
    pub async fn save(&self, photos: &[Photo]) {
        if !self.is_supported() {
            return;
        }

        let records = match self.to_records(photos) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Session not persisted: {e}");
                return;
            }
        };

        match self.backend.put_all(records).await {
            Ok(()) => log::debug!("Persisted {} photo(s)", photos.len()),
            Err(e) => log::warn!("Session not persisted: {e}"),
        }
    }

    /// Load the persisted sequence, ordered by ordinal.
    ///
    /// Records that fail to decode are skipped; survivors are renumbered so
    /// ordinals stay contiguous.
    pub async fn load(&self) -> Vec<Photo> {
        if !self.is_supported() {
            return Vec::new();
        }

        let mut records = match self.backend.get_all().await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Could not restore session: {e}");
                return Vec::new();
            }
        };
        records.sort_by_key(|r| r.ordinal);

        let mut photos = Vec::with_capacity(records.len());
        for record in records {
            match decode_image_no_orientation(&record.image_data) {
                Ok(image) => photos.push(Photo {
                    ordinal: photos.len(),
                    image: Arc::new(image),
                }),
                Err(e) => log::warn!("Skipping stored photo {}: {e}", record.ordinal),
            }
        }
        photos
    }

    /// Drop everything persisted.
    pub async fn clear(&self) {
        if !self.is_supported() {
            return;
        }
        if let Err(e) = self.backend.clear().await {
            log::warn!("Could not clear stored session: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::RasterImage;
    use pollster::block_on;

    fn photo(ordinal: usize, shade: u8) -> Photo {
        Photo {
            ordinal,
            image: Arc::new(RasterImage::filled(6, 4, [shade, shade / 2, 255 - shade, 255])),
        }
    }

    fn store(backend: MemoryBackend) -> SessionStore<MemoryBackend> {
        SessionStore::new(backend, || 1_700_000_000_000.0)
    }

    #[test]
    fn test_round_trip_empty_one_and_full() {
        for count in [0usize, 1, 4] {
            let store = store(MemoryBackend::new());
            let photos: Vec<Photo> = (0..count).map(|i| photo(i, (i * 40) as u8)).collect();
            block_on(store.save(&photos));
            assert_eq!(block_on(store.load()), photos);
        }
    }

    #[test]
    fn test_load_sorts_by_ordinal() {
        let backend = MemoryBackend::new();
        let a = encode_png(&RasterImage::filled(2, 2, [1, 1, 1, 255])).unwrap();
        let b = encode_png(&RasterImage::filled(2, 2, [2, 2, 2, 255])).unwrap();
        backend.seed(vec![
            PhotoRecord {
                ordinal: 1,
                image_data: b,
                saved_at: 0.0,
            },
            PhotoRecord {
                ordinal: 0,
                image_data: a,
                saved_at: 0.0,
            },
        ]);
        let store = store(backend);
        let photos = block_on(store.load());
        assert_eq!(photos[0].image.get(0, 0), Some([1, 1, 1, 255]));
        assert_eq!(photos[1].image.get(0, 0), Some([2, 2, 2, 255]));
    }

    #[test]
    fn test_save_is_full_replace_and_idempotent() {
        let store = store(MemoryBackend::new());
        let three: Vec<Photo> = (0..3).map(|i| photo(i, 10)).collect();
        block_on(store.save(&three));
        block_on(store.save(&three[..1]));
        block_on(store.save(&three[..1]));
        assert_eq!(store.backend().records().len(), 1);
        assert_eq!(block_on(store.load()), three[..1].to_vec());
    }

    #[test]
    fn test_corrupt_record_skipped_and_renumbered() {
        let backend = MemoryBackend::new();
        let good = encode_png(&RasterImage::filled(2, 2, [9, 9, 9, 255])).unwrap();
        backend.seed(vec![
            PhotoRecord {
                ordinal: 0,
                image_data: vec![1, 2, 3],
                saved_at: 0.0,
            },
            PhotoRecord {
                ordinal: 1,
                image_data: good,
                saved_at: 0.0,
            },
        ]);
        let photos = block_on(store(backend).load());
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].ordinal, 0);
    }

    #[test]
    fn test_unsupported_backend_is_soft() {
        let store = store(MemoryBackend::unsupported());
        assert!(!store.is_supported());
        block_on(store.save(&[photo(0, 1)]));
        assert!(block_on(store.load()).is_empty());
        block_on(store.clear());
    }

    #[test]
    fn test_backend_failures_are_swallowed() {
        let store = store(MemoryBackend::new());
        block_on(store.save(&[photo(0, 1)]));
        store.backend().set_failing(true);
        block_on(store.save(&[photo(0, 2), photo(1, 3)]));
        assert!(block_on(store.load()).is_empty());
        block_on(store.clear());

        store.backend().set_failing(false);
        assert_eq!(block_on(store.load()), vec![photo(0, 1)]);
    }

    #[test]
    fn test_saved_at_from_clock() {
        let store = SessionStore::new(MemoryBackend::new(), || 42.0);
        block_on(store.save(&[photo(0, 1)]));
        assert_eq!(store.backend().records()[0].saved_at, 42.0);
    }

    #[test]
    fn test_clear() {
        let store = store(MemoryBackend::new());
        block_on(store.save(&[photo(0, 1)]));
        block_on(store.clear());
        assert!(block_on(store.load()).is_empty());
    }
}
