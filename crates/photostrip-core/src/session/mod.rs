//! The in-progress photo session.
//!
//! A [`PhotoSession`] is the ordered, capacity-bounded sequence of photos
//! for one booth attempt. Ordinals are always `0..len` and contiguous:
//! removals renumber the survivors. Mutations are all-or-nothing.
//!
//! [`PersistentSession`] couples a session with a [`SessionStore`] and
//! persists after every mutation.

mod store;

pub use store::{MemoryBackend, PhotoRecord, RecordBackend, SessionStore, StoreError};

use std::sync::Arc;

use thiserror::Error;

use crate::decode::RasterImage;

/// Session constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("All {capacity} photos have already been taken")]
    SessionFull { capacity: usize },

    #[error("No photo at position {ordinal} (session holds {len})")]
    NoSuchPhoto { ordinal: usize, len: usize },

    #[error("Cannot add {requested} photo(s): only {remaining} slot(s) left")]
    TooManyPhotos { requested: usize, remaining: usize },

    #[error("Photo has no pixels")]
    EmptyImage,
}

/// An immutable raster at a position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub ordinal: usize,
    pub image: Arc<RasterImage>,
}

impl Photo {
    pub fn new(ordinal: usize, image: RasterImage) -> Self {
        Self {
            ordinal,
            image: Arc::new(image),
        }
    }
}

/// Ordered photos plus capture progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoSession {
    capacity: usize,
    photos: Vec<Photo>,
}

impl PhotoSession {
    /// Empty session for a layout of `capacity` photos.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            photos: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Photo> {
        self.photos.get(ordinal)
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.photos.len())
    }

    pub fn is_complete(&self) -> bool {
        self.photos.len() >= self.capacity
    }

    /// `(taken, target)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.photos.len(), self.capacity)
    }

    /// Append a photo; returns its ordinal.
    pub fn push(&mut self, image: RasterImage) -> Result<usize, SessionError> {
        if image.is_empty() {
            return Err(SessionError::EmptyImage);
        }
        if self.is_complete() {
            return Err(SessionError::SessionFull {
                capacity: self.capacity,
            });
        }
        let ordinal = self.photos.len();
        self.photos.push(Photo::new(ordinal, image));
        Ok(ordinal)
    }

    /// Swap in a new raster at `ordinal` (re-crop).
    pub fn replace(&mut self, ordinal: usize, image: RasterImage) -> Result<(), SessionError> {
        if image.is_empty() {
            return Err(SessionError::EmptyImage);
        }
        let len = self.photos.len();
        let slot = self
            .photos
            .get_mut(ordinal)
            .ok_or(SessionError::NoSuchPhoto { ordinal, len })?;
        *slot = Photo::new(ordinal, image);
        Ok(())
    }

    /// Remove one photo; later photos move up by one.
    pub fn retake(&mut self, ordinal: usize) -> Result<Photo, SessionError> {
        if ordinal >= self.photos.len() {
            return Err(SessionError::NoSuchPhoto {
                ordinal,
                len: self.photos.len(),
            });
        }
        let removed = self.photos.remove(ordinal);
        self.renumber();
        Ok(removed)
    }

    pub fn retake_all(&mut self) {
        self.photos.clear();
    }

    /// Append several uploaded photos at once.
    ///
    /// Either every image is added or none is. Returns the ordinals assigned.
    pub fn add_uploads(&mut self, images: Vec<RasterImage>) -> Result<Vec<usize>, SessionError> {
        let remaining = self.remaining();
        if images.len() > remaining {
            return Err(SessionError::TooManyPhotos {
                requested: images.len(),
                remaining,
            });
        }
        if images.iter().any(RasterImage::is_empty) {
            return Err(SessionError::EmptyImage);
        }

        let start = self.photos.len();
        for image in images {
            let ordinal = self.photos.len();
            self.photos.push(Photo::new(ordinal, image));
        }
        Ok((start..self.photos.len()).collect())
    }

    /// Replace the contents with previously persisted photos, keeping at
    /// most `capacity` of them.
    pub fn restore(&mut self, photos: Vec<Photo>) {
        self.photos = photos;
        self.photos.truncate(self.capacity);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (i, photo) in self.photos.iter_mut().enumerate() {
            photo.ordinal = i;
        }
    }
}

/// A session that persists itself after every mutation.
pub struct PersistentSession<B> {
    session: PhotoSession,
    store: SessionStore<B>,
}

impl<B: RecordBackend> PersistentSession<B> {
    pub fn new(capacity: usize, store: SessionStore<B>) -> Self {
        Self {
            session: PhotoSession::new(capacity),
            store,
        }
    }

    pub fn session(&self) -> &PhotoSession {
        &self.session
    }

    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    /// Load whatever was persisted; returns the number of restored photos.
    pub async fn restore(&mut self) -> usize {
        let photos = self.store.load().await;
        self.session.restore(photos);
        log::info!(
            "Restored {} of {} photo(s)",
            self.session.len(),
            self.session.capacity()
        );
        self.session.len()
    }

    async fn persist(&self) {
        self.store.save(self.session.photos()).await;
    }

    pub async fn push(&mut self, image: RasterImage) -> Result<usize, SessionError> {
        let ordinal = self.session.push(image)?;
        self.persist().await;
        Ok(ordinal)
    }

    pub async fn replace(&mut self, ordinal: usize, image: RasterImage) -> Result<(), SessionError> {
        self.session.replace(ordinal, image)?;
        self.persist().await;
        Ok(())
    }

    pub async fn retake(&mut self, ordinal: usize) -> Result<Photo, SessionError> {
        let removed = self.session.retake(ordinal)?;
        self.persist().await;
        Ok(removed)
    }

    pub async fn retake_all(&mut self) {
        self.session.retake_all();
        self.store.clear().await;
    }

    pub async fn add_uploads(&mut self, images: Vec<RasterImage>) -> Result<Vec<usize>, SessionError> {
        let ordinals = self.session.add_uploads(images)?;
        self.persist().await;
        Ok(ordinals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    fn img(shade: u8) -> RasterImage {
        RasterImage::filled(4, 3, [shade, shade, shade, 255])
    }

    fn shades(session: &PhotoSession) -> Vec<u8> {
        session
            .photos()
            .iter()
            .map(|p| p.image.get(0, 0).map(|px| px[0]).unwrap_or(0))
            .collect()
    }

    #[test]
    fn test_push_until_full() {
        let mut session = PhotoSession::new(2);
        assert_eq!(session.push(img(1)), Ok(0));
        assert_eq!(session.push(img(2)), Ok(1));
        assert!(session.is_complete());
        assert_eq!(session.push(img(3)), Err(SessionError::SessionFull { capacity: 2 }));
        assert_eq!(session.progress(), (2, 2));
    }

    #[test]
    fn test_push_rejects_empty() {
        let mut session = PhotoSession::new(2);
        assert_eq!(
            session.push(RasterImage::new(0, 0, vec![])),
            Err(SessionError::EmptyImage)
        );
        assert!(session.is_empty());
    }

    #[test]
    fn test_retake_renumbers() {
        let mut session = PhotoSession::new(4);
        for s in [10, 20, 30] {
            session.push(img(s)).unwrap();
        }
        let removed = session.retake(1).unwrap();
        assert_eq!(removed.ordinal, 1);
        assert_eq!(shades(&session), vec![10, 30]);
        let ordinals: Vec<usize> = session.photos().iter().map(|p| p.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
        assert_eq!(session.remaining(), 2);
    }

    #[test]
    fn test_retake_out_of_range() {
        let mut session = PhotoSession::new(4);
        session.push(img(1)).unwrap();
        assert_eq!(
            session.retake(3),
            Err(SessionError::NoSuchPhoto { ordinal: 3, len: 1 })
        );
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut session = PhotoSession::new(3);
        session.push(img(1)).unwrap();
        session.push(img(2)).unwrap();
        session.replace(0, img(9)).unwrap();
        assert_eq!(shades(&session), vec![9, 2]);
        assert_eq!(session.get(0).map(|p| p.ordinal), Some(0));
        assert!(session.replace(5, img(1)).is_err());
    }

    #[test]
    fn test_retake_all() {
        let mut session = PhotoSession::new(3);
        session.push(img(1)).unwrap();
        session.retake_all();
        assert!(session.is_empty());
        assert_eq!(session.remaining(), 3);
    }

    #[test]
    fn test_add_uploads_all_or_nothing() {
        let mut session = PhotoSession::new(4);
        session.push(img(1)).unwrap();
        let err = session.add_uploads(vec![img(2), img(3), img(4), img(5)]);
        assert_eq!(
            err,
            Err(SessionError::TooManyPhotos {
                requested: 4,
                remaining: 3
            })
        );
        assert_eq!(session.len(), 1);

        assert_eq!(session.add_uploads(vec![img(2), img(3)]), Ok(vec![1, 2]));
        assert_eq!(shades(&session), vec![1, 2, 3]);
    }

    #[test]
    fn test_restore_truncates_to_capacity() {
        let mut session = PhotoSession::new(2);
        session.restore(vec![
            Photo::new(0, img(1)),
            Photo::new(1, img(2)),
            Photo::new(2, img(3)),
        ]);
        assert_eq!(shades(&session), vec![1, 2]);
    }

    fn persistent(capacity: usize) -> PersistentSession<MemoryBackend> {
        PersistentSession::new(capacity, SessionStore::new(MemoryBackend::new(), || 0.0))
    }

    #[test]
    fn test_persistent_session_saves_after_each_mutation() {
        let mut session = persistent(3);
        block_on(session.push(img(1))).unwrap();
        block_on(session.push(img(2))).unwrap();
        assert_eq!(session.store().backend().records().len(), 2);

        block_on(session.retake(0)).unwrap();
        let stored = block_on(session.store().load());
        assert_eq!(stored, session.session().photos().to_vec());

        block_on(session.retake_all());
        assert!(session.store().backend().records().is_empty());
    }

    #[test]
    fn test_persistent_session_restore() {
        let mut first = persistent(3);
        block_on(first.add_uploads(vec![img(5), img(6)])).unwrap();
        let records = first.store().backend().records();

        let backend = MemoryBackend::new();
        backend.seed(records);
        let mut second = PersistentSession::new(3, SessionStore::new(backend, || 0.0));
        assert_eq!(block_on(second.restore()), 2);
        assert_eq!(second.session().photos(), first.session().photos());
    }

    #[test]
    fn test_failed_mutation_does_not_persist() {
        let mut session = persistent(1);
        block_on(session.push(img(1))).unwrap();
        assert!(block_on(session.push(img(2))).is_err());
        assert_eq!(session.store().backend().records().len(), 1);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_authoritative() {
        let mut session = persistent(2);
        session.store().backend().set_failing(true);
        assert_eq!(block_on(session.push(img(1))), Ok(0));
        assert_eq!(session.session().len(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Push,
        Retake(usize),
        Upload(usize),
        RetakeAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Push),
            (0usize..10).prop_map(Op::Retake),
            (0usize..5).prop_map(Op::Upload),
            Just(Op::RetakeAll),
        ]
    }

    proptest! {
        #[test]
        fn prop_ordinals_contiguous_and_bounded(
            capacity in 1usize..8,
            ops in proptest::collection::vec(op(), 0..40),
        ) {
            let mut session = PhotoSession::new(capacity);
            for op in ops {
                let _ = match op {
                    Op::Push => session.push(RasterImage::filled(1, 1, [0, 0, 0, 255])).map(|_| ()),
                    Op::Retake(i) => session.retake(i).map(|_| ()),
                    Op::Upload(n) => session
                        .add_uploads(vec![RasterImage::filled(1, 1, [1, 1, 1, 255]); n])
                        .map(|_| ()),
                    Op::RetakeAll => {
                        session.retake_all();
                        Ok(())
                    }
                };
                prop_assert!(session.len() <= capacity);
                for (i, photo) in session.photos().iter().enumerate() {
                    prop_assert_eq!(photo.ordinal, i);
                }
            }
        }
    }
}
