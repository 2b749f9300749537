//! Image loading for templates and stickers.

use std::collections::HashMap;
use std::future::Future;

use crate::decode::{decode_image, DecodeError, RasterImage};

/// Resolves an image reference (URL) to a fully decoded raster.
pub trait ImageLoader {
    fn load(&self, src: &str) -> impl Future<Output = Result<RasterImage, DecodeError>>;
}

/// Loader over bytes fetched ahead of time, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(src.into(), bytes);
    }

    pub fn with(mut self, src: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(src, bytes);
        self
    }

    pub fn contains(&self, src: &str) -> bool {
        self.assets.contains_key(src)
    }
}

impl ImageLoader for MemoryLoader {
    async fn load(&self, src: &str) -> Result<RasterImage, DecodeError> {
        let bytes = self.assets.get(src).ok_or_else(|| DecodeError::FetchFailed {
            src: src.to_string(),
            reason: "not found".to_string(),
        })?;
        decode_image(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_png;
    use pollster::block_on;

    #[test]
    fn test_loads_inserted_bytes() {
        let png = encode_png(&RasterImage::filled(3, 2, [1, 2, 3, 255])).unwrap();
        let loader = MemoryLoader::new().with("a.png", png);
        assert!(loader.contains("a.png"));
        let image = block_on(loader.load("a.png")).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
    }

    #[test]
    fn test_missing_src_is_fetch_error() {
        let loader = MemoryLoader::new();
        assert!(matches!(
            block_on(loader.load("missing.png")),
            Err(DecodeError::FetchFailed { .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let loader = MemoryLoader::new().with("bad.png", vec![0, 1, 2, 3]);
        assert!(block_on(loader.load("bad.png")).is_err());
    }
}
