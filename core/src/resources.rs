use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::definition::PieceId;
use crate::error::AssetLoadError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Board,
    Original,
    Piece(PieceId),
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKey::Board => f.write_str("board image"),
            AssetKey::Original => f.write_str("original image"),
            AssetKey::Piece(id) => write!(f, "piece {id} image"),
        }
    }
}

/// Platform side of image loading.
#[allow(async_fn_in_trait)]
pub trait FetchBackend {
    type Image;
    type Error: fmt::Display;

    /// Decodes `url` directly, as an anonymous cross-origin request.
    async fn decode_direct(&self, url: &str) -> Result<Self::Image, Self::Error>;
    /// Fetches the bytes of `url` and returns an object URL for them.
    async fn fetch_object_url(&self, url: &str) -> Result<String, Self::Error>;
    async fn decode_object_url(&self, object_url: &str) -> Result<Self::Image, Self::Error>;
    fn revoke_object_url(&self, object_url: &str);
}

/// Loads images with a fetch-and-blob fallback and owns the object URLs the
/// fallback creates. At most one URL is live per key.
pub struct ResourceManager<B: FetchBackend> {
    backend: B,
    object_urls: RefCell<HashMap<AssetKey, String>>,
}

impl<B: FetchBackend> ResourceManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            object_urls: RefCell::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn load_texture(&self, key: AssetKey, source: &str) -> Result<B::Image, AssetLoadError> {
        let direct = match self.backend.decode_direct(source).await {
            Ok(image) => return Ok(image),
            Err(err) => err.to_string(),
        };
        self.load_via_object_url(&key, source)
            .await
            .map_err(|err| AssetLoadError {
                key: key.to_string(),
                direct,
                fallback: err.to_string(),
            })
    }

    async fn load_via_object_url(&self, key: &AssetKey, source: &str) -> Result<B::Image, B::Error> {
        let object_url = self.backend.fetch_object_url(source).await?;
        match self.backend.decode_object_url(&object_url).await {
            Ok(image) => {
                self.register(key.clone(), object_url);
                Ok(image)
            }
            Err(err) => {
                self.backend.revoke_object_url(&object_url);
                Err(err)
            }
        }
    }

    fn register(&self, key: AssetKey, object_url: String) {
        let previous = self.object_urls.borrow_mut().insert(key, object_url);
        if let Some(previous) = previous {
            self.backend.revoke_object_url(&previous);
        }
    }

    pub fn release(&self, key: &AssetKey) {
        let removed = self.object_urls.borrow_mut().remove(key);
        if let Some(object_url) = removed {
            self.backend.revoke_object_url(&object_url);
        }
    }

    pub fn release_all(&self) {
        let drained: Vec<String> = self.object_urls.borrow_mut().drain().map(|(_, url)| url).collect();
        for object_url in drained {
            self.backend.revoke_object_url(&object_url);
        }
    }

    pub fn live_urls(&self) -> usize {
        self.object_urls.borrow().len()
    }

    pub fn object_url(&self, key: &AssetKey) -> Option<String> {
        self.object_urls.borrow().get(key).cloned()
    }
}

impl<B: FetchBackend> Drop for ResourceManager<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}
