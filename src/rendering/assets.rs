//! Icon assets: where they come from, how they are decoded, and the load state machine that
//! gates sprite creation.

use crate::{layers::marker::IconId, MapError, Result};
use async_trait::async_trait;
use crossbeam_channel::Receiver;
use fxhash::FxHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc, time::Duration};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("spritelet/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build reqwest async client")
});

/// One `alias -> source` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub alias: IconId,
    pub src: String,
}

/// The named set of icons loaded once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub entries: Vec<AssetEntry>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, alias: impl Into<IconId>, src: impl Into<String>) -> Self {
        self.entries.push(AssetEntry {
            alias: alias.into(),
            src: src.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches raw image bytes for a manifest source string
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>>;
}

/// Fetches sources as URLs
#[derive(Debug, Clone, Default)]
pub struct HttpAssetSource {
    base_url: Option<String>,
}

impl HttpAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative sources such as `/bluebird-arrow.png` against `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }

    fn resolve(&self, src: &str) -> String {
        match &self.base_url {
            Some(base) if !src.contains("://") => {
                format!("{}/{}", base.trim_end_matches('/'), src.trim_start_matches('/'))
            }
            _ => src.to_string(),
        }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>> {
        let url = self.resolve(src);
        log::debug!("fetching asset {}", url);
        let response = HTTP_CLIENT
            .get(&url)
            .send()
            .await
            .map_err(MapError::from)?
            .error_for_status()
            .map_err(MapError::from)?;
        let bytes = response.bytes().await.map_err(MapError::from)?;
        Ok(bytes.to_vec())
    }
}

/// Reads sources as paths relative to a root directory
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, src: &str) -> PathBuf {
        self.root.join(src.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetSource for FileAssetSource {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>> {
        let path = self.resolve(src);
        #[cfg(feature = "tokio-runtime")]
        let bytes = tokio::fs::read(&path).await.map_err(MapError::from)?;
        #[cfg(not(feature = "tokio-runtime"))]
        let bytes = std::fs::read(&path).map_err(MapError::from)?;
        Ok(bytes)
    }
}

/// Serves encoded images held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    files: FxHashMap<String, Arc<[u8]>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, src: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.files.insert(src.into(), bytes.into());
        self
    }
}

#[async_trait]
impl AssetSource for MemoryAssetSource {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>> {
        self.files
            .get(src)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| MapError::Asset(format!("no in-memory asset at {}", src)).into())
    }
}

/// Decoded RGBA8 image plus the slot it occupies in the renderer's texture array
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub slot: u32,
    pub rgba: Arc<[u8]>,
}

impl Texture {
    /// Zero-sized placeholder used for icons missing from the registry
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            slot: u32::MAX,
            rgba: Arc::from(Vec::new()),
        }
    }

    /// Single-colour texture, handy for generated icons
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels: Vec<u8> = rgba
            .iter()
            .copied()
            .cycle()
            .take(rgba_len(width, height))
            .collect();
        Self {
            width,
            height,
            slot: 0,
            rgba: Arc::from(pixels),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(MapError::from)?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            slot: 0,
            rgba: Arc::from(image.into_raw()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }
}

/// Byte length of an RGBA8 buffer, computed without `u32` overflow
fn rgba_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Loaded icons by alias
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    textures: FxHashMap<IconId, Arc<Texture>>,
    order: Vec<IconId>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a texture; slots follow insertion order
    pub fn insert(&mut self, alias: impl Into<IconId>, mut texture: Texture) {
        let alias = alias.into();
        texture.slot = match self.order.iter().position(|a| a == &alias) {
            Some(existing) => existing as u32,
            None => {
                self.order.push(alias.clone());
                (self.order.len() - 1) as u32
            }
        };
        self.textures.insert(alias, Arc::new(texture));
    }

    pub fn get(&self, alias: &IconId) -> Option<&Arc<Texture>> {
        self.textures.get(alias)
    }

    /// Aliases with their textures in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&IconId, &Arc<Texture>)> {
        self.order
            .iter()
            .filter_map(move |alias| self.textures.get(alias).map(|t| (alias, t)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Fetches and decodes every manifest entry; any failure fails the whole load
pub async fn load_registry(manifest: &AssetManifest, source: &dyn AssetSource) -> Result<AssetRegistry> {
    let fetches = manifest.entries.iter().map(|entry| async move {
        let bytes = source.fetch(&entry.src).await?;
        let texture = Texture::decode(&bytes)?;
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>((entry.alias.clone(), texture))
    });

    let mut registry = AssetRegistry::new();
    for loaded in futures::future::join_all(fetches).await {
        let (alias, texture) = loaded?;
        log::debug!("loaded asset {} ({}x{})", alias, texture.width, texture.height);
        registry.insert(alias, texture);
    }
    Ok(registry)
}

/// Asset lifecycle of a marker layer; sprites can only be created from `Loaded`
#[derive(Debug, Default)]
pub enum AssetState {
    #[default]
    Unloaded,
    Loading(Receiver<Result<AssetRegistry>>),
    Loaded(Arc<AssetRegistry>),
    /// The one-time load failed; nothing will be drawn
    Failed(String),
}

impl AssetState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, AssetState::Loaded(_))
    }

    pub fn registry(&self) -> Option<&Arc<AssetRegistry>> {
        match self {
            AssetState::Loaded(registry) => Some(registry),
            _ => None,
        }
    }

    /// Advances `Loading` when its result has arrived; returns true on the transition to `Loaded`
    pub fn poll(&mut self) -> bool {
        let AssetState::Loading(receiver) = self else {
            return false;
        };
        match receiver.try_recv() {
            Ok(Ok(registry)) => {
                log::debug!("{} marker assets ready", registry.len());
                *self = AssetState::Loaded(Arc::new(registry));
                true
            }
            Ok(Err(e)) => {
                log::error!("failed to load marker assets: {}", e);
                *self = AssetState::Failed(e.to_string());
                false
            }
            Err(crossbeam_channel::TryRecvError::Empty) => false,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                log::error!("marker asset loader exited without a result");
                *self = AssetState::Failed("loader disconnected".to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 90, 200, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let texture = Texture::decode(&png_bytes(25, 41)).unwrap();
        assert_eq!((texture.width, texture.height), (25, 41));
        assert_eq!(texture.rgba.len(), 25 * 41 * 4);
    }

    #[test]
    fn test_solid_texture_size() {
        let texture = Texture::solid(3, 5, [1, 2, 3, 4]);
        assert_eq!(texture.rgba.len(), 3 * 5 * 4);
        assert_eq!(&texture.rgba[..4], &[1, 2, 3, 4]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_rgba_len_past_u32_range() {
        assert_eq!(rgba_len(65_536, 65_536), 1usize << 34);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Texture::decode(b"definitely not an image").is_err());
    }

    #[test]
    fn test_registry_slots_follow_insertion_order() {
        let mut registry = AssetRegistry::new();
        registry.insert("a", Texture::solid(2, 2, [0, 0, 0, 255]));
        registry.insert("b", Texture::solid(2, 2, [0, 0, 0, 255]));
        registry.insert("a", Texture::solid(4, 4, [0, 0, 0, 255]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&IconId::new("a")).unwrap().slot, 0);
        assert_eq!(registry.get(&IconId::new("a")).unwrap().width, 4);
        assert_eq!(registry.get(&IconId::new("b")).unwrap().slot, 1);
    }

    #[test]
    fn test_http_source_resolves_relative_paths() {
        let source = HttpAssetSource::with_base_url("http://localhost:8080/");
        assert_eq!(
            source.resolve("/bluebird-arrow.png"),
            "http://localhost:8080/bluebird-arrow.png"
        );
        assert_eq!(source.resolve("https://cdn/x.png"), "https://cdn/x.png");
    }

    #[test]
    fn test_load_registry_from_memory() {
        let source = MemoryAssetSource::new().with_file("/bluebird-arrow.png", png_bytes(8, 12));
        let manifest = AssetManifest::new().with_asset("bluebird-arrow", "/bluebird-arrow.png");

        let registry = futures::executor::block_on(load_registry(&manifest, &source)).unwrap();
        let texture = registry.get(&IconId::new("bluebird-arrow")).unwrap();
        assert_eq!((texture.width, texture.height), (8, 12));
    }

    #[test]
    fn test_missing_source_fails_load() {
        let manifest = AssetManifest::new().with_asset("pin", "/missing.png");
        let result = futures::executor::block_on(load_registry(&manifest, &MemoryAssetSource::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_state_poll_transitions() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let mut state = AssetState::Loading(receiver);

        assert!(!state.poll());
        assert!(matches!(state, AssetState::Loading(_)));

        sender.send(Ok(AssetRegistry::new())).unwrap();
        assert!(state.poll());
        assert!(state.is_loaded());
        assert!(!state.poll());
    }

    #[test]
    fn test_state_poll_failure() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let mut state = AssetState::Loading(receiver);
        sender.send(Err("boom".into())).unwrap();

        assert!(!state.poll());
        assert!(matches!(state, AssetState::Failed(_)));
    }
}
