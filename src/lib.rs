//! # Spritelet
//!
//! Viewport-synchronized sprite markers for slippy maps.
//!
//! A [`MarkerLayer`] keeps one textured sprite per [`Marker`] on a scene graph that follows the
//! host map's pan and zoom, so icons stay pinned to their coordinates at a constant pixel size.
//! Hovering a sprite opens its tooltip, clicking it (a press/release with little movement)
//! reports the marker id, and a marker can force its popup open.

pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod spatial;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    config::{InteractionProfile, LayerConfig},
    geo::{LatLng, LatLngBounds, Point},
    map::{Map, MapInstanceId},
    viewport::Viewport,
};

pub use input::{
    click::{ClickThresholds, ClickTracker},
    events::{EventHandled, PointerInput, PointerKind, SpriteEvent},
};

pub use layers::{
    marker::{IconId, Marker, MarkerId},
    marker_layer::{ClickHandler, MarkerLayer},
    source::{generate_markers, MarkerSource},
};

pub use rendering::{
    assets::{
        AssetManifest, AssetRegistry, AssetSource, AssetState, FileAssetSource, HttpAssetSource,
        MemoryAssetSource, Texture,
    },
    renderer::{FrameRecorder, SpriteInstance, SpriteRenderer},
    scene::{ContainerTransform, SceneGraph, Sprite, SpriteId},
};

pub use traits::{HostMap, ViewportAware};

pub use ui::overlay::{OverlayWidget, PopupData, PopupOptions, TooltipData, TooltipOptions};

#[cfg(feature = "egui")]
pub use ui::paint::{paint_overlays, EguiSpriteRenderer, OverlayStyle};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Installs an `env_logger` logger honouring `RUST_LOG` (default `info`)
///
/// Safe to call more than once; later calls are no-ops.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
