//! Prelude module for common spritelet types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use spritelet::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{InteractionProfile, LayerConfig},
    geo::{LatLng, LatLngBounds, Point},
    map::{Map, MapInstanceId},
    viewport::Viewport,
};

pub use crate::input::{
    click::{ClickThresholds, ClickTracker},
    events::{EventHandled, PointerInput, PointerKind, SpriteEvent},
};

pub use crate::layers::{
    marker::{IconId, Marker, MarkerId},
    marker_layer::MarkerLayer,
    source::{generate_markers, MarkerSource},
};

pub use crate::rendering::{
    assets::{AssetManifest, AssetRegistry, AssetSource, MemoryAssetSource, Texture},
    renderer::{FrameRecorder, SpriteRenderer},
    scene::{SceneGraph, SpriteId},
};

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::traits::{HostMap, ViewportAware};

pub use crate::ui::overlay::{PopupOptions, TooltipDirection, TooltipOptions};

#[cfg(feature = "egui")]
pub use crate::ui::paint::{paint_overlays, EguiSpriteRenderer, OverlayStyle};

pub use crate::{MapError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
