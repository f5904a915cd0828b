//! The sprite scene graph attached to a host map.
//!
//! Sprites are positioned in *layer* coordinates: world pixels at the scene's projection zoom,
//! relative to the projection of (0, 0). The container transform maps layer coordinates to the
//! host container for the current view; sprites carry the inverse of its scale so icons keep a
//! constant pixel size.

use crate::{
    core::{
        bounds::Bounds,
        geo::{LatLng, Point},
    },
    layers::marker::{IconId, MarkerId},
    rendering::assets::Texture,
    spatial::index::{IndexedSprite, SpriteIndex},
    traits::HostMap,
    ui::overlay::TooltipData,
};
use fxhash::FxHashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

static NEXT_SPRITE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique sprite identity; never reused, even across scene rebuilds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u64);

impl SpriteId {
    fn next() -> Self {
        Self(NEXT_SPRITE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What pointer interaction a sprite is wired to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteBindings {
    /// Press/release pairs are checked against the click thresholds
    pub click: bool,
    /// Hovering opens this tooltip, leaving closes it
    pub tooltip: Option<TooltipData>,
}

#[derive(Debug, Clone)]
pub struct Sprite {
    id: SpriteId,
    pub marker_id: MarkerId,
    pub icon: IconId,
    pub texture: Arc<Texture>,
    /// Anchor as fractions of the texture size
    pub anchor: (f64, f64),
    /// Layer coordinates of the anchor
    pub position: Point,
    /// Degrees, clockwise
    pub rotation: f64,
    /// Uniform scale
    pub scale: f64,
    pub interactive: bool,
    pub bindings: SpriteBindings,
}

impl Sprite {
    pub fn new(marker_id: MarkerId, icon: IconId, texture: Arc<Texture>) -> Self {
        Self {
            id: SpriteId::next(),
            marker_id,
            icon,
            texture,
            anchor: (0.0, 0.0),
            position: Point::default(),
            rotation: 0.0,
            scale: 1.0,
            interactive: false,
            bindings: SpriteBindings::default(),
        }
    }

    pub fn id(&self) -> SpriteId {
        self.id
    }

    /// Unscaled, unrotated texture rectangle relative to the anchor
    pub fn local_bounds(&self) -> Bounds {
        let (width, height) = self.texture.size();
        let (ax, ay) = self.anchor;
        Bounds::from_coords(
            -ax * width,
            -ay * height,
            (1.0 - ax) * width,
            (1.0 - ay) * height,
        )
    }

    /// Farthest distance from the anchor to a texture corner, before scaling
    pub fn reach(&self) -> f64 {
        let bounds = self.local_bounds();
        let corner_x = bounds.min.x.abs().max(bounds.max.x.abs());
        let corner_y = bounds.min.y.abs().max(bounds.max.y.abs());
        corner_x.hypot(corner_y)
    }

    /// Whether `point` (layer coordinates) falls on the sprite's texture
    pub fn contains(&self, point: &Point) -> bool {
        if self.texture.is_empty() || self.scale <= 0.0 {
            return false;
        }
        let local = point
            .subtract(&self.position)
            .rotate(-self.rotation)
            .multiply(1.0 / self.scale);
        self.local_bounds().contains(&local)
    }
}

/// Maps layer coordinates to container pixels for one view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerTransform {
    pub scale: f64,
    pub translate: Point,
}

impl ContainerTransform {
    pub fn apply(&self, layer_point: &Point) -> Point {
        layer_point.multiply(self.scale).add(&self.translate)
    }

    pub fn invert(&self, container_point: &Point) -> Point {
        container_point
            .subtract(&self.translate)
            .multiply(1.0 / self.scale)
    }
}

/// Ordered children of the marker container; later children draw on top
#[derive(Debug)]
pub struct SceneGraph {
    projection_zoom: f64,
    shift: Point,
    children: Vec<Sprite>,
    slots: FxHashMap<SpriteId, usize>,
    index: SpriteIndex,
    index_stale: bool,
}

impl SceneGraph {
    /// Creates an empty scene projecting at the map's current zoom; `None` without a zoom
    pub fn new(map: &dyn HostMap) -> Option<Self> {
        let zoom = map.zoom()?;
        Some(Self::with_projection(zoom, map.project(&LatLng::default(), zoom)))
    }

    pub fn with_projection(projection_zoom: f64, shift: Point) -> Self {
        Self {
            projection_zoom,
            shift,
            children: Vec::new(),
            slots: FxHashMap::default(),
            index: SpriteIndex::new(),
            index_stale: false,
        }
    }

    pub fn projection_zoom(&self) -> f64 {
        self.projection_zoom
    }

    /// Layer coordinates of `lat_lng`
    pub fn project(&self, map: &dyn HostMap, lat_lng: &LatLng) -> Point {
        map.project(lat_lng, self.projection_zoom)
            .subtract(&self.shift)
    }

    /// Scale of the container relative to the projection zoom; `None` without a zoom
    pub fn scale(&self, map: &dyn HostMap) -> Option<f64> {
        map.zoom()
            .map(|zoom| map.zoom_scale(zoom, self.projection_zoom))
    }

    pub fn container_transform(&self, map: &dyn HostMap) -> Option<ContainerTransform> {
        let scale = self.scale(map)?;
        let origin = map.container_origin()?;
        Some(ContainerTransform {
            scale,
            translate: self.shift.multiply(scale).subtract(&origin),
        })
    }

    pub fn add_child(&mut self, sprite: Sprite) -> SpriteId {
        let id = sprite.id();
        self.slots.insert(id, self.children.len());
        self.children.push(sprite);
        self.index_stale = true;
        id
    }

    /// Detaches every sprite, returning how many were removed
    pub fn remove_children(&mut self) -> usize {
        let removed = self.children.len();
        self.children.clear();
        self.slots.clear();
        self.index.clear();
        self.index_stale = false;
        removed
    }

    pub fn children(&self) -> &[Sprite] {
        &self.children
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.slots.get(&id).map(|slot| &self.children[*slot])
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Applies one uniform scale to every child
    pub fn set_children_scale(&mut self, scale: f64) {
        for child in &mut self.children {
            child.scale = scale;
        }
    }

    pub fn rebuild_index(&mut self) {
        let mut max_reach: f64 = 0.0;
        let items: Vec<IndexedSprite> = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, sprite)| sprite.interactive && !sprite.texture.is_empty())
            .map(|(slot, sprite)| {
                max_reach = max_reach.max(sprite.reach());
                IndexedSprite {
                    slot,
                    position: [sprite.position.x, sprite.position.y],
                }
            })
            .collect();
        self.index.rebuild(items, max_reach);
        self.index_stale = false;
    }

    /// Topmost interactive sprite under `point` (layer coordinates)
    pub fn hit_test(&self, point: &Point) -> Option<SpriteId> {
        let hit = |sprite: &Sprite| sprite.interactive && sprite.contains(point);

        if self.index_stale {
            return self.children.iter().rev().find(|&s| hit(s)).map(Sprite::id);
        }

        let scale = self.children.first().map_or(1.0, |s| s.scale);
        self.index
            .candidates(point, scale)
            .into_iter()
            .filter(|slot| hit(&self.children[*slot]))
            .max()
            .map(|slot| self.children[slot].id())
    }
}
