use crate::{
    core::{
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    traits::HostMap,
    ui::overlay::{OverlayHandle, OverlayWidget},
};
use fxhash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a host map instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapInstanceId(pub u64);

impl MapInstanceId {
    pub fn next() -> Self {
        Self(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A minimal interactive map: a viewport plus the overlay widgets attached to it.
///
/// A map created with [`Map::new`] has no view yet, so its zoom is undefined until
/// [`Map::set_view`] is called.
#[derive(Debug)]
pub struct Map {
    id: MapInstanceId,
    viewport: Option<Viewport>,
    size: Point,
    zoom_limits: (f64, f64),
    view_revision: u64,
    overlays: FxHashMap<OverlayHandle, OverlayWidget>,
    next_overlay: u64,
}

impl Map {
    /// Creates a map with no view
    pub fn new(size: Point) -> Self {
        Self {
            id: MapInstanceId::next(),
            viewport: None,
            size,
            zoom_limits: (
                crate::core::constants::DEFAULT_MIN_ZOOM,
                crate::core::constants::DEFAULT_MAX_ZOOM,
            ),
            view_revision: 0,
            overlays: FxHashMap::default(),
            next_overlay: 1,
        }
    }

    /// Creates a map with an initial view
    pub fn with_view(center: LatLng, zoom: f64, size: Point) -> Self {
        let mut map = Self::new(size);
        map.set_view(center, zoom);
        map
    }

    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.zoom_limits = (min_zoom, max_zoom);
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.set_zoom_limits(min_zoom, max_zoom);
        }
        self
    }

    pub fn id(&self) -> MapInstanceId {
        self.id
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        let viewport = self
            .viewport
            .get_or_insert_with(|| Viewport::new(center, zoom, self.size));
        viewport.set_zoom_limits(self.zoom_limits.0, self.zoom_limits.1);
        viewport.set_center(center);
        viewport.set_zoom(zoom);
        self.bump_revision();
    }

    /// Pans by a drag delta in pixels; no-op without a view
    pub fn pan_by(&mut self, delta: Point) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.pan(delta);
            self.bump_revision();
        }
    }

    /// Zooms around an optional container point; no-op without a view
    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) {
        if let Some(viewport) = self.viewport.as_mut() {
            let before = viewport.zoom;
            viewport.zoom_to(zoom, focus);
            if viewport.zoom != before {
                self.bump_revision();
            }
        }
    }

    pub fn resize(&mut self, size: Point) {
        if self.size == size {
            return;
        }
        self.size = size;
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.set_size(size);
        }
        self.bump_revision();
    }

    pub fn overlay(&self, handle: OverlayHandle) -> Option<&OverlayWidget> {
        self.overlays.get(&handle)
    }

    /// Attached widgets in attachment order
    pub fn overlays(&self) -> Vec<(OverlayHandle, &OverlayWidget)> {
        let mut attached: Vec<_> = self.overlays.iter().map(|(h, w)| (*h, w)).collect();
        attached.sort_by_key(|(handle, _)| *handle);
        attached
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn tooltip_count(&self) -> usize {
        self.overlays.values().filter(|w| !w.is_popup()).count()
    }

    pub fn popup_count(&self) -> usize {
        self.overlays.values().filter(|w| w.is_popup()).count()
    }

    fn bump_revision(&mut self) {
        self.view_revision = self.view_revision.wrapping_add(1);
    }
}

impl HostMap for Map {
    fn instance_id(&self) -> MapInstanceId {
        self.id
    }

    fn zoom(&self) -> Option<f64> {
        self.viewport.as_ref().map(|v| v.zoom)
    }

    fn view_revision(&self) -> u64 {
        self.view_revision
    }

    fn container_origin(&self) -> Option<Point> {
        self.viewport.as_ref().map(Viewport::container_origin)
    }

    fn add_overlay(&mut self, widget: OverlayWidget) -> OverlayHandle {
        let handle = OverlayHandle(self.next_overlay);
        self.next_overlay += 1;
        self.overlays.insert(handle, widget);
        handle
    }

    fn remove_overlay(&mut self, handle: OverlayHandle) -> Option<OverlayWidget> {
        self.overlays.remove(&handle)
    }
}
