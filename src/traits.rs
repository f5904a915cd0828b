//! Shared trait abstractions at the seams between the marker layer and its collaborators
//!
//! The host map widget and the sprite renderer are external to the layer; these traits are the
//! whole of what the layer needs from them.

use crate::{
    core::{
        geo::{LatLng, Point},
        map::MapInstanceId,
        viewport::Viewport,
    },
    rendering::renderer::SpriteRenderer,
    ui::overlay::{OverlayHandle, OverlayWidget},
};

/// Contract of the map widget hosting a marker layer
///
/// The layer only reads the view and adds/removes overlay widgets; it never pans or zooms.
pub trait HostMap {
    /// Identity of this map instance; a change means the layer must re-attach
    fn instance_id(&self) -> MapInstanceId;

    /// Current zoom, or `None` while the map has no defined view
    fn zoom(&self) -> Option<f64>;

    /// Monotonic counter bumped on every pan, zoom or resize
    fn view_revision(&self) -> u64;

    /// Scale factor between two zoom levels
    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64 {
        Viewport::zoom_scale(to_zoom, from_zoom)
    }

    /// World pixel coordinates of `lat_lng` at `zoom`
    fn project(&self, lat_lng: &LatLng, zoom: f64) -> Point {
        Viewport::project_at(lat_lng, zoom)
    }

    /// World pixel (current zoom) under the container's top-left corner
    fn container_origin(&self) -> Option<Point>;

    /// Container pixel position of `lat_lng` under the current view
    fn container_point(&self, lat_lng: &LatLng) -> Option<Point> {
        let zoom = self.zoom()?;
        let origin = self.container_origin()?;
        Some(self.project(lat_lng, zoom).subtract(&origin))
    }

    fn add_overlay(&mut self, widget: OverlayWidget) -> OverlayHandle;

    fn remove_overlay(&mut self, handle: OverlayHandle) -> Option<OverlayWidget>;
}

/// Components that redraw in response to host viewport changes
pub trait ViewportAware {
    /// Called after every pan/zoom of the host map
    fn on_viewport_changed(&mut self, map: &dyn HostMap, renderer: &mut dyn SpriteRenderer);
}
