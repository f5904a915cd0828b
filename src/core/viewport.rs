use crate::core::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, TILE_SIZE};
use crate::core::geo::{LatLng, LatLngBounds, Point, EARTH_RADIUS, MAX_LATITUDE};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Pixel origin for coordinate transformations (to avoid precision issues)
    pixel_origin: Option<Point>,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let mut viewport = Self {
            center,
            zoom: zoom.clamp(DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM),
            size,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            pixel_origin: None,
        };
        viewport.update_pixel_origin();
        viewport
    }

    /// Sets the center of the viewport with bounds checking
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
        self.update_pixel_origin();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.update_pixel_origin();
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self.update_pixel_origin();
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Scale factor between two zoom levels, as Leaflet's `getZoomScale`
    pub fn zoom_scale(to_zoom: f64, from_zoom: f64) -> f64 {
        2_f64.powf(to_zoom - from_zoom)
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        Self::project_at(lat_lng, zoom.unwrap_or(self.zoom))
    }

    /// Zoom-explicit projection that does not need a viewport instance
    pub fn project_at(lat_lng: &LatLng, zoom: f64) -> Point {
        let scale = TILE_SIZE * 2_f64.powf(zoom);
        let clamped = LatLng::new(LatLng::clamp_lat(lat_lng.lat), lat_lng.lng);
        let mercator = clamped.to_mercator();

        let circumference = 2.0 * PI * EARTH_RADIUS;
        let pixel_x = (mercator.x + PI * EARTH_RADIUS) / circumference * scale;
        let pixel_y = (-mercator.y + PI * EARTH_RADIUS) / circumference * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE * 2_f64.powf(z);

        let circumference = 2.0 * PI * EARTH_RADIUS;
        let x = (pixel.x / scale) * circumference - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * circumference;

        LatLng::from_mercator(Point::new(x, y))
    }

    /// Gets or calculates the pixel origin for this viewport
    pub fn get_pixel_origin(&self) -> Point {
        self.pixel_origin
            .unwrap_or_else(|| self.project(&self.center, None).floor())
    }

    fn update_pixel_origin(&mut self) {
        self.pixel_origin = Some(self.project(&self.center, None).floor());
    }

    /// World pixel (current zoom) sitting under the container's top-left corner
    pub fn container_origin(&self) -> Point {
        self.get_pixel_origin()
            .subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts a geographical coordinate to screen pixel coordinates (container relative)
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let layer_point = self.lat_lng_to_layer_point(lat_lng);
        self.layer_point_to_container_point(&layer_point)
    }

    /// Converts screen pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let layer_point = self.container_point_to_layer_point(pixel);
        self.layer_point_to_lat_lng(&layer_point)
    }

    /// Converts LatLng to layer point (relative to pixel origin)
    pub fn lat_lng_to_layer_point(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.get_pixel_origin())
    }

    /// Converts layer point back to LatLng
    pub fn layer_point_to_lat_lng(&self, point: &Point) -> LatLng {
        let projected_point = point.add(&self.get_pixel_origin());
        self.unproject(&projected_point, None)
    }

    pub fn layer_point_to_container_point(&self, point: &Point) -> Point {
        Point::new(point.x + self.size.x / 2.0, point.y + self.size.y / 2.0)
    }

    pub fn container_point_to_layer_point(&self, point: &Point) -> Point {
        Point::new(point.x - self.size.x / 2.0, point.y - self.size.y / 2.0)
    }

    /// Pans the viewport by the given pixel offset (drag direction)
    pub fn pan(&mut self, delta: Point) {
        let current_layer_point = self.lat_lng_to_layer_point(&self.center);
        let new_layer_point = current_layer_point.subtract(&delta);
        let new_center = self.layer_point_to_lat_lng(&new_layer_point);
        self.set_center(new_center);
    }

    /// Zooms the viewport to a specific level, keeping `focus_point` stationary when given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);

        // No-op if zoom does not change significantly
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus_point {
            Some(focus_screen) => {
                let focus_lat_lng = self.pixel_to_lat_lng(&focus_screen);

                self.zoom = new_zoom;
                self.update_pixel_origin();

                // Pan back so the focus point stays under the cursor
                let drifted = self.lat_lng_to_pixel(&focus_lat_lng);
                self.pan(focus_screen.subtract(&drifted));
            }
            None => {
                self.zoom = new_zoom;
                self.update_pixel_origin();
            }
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(
            center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center.lng.clamp(-180.0, 180.0),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(
            LatLng::new(-6.1592, 106.8456),
            13.0,
            Point::new(800.0, 600.0),
        );

        assert_eq!(viewport.zoom, 13.0);
        assert_eq!(viewport.center.lat, -6.1592);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_center_maps_to_container_middle() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center_lat_lng = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center_lat_lng.lat.abs() < 0.01);
        assert!(center_lat_lng.lng.abs() < 0.01);
    }

    #[test]
    fn test_projection_at_zoom_zero() {
        let world = Viewport::project_at(&LatLng::new(0.0, 0.0), 0.0);
        assert!((world.x - 128.0).abs() < 1e-9);
        assert!((world.y - 128.0).abs() < 1e-9);

        let doubled = Viewport::project_at(&LatLng::new(0.0, 0.0), 1.0);
        assert!((doubled.x - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let viewport = Viewport::default();
        let original = LatLng::new(-6.3, 106.9);
        let back = viewport.unproject(&viewport.project(&original, Some(13.0)), Some(13.0));
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_zoom_scale() {
        assert_eq!(Viewport::zoom_scale(14.0, 13.0), 2.0);
        assert_eq!(Viewport::zoom_scale(12.0, 13.0), 0.5);
    }

    #[test]
    fn test_zoom_to_keeps_focus_point() {
        let mut viewport = Viewport::new(
            LatLng::new(-6.1592, 106.8456),
            12.0,
            Point::new(800.0, 600.0),
        );
        let focus = Point::new(600.0, 200.0);
        let before = viewport.pixel_to_lat_lng(&focus);

        viewport.zoom_to(13.0, Some(focus));

        let after = viewport.lat_lng_to_pixel(&before);
        assert!((after.x - focus.x).abs() < 1.5);
        assert!((after.y - focus.y).abs() < 1.5);
    }

    #[test]
    fn test_pan_moves_content_with_drag() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 5.0, Point::new(400.0, 400.0));
        let landmark = LatLng::new(1.0, 1.0);
        let before = viewport.lat_lng_to_pixel(&landmark);

        viewport.pan(Point::new(30.0, 0.0));

        let after = viewport.lat_lng_to_pixel(&landmark);
        assert!((after.x - before.x - 30.0).abs() < 1.5);
    }
}
