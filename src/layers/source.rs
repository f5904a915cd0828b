//! Random marker generation inside a geographic box

use crate::{
    core::geo::{LatLng, LatLngBounds},
    layers::marker::{IconId, Marker, MarkerId},
};

/// A generated position with its sequential identity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratedMarker {
    pub id: u64,
    pub position: LatLng,
}

impl GeneratedMarker {
    /// Turns the generated point into a displayable marker
    pub fn into_marker(self, icon_id: IconId) -> Marker {
        Marker::new(MarkerId::from(self.id), icon_id, self.position)
    }
}

/// Produces markers uniformly distributed inside `bounds`
pub struct MarkerSource {
    bounds: LatLngBounds,
    rng: fastrand::Rng,
}

impl MarkerSource {
    pub fn new(bounds: LatLngBounds) -> Self {
        Self {
            bounds,
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic source for reproducible layouts
    pub fn with_seed(bounds: LatLngBounds, seed: u64) -> Self {
        Self {
            bounds,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn bounds(&self) -> &LatLngBounds {
        &self.bounds
    }

    /// Generates `count` markers with ids `0..count`
    pub fn generate(&mut self, count: usize) -> Vec<GeneratedMarker> {
        let min_lat = self.bounds.south_west.lat;
        let min_lng = self.bounds.south_west.lng;
        let lat_span = self.bounds.lat_span();
        let lng_span = self.bounds.lng_span();

        (0..count as u64)
            .map(|id| GeneratedMarker {
                id,
                position: LatLng::new(
                    min_lat + self.rng.f64() * lat_span,
                    min_lng + self.rng.f64() * lng_span,
                ),
            })
            .collect()
    }
}

/// One-shot helper using an unseeded source
pub fn generate_markers(count: usize, bounds: &LatLngBounds) -> Vec<GeneratedMarker> {
    MarkerSource::new(bounds.clone()).generate(count)
}
