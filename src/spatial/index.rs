use crate::core::geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A sprite anchor position stored in the R-tree, with the child slot it belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedSprite {
    pub slot: usize,
    pub position: [f64; 2],
}

impl RTreeObject for IndexedSprite {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedSprite {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over sprite anchors in layer coordinates.
///
/// Sprites share a uniform scale that changes with zoom, so the index stores anchor points
/// plus the largest unscaled reach of any sprite and widens queries by `reach * scale`.
#[derive(Debug)]
pub struct SpriteIndex {
    rtree: RTree<IndexedSprite>,
    max_reach: f64,
}

impl SpriteIndex {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
            max_reach: 0.0,
        }
    }

    /// Rebuilds the tree in one bulk load
    pub fn rebuild(&mut self, items: Vec<IndexedSprite>, max_reach: f64) {
        self.rtree = RTree::bulk_load(items);
        self.max_reach = max_reach;
    }

    /// Slots whose sprite could cover `point` at the given uniform sprite scale
    pub fn candidates(&self, point: &Point, scale: f64) -> Vec<usize> {
        let reach = self.max_reach * scale;
        let envelope = AABB::from_corners(
            [point.x - reach, point.y - reach],
            [point.x + reach, point.y + reach],
        );
        self.rtree
            .locate_in_envelope(&envelope)
            .map(|item| item.slot)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
        self.max_reach = 0.0;
    }
}

impl Default for SpriteIndex {
    fn default() -> Self {
        Self::new()
    }
}
