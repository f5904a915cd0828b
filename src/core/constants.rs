//! Core constants derived from Leaflet defaults and the pin-icon conventions used by the layer.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Default zoom limits for a freshly created map.
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 18.0;

/// Sprite anchor used when a marker has none: horizontal center, vertical bottom.
/// The tip of a pin-style icon marks the location.
pub const DEFAULT_SPRITE_ANCHOR: (f64, f64) = (0.5, 1.0);

/// Pixel offset of a hover tooltip relative to its marker position.
pub const TOOLTIP_OFFSET: (f64, f64) = (0.0, -25.0);

/// Pixel offset of a popup relative to its marker position.
pub const POPUP_OFFSET: (f64, f64) = (0.0, -15.0);

/// A mouse press-release counts as a click only below this many moves.
pub const MOUSE_CLICK_MOVE_THRESHOLD: u32 = 2;

/// Touch jitters more, so taps tolerate more moves.
pub const TOUCH_CLICK_MOVE_THRESHOLD: u32 = 10;
