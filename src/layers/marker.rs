use crate::{core::geo::LatLng, ui::overlay::TooltipOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Marker identity: either an integer or a string
///
/// Unsigned ids that fit in `i64` are stored as `Int`, so `5u64` and `5i64` name the same marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerId {
    Int(i64),
    Uint(u64),
    Str(String),
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerId::Int(id) => write!(f, "{}", id),
            MarkerId::Uint(id) => write!(f, "{}", id),
            MarkerId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for MarkerId {
    fn from(id: i64) -> Self {
        MarkerId::Int(id)
    }
}

impl From<u64> for MarkerId {
    fn from(id: u64) -> Self {
        i64::try_from(id).map_or(MarkerId::Uint(id), MarkerId::Int)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        MarkerId::Str(id.to_string())
    }
}

impl From<String> for MarkerId {
    fn from(id: String) -> Self {
        MarkerId::Str(id)
    }
}

/// Alias of a preloaded icon in the asset registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconId(Arc<str>);

impl IconId {
    pub fn new(alias: impl AsRef<str>) -> Self {
        Self(Arc::from(alias.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IconId {
    fn from(alias: &str) -> Self {
        Self::new(alias)
    }
}

/// A geolocated entity drawn as one sprite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub icon_id: IconId,
    pub position: LatLng,
    #[serde(default)]
    pub popup: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub tooltip_options: Option<TooltipOptions>,
    /// Forces this marker's popup open while the marker set is applied
    #[serde(default)]
    pub popup_open: bool,
    /// Rotation in degrees
    #[serde(default)]
    pub angle: Option<f64>,
    /// Sprite anchor as (x, y) fractions of the icon size
    #[serde(default)]
    pub anchor: Option<(f64, f64)>,
}

impl Marker {
    pub fn new(id: impl Into<MarkerId>, icon_id: impl Into<IconId>, position: LatLng) -> Self {
        Self {
            id: id.into(),
            icon_id: icon_id.into(),
            position,
            popup: None,
            tooltip: None,
            tooltip_options: None,
            popup_open: false,
            angle: None,
            anchor: None,
        }
    }

    pub fn with_popup(mut self, text: impl Into<String>) -> Self {
        self.popup = Some(text.into());
        self
    }

    pub fn with_tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = Some(text.into());
        self
    }

    pub fn with_tooltip_options(mut self, options: TooltipOptions) -> Self {
        self.tooltip_options = Some(options);
        self
    }

    pub fn with_popup_open(mut self, open: bool) -> Self {
        self.popup_open = open;
        self
    }

    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = Some(degrees);
        self
    }

    pub fn with_anchor(mut self, x: f64, y: f64) -> Self {
        self.anchor = Some((x, y));
        self
    }

    /// True when the marker reacts to pointer events
    pub fn is_interactive(&self) -> bool {
        self.popup.is_some() || self.tooltip.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_builder() {
        let marker = Marker::new(7i64, "bluebird-arrow", LatLng::new(-6.3, 106.9))
            .with_tooltip("-6.3,106.9")
            .with_angle(45.0)
            .with_anchor(0.5, 0.5);

        assert_eq!(marker.id, MarkerId::Int(7));
        assert_eq!(marker.icon_id.as_str(), "bluebird-arrow");
        assert_eq!(marker.tooltip.as_deref(), Some("-6.3,106.9"));
        assert_eq!(marker.angle, Some(45.0));
        assert_eq!(marker.anchor, Some((0.5, 0.5)));
        assert!(!marker.popup_open);
        assert!(marker.is_interactive());
    }

    #[test]
    fn test_plain_marker_is_inert() {
        let marker = Marker::new("depot", "pin", LatLng::new(0.0, 0.0));
        assert!(!marker.is_interactive());
    }

    #[test]
    fn test_marker_id_json_is_untagged() {
        assert_eq!(serde_json::to_string(&MarkerId::Int(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&MarkerId::from("a")).unwrap(),
            "\"a\""
        );
        let parsed: MarkerId = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(parsed, MarkerId::Str("x".to_string()));
    }

    #[test]
    fn test_large_unsigned_ids_do_not_wrap() {
        assert_eq!(MarkerId::from(5u64), MarkerId::Int(5));
        let big = MarkerId::from(u64::MAX);
        assert_eq!(big, MarkerId::Uint(u64::MAX));
        assert_ne!(big, MarkerId::from(-1i64));
        assert_eq!(big.to_string(), u64::MAX.to_string());

        let parsed: MarkerId = serde_json::from_str(&u64::MAX.to_string()).unwrap();
        assert_eq!(parsed, big);
    }

    #[test]
    fn test_marker_from_json() {
        let marker: Marker = serde_json::from_str(
            r#"{ "id": 3, "icon_id": "pin", "position": { "lat": 1.0, "lng": 2.0 },
                 "popup": "this is a popup", "popup_open": true }"#,
        )
        .unwrap();
        assert_eq!(marker.id, MarkerId::Int(3));
        assert!(marker.popup_open);
        assert!(marker.tooltip.is_none());
    }
}
