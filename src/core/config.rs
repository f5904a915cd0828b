//! Configuration for the marker layer
//!
//! Offsets, the default sprite anchor and the click/drag disambiguation thresholds. Presets are
//! available through [`InteractionProfile`], and a full [`LayerConfig`] can be loaded from JSON.

use crate::{
    core::constants::{
        DEFAULT_SPRITE_ANCHOR, MOUSE_CLICK_MOVE_THRESHOLD, POPUP_OFFSET, TOOLTIP_OFFSET,
        TOUCH_CLICK_MOVE_THRESHOLD,
    },
    input::click::ClickThresholds,
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Anchor applied to sprites whose marker has none
    pub default_anchor: (f64, f64),
    pub tooltip_offset: (f64, f64),
    pub popup_offset: (f64, f64),
    pub click: ClickThresholds,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            default_anchor: DEFAULT_SPRITE_ANCHOR,
            tooltip_offset: TOOLTIP_OFFSET,
            popup_offset: POPUP_OFFSET,
            click: InteractionProfile::Standard.resolve(),
        }
    }
}

impl LayerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LayerConfig = serde_json::from_str(json).map_err(MapError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(MapError::from)?;
        Self::from_json_str(&json)
    }

    pub fn with_profile(mut self, profile: InteractionProfile) -> Self {
        self.click = profile.resolve();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.click.mouse == 0 || self.click.touch == 0 {
            return Err(MapError::Config(
                "click thresholds must be at least 1, otherwise no press counts as a click"
                    .to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Presets for how much pointer movement still counts as a click
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionProfile {
    #[default]
    Standard,
    /// Any movement turns a press into a drag
    Precise,
    /// Tolerates shaky hands and coarse touch screens
    Forgiving,
    Custom(ClickThresholds),
}

impl InteractionProfile {
    pub fn resolve(&self) -> ClickThresholds {
        match self {
            Self::Standard => ClickThresholds {
                mouse: MOUSE_CLICK_MOVE_THRESHOLD,
                touch: TOUCH_CLICK_MOVE_THRESHOLD,
            },
            Self::Precise => ClickThresholds { mouse: 1, touch: 4 },
            Self::Forgiving => ClickThresholds { mouse: 5, touch: 20 },
            Self::Custom(thresholds) => *thresholds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayerConfig::default();
        assert_eq!(config.default_anchor, (0.5, 1.0));
        assert_eq!(config.tooltip_offset, (0.0, -25.0));
        assert_eq!(config.popup_offset, (0.0, -15.0));
        assert_eq!(config.click.mouse, 2);
        assert_eq!(config.click.touch, 10);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = LayerConfig::from_json_str(r#"{ "tooltip_offset": [0.0, -30.0] }"#).unwrap();
        assert_eq!(config.tooltip_offset, (0.0, -30.0));
        assert_eq!(config.popup_offset, (0.0, -15.0));
        assert_eq!(config.click, InteractionProfile::Standard.resolve());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let result = LayerConfig::from_json_str(r#"{ "click": { "mouse": 0, "touch": 10 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(LayerConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_profiles() {
        let config = LayerConfig::default().with_profile(InteractionProfile::Forgiving);
        assert_eq!(config.click.mouse, 5);

        let custom = ClickThresholds { mouse: 3, touch: 7 };
        assert_eq!(InteractionProfile::Custom(custom).resolve(), custom);
    }
}
