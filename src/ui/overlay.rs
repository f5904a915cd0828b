//! Tooltip and popup overlays anchored to markers.
//!
//! Overlay *data* ([`TooltipData`], [`PopupData`]) are plain values describing what should be
//! shown. Widgets attached to a host map are tracked by [`OverlayHandle`] inside
//! [`OverlayState`], which removes the previous widget before attaching a replacement.
//! Widgets are never mutated in place.

use crate::{
    core::{constants::POPUP_OFFSET, geo::LatLng, geo::Point, map::MapInstanceId},
    layers::marker::MarkerId,
    traits::HostMap,
};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which side of the anchor a tooltip opens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipDirection {
    #[default]
    Auto,
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

/// Display options a marker can attach to its tooltip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipOptions {
    pub direction: TooltipDirection,
    pub permanent: bool,
    pub opacity: f32,
    /// Overrides the layer's tooltip offset when present
    pub offset: Option<(f64, f64)>,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            direction: TooltipDirection::Auto,
            permanent: false,
            opacity: 0.9,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupOptions {
    /// Close when another popup opens or the map is clicked
    pub auto_close: bool,
    pub max_width: f64,
    /// Overrides the layer's popup offset when present
    pub offset: Option<(f64, f64)>,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            auto_close: true,
            max_width: 300.0,
            offset: None,
        }
    }
}

impl PopupOptions {
    /// Options for popups that stay open until replaced or cleared
    pub fn pinned() -> Self {
        Self {
            auto_close: false,
            ..Self::default()
        }
    }
}

/// What a tooltip should show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipData {
    pub marker_id: MarkerId,
    pub offset: (f64, f64),
    pub position: LatLng,
    pub content: String,
    pub options: TooltipOptions,
}

/// What a popup should show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupData {
    pub marker_id: MarkerId,
    pub offset: (f64, f64),
    pub position: LatLng,
    pub content: Option<String>,
}

impl PopupData {
    pub fn new(marker_id: MarkerId, position: LatLng, content: Option<String>) -> Self {
        Self {
            marker_id,
            offset: POPUP_OFFSET,
            position,
            content,
        }
    }
}

/// A tooltip widget as attached to a map
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub marker_id: MarkerId,
    pub lat_lng: LatLng,
    pub offset: Point,
    pub content: String,
    pub options: TooltipOptions,
}

impl Tooltip {
    /// Builds the widget, letting explicit options override the data offset
    pub fn from_data(data: &TooltipData) -> Self {
        let offset = data.options.offset.unwrap_or(data.offset);
        Self {
            marker_id: data.marker_id.clone(),
            lat_lng: data.position,
            offset: offset.into(),
            content: data.content.clone(),
            options: data.options.clone(),
        }
    }
}

/// A popup widget as attached to a map
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub marker_id: MarkerId,
    pub lat_lng: LatLng,
    pub offset: Point,
    pub content: String,
    pub options: PopupOptions,
}

impl Popup {
    pub fn from_data(data: &PopupData, options: PopupOptions) -> Self {
        let offset = options.offset.unwrap_or(data.offset);
        Self {
            marker_id: data.marker_id.clone(),
            lat_lng: data.position,
            offset: offset.into(),
            content: data.content.clone().unwrap_or_default(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayWidget {
    Tooltip(Tooltip),
    Popup(Popup),
}

impl OverlayWidget {
    pub fn marker_id(&self) -> &MarkerId {
        match self {
            OverlayWidget::Tooltip(tooltip) => &tooltip.marker_id,
            OverlayWidget::Popup(popup) => &popup.marker_id,
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        match self {
            OverlayWidget::Tooltip(tooltip) => tooltip.lat_lng,
            OverlayWidget::Popup(popup) => popup.lat_lng,
        }
    }

    pub fn offset(&self) -> Point {
        match self {
            OverlayWidget::Tooltip(tooltip) => tooltip.offset,
            OverlayWidget::Popup(popup) => popup.offset,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            OverlayWidget::Tooltip(tooltip) => &tooltip.content,
            OverlayWidget::Popup(popup) => &popup.content,
        }
    }

    pub fn is_popup(&self) -> bool {
        matches!(self, OverlayWidget::Popup(_))
    }
}

/// Opaque handle to a widget attached to a host map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(pub u64);

/// Owns the open tooltip/popup data and the widgets currently attached for them.
///
/// At most one tooltip and one popup are attached at a time. A tooltip for a marker other than
/// the one whose popup is attached is suppressed; a marker's own tooltip and popup coexist.
///
/// Widgets still attached to a map the state has moved away from are remembered per map and
/// removed the next time that map is passed in.
#[derive(Debug, Default)]
pub struct OverlayState {
    host: Option<MapInstanceId>,
    tooltip_data: Option<TooltipData>,
    popup_data: Option<PopupData>,
    tooltip: Option<OverlayHandle>,
    popup: Option<OverlayHandle>,
    tooltip_dirty: bool,
    popup_dirty: bool,
    orphans: FxHashMap<MapInstanceId, Vec<OverlayHandle>>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tooltip_data(&self) -> Option<&TooltipData> {
        self.tooltip_data.as_ref()
    }

    pub fn popup_data(&self) -> Option<&PopupData> {
        self.popup_data.as_ref()
    }

    pub fn attached_tooltip(&self) -> Option<OverlayHandle> {
        self.tooltip
    }

    pub fn attached_popup(&self) -> Option<OverlayHandle> {
        self.popup
    }

    /// Replaces the tooltip data; the widget is rebuilt on the next [`sync`](Self::sync)
    pub fn set_tooltip(&mut self, data: Option<TooltipData>) {
        self.tooltip_data = data;
        self.tooltip_dirty = true;
    }

    /// Replaces the popup data; the widget is rebuilt on the next [`sync`](Self::sync)
    pub fn set_popup(&mut self, data: Option<PopupData>) {
        self.popup_data = data;
        self.popup_dirty = true;
    }

    pub fn needs_sync(&self) -> bool {
        self.tooltip_dirty || self.popup_dirty
    }

    /// Clears both data descriptors for a (possibly different) host map.
    ///
    /// Widgets attached to `map` are removed. Widgets left on the previous host are removed the
    /// next time that map is passed in.
    pub fn reset(&mut self, map: &mut dyn HostMap) {
        self.switch_host(map);
        self.remove_attached(map);
        self.tooltip_data = None;
        self.popup_data = None;
        self.tooltip_dirty = false;
        self.popup_dirty = false;
    }

    /// Removes every attached widget from `map` and drops all overlay data
    pub fn clear(&mut self, map: &mut dyn HostMap) {
        self.switch_host(map);
        self.remove_attached(map);
        self.host = None;
        self.tooltip_data = None;
        self.popup_data = None;
        self.tooltip_dirty = false;
        self.popup_dirty = false;
    }

    /// Removes widgets left on `map` after a host change, without making it the host
    pub fn release(&mut self, map: &mut dyn HostMap) {
        if self.host == Some(map.instance_id()) {
            return;
        }
        if let Some(handles) = self.orphans.remove(&map.instance_id()) {
            log::debug!(
                "removing {} stale overlays from map {:?}",
                handles.len(),
                map.instance_id()
            );
            for handle in handles {
                map.remove_overlay(handle);
            }
        }
    }

    /// Number of widgets left attached to maps other than the current host
    pub fn orphan_count(&self) -> usize {
        self.orphans.values().map(Vec::len).sum()
    }

    /// Brings the widgets attached to `map` in line with the current data
    pub fn sync(&mut self, map: &mut dyn HostMap) {
        self.switch_host(map);

        let popup_changed = std::mem::take(&mut self.popup_dirty);
        // Popup changes can lift or impose tooltip suppression
        let tooltip_changed = std::mem::take(&mut self.tooltip_dirty) || popup_changed;

        if popup_changed {
            if let Some(handle) = self.popup.take() {
                map.remove_overlay(handle);
            }
            if let Some(data) = &self.popup_data {
                let widget = Popup::from_data(data, PopupOptions::pinned());
                log::debug!("opening popup for marker {}", data.marker_id);
                self.popup = Some(map.add_overlay(OverlayWidget::Popup(widget)));
            }
        }

        if tooltip_changed {
            if let Some(handle) = self.tooltip.take() {
                map.remove_overlay(handle);
            }
            if let Some(data) = &self.tooltip_data {
                if !self.is_suppressed(data) {
                    let widget = Tooltip::from_data(data);
                    self.tooltip = Some(map.add_overlay(OverlayWidget::Tooltip(widget)));
                }
            }
        }
    }

    fn is_suppressed(&self, tooltip: &TooltipData) -> bool {
        match (&self.popup, &self.popup_data) {
            (Some(_), Some(popup)) => popup.marker_id != tooltip.marker_id,
            _ => false,
        }
    }

    /// Makes `map` the host, parking widgets of the previous host and removing any parked on `map`
    fn switch_host(&mut self, map: &mut dyn HostMap) {
        let id = map.instance_id();
        if self.host != Some(id) {
            let attached: Vec<OverlayHandle> =
                self.tooltip.take().into_iter().chain(self.popup.take()).collect();
            if let Some(previous) = self.host {
                if !attached.is_empty() {
                    self.orphans.entry(previous).or_default().extend(attached);
                }
            }
            self.host = Some(id);
        }
        self.release_parked(map);
    }

    fn release_parked(&mut self, map: &mut dyn HostMap) {
        if let Some(handles) = self.orphans.remove(&map.instance_id()) {
            for handle in handles {
                map.remove_overlay(handle);
            }
        }
    }

    fn remove_attached(&mut self, map: &mut dyn HostMap) {
        if let Some(handle) = self.tooltip.take() {
            map.remove_overlay(handle);
        }
        if let Some(handle) = self.popup.take() {
            map.remove_overlay(handle);
        }
    }
}
