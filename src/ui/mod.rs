pub mod overlay;

#[cfg(feature = "egui")]
pub mod paint;

pub use overlay::{
    OverlayHandle, OverlayState, OverlayWidget, Popup, PopupData, PopupOptions, Tooltip,
    TooltipData, TooltipDirection, TooltipOptions,
};

#[cfg(feature = "egui")]
pub use paint::{paint_overlays, EguiSpriteRenderer, OverlayStyle};
