pub mod marker;
pub mod marker_layer;
pub mod source;
