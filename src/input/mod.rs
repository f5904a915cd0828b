pub mod click;
pub mod events;
