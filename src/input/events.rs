use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Device class of a pointer; touch tolerates more jitter before a tap becomes a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Events delivered to an individual sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteEvent {
    /// Mouse entered the sprite (no touch equivalent)
    PointerEnter,
    /// Mouse left the sprite
    PointerLeave,
    /// Mouse button down or touch start
    Down(PointerKind),
    /// Mouse or touch move over the sprite
    Move(PointerKind),
    /// Mouse button up or touch end
    Up(PointerKind),
}

/// Raw pointer input in container pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerInput {
    Moved { position: Point, kind: PointerKind },
    Pressed { position: Point, kind: PointerKind },
    Released { position: Point, kind: PointerKind },
    /// The pointer left the map container
    Left,
}

impl PointerInput {
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerInput::Moved { position, .. }
            | PointerInput::Pressed { position, .. }
            | PointerInput::Released { position, .. } => Some(*position),
            PointerInput::Left => None,
        }
    }

    pub fn kind(&self) -> Option<PointerKind> {
        match self {
            PointerInput::Moved { kind, .. }
            | PointerInput::Pressed { kind, .. }
            | PointerInput::Released { kind, .. } => Some(*kind),
            PointerInput::Left => None,
        }
    }
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_input_accessors() {
        let pressed = PointerInput::Pressed {
            position: Point::new(10.0, 20.0),
            kind: PointerKind::Touch,
        };
        assert_eq!(pressed.position(), Some(Point::new(10.0, 20.0)));
        assert_eq!(pressed.kind(), Some(PointerKind::Touch));

        assert_eq!(PointerInput::Left.position(), None);
        assert_eq!(PointerInput::Left.kind(), None);
    }
}
