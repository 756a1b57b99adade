#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { keycode: KeyCode },
    /// Positive scrolls down the feed.
    Wheel { delta_y: f32 },
    DragStart { y: f32 },
    DragMove { y: f32 },
    DragEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Up,
    Down,
    Space,
    Escape,
    Char(char),
    Unknown,
}

/// Which way the user asked to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Previous,
}

impl KeyCode {
    pub fn intent(self) -> Option<NavIntent> {
        match self {
            KeyCode::Down | KeyCode::Space => Some(NavIntent::Next),
            KeyCode::Up => Some(NavIntent::Previous),
            _ => None,
        }
    }

    /// Map a typed word from a line-oriented front end.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "up" | "k" => KeyCode::Up,
            "down" | "j" => KeyCode::Down,
            "" | "space" | " " => KeyCode::Space,
            "esc" | "escape" => KeyCode::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => KeyCode::Unknown,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_intents() {
        assert_eq!(KeyCode::Down.intent(), Some(NavIntent::Next));
        assert_eq!(KeyCode::Space.intent(), Some(NavIntent::Next));
        assert_eq!(KeyCode::Up.intent(), Some(NavIntent::Previous));
        assert_eq!(KeyCode::Char('f').intent(), None);
        assert_eq!(KeyCode::Escape.intent(), None);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(KeyCode::from_name("Down"), KeyCode::Down);
        assert_eq!(KeyCode::from_name("j"), KeyCode::Down);
        assert_eq!(KeyCode::from_name("  "), KeyCode::Space);
        assert_eq!(KeyCode::from_name("k"), KeyCode::Up);
        assert_eq!(KeyCode::from_name("f"), KeyCode::Char('f'));
        assert_eq!(KeyCode::from_name("favorites"), KeyCode::Unknown);
    }
}
