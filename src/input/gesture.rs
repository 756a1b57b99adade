use super::events::{InputEvent, NavIntent};
use super::throttle::Throttle;
use std::time::{Duration, Instant};

pub const WHEEL_THRESHOLD: f32 = 40.0;
pub const WHEEL_COOLDOWN: Duration = Duration::from_millis(500);
pub const DRAG_THRESHOLD: f32 = 20.0;

/// Turns raw input into navigation requests.
#[derive(Debug)]
pub struct GestureMapper {
    wheel: Throttle,
    drag_start: Option<f32>,
    drag_intent: Option<NavIntent>,
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMapper {
    pub fn new() -> Self {
        Self {
            wheel: Throttle::new(WHEEL_COOLDOWN),
            drag_start: None,
            drag_intent: None,
        }
    }

    /// Nothing navigates while `loading`; drags still track so a drag that
    /// started during a fetch ends cleanly.
    pub fn handle(&mut self, event: &InputEvent, now: Instant, loading: bool) -> Option<NavIntent> {
        match *event {
            InputEvent::KeyDown { keycode } => {
                if loading {
                    return None;
                }
                keycode.intent()
            }
            InputEvent::Wheel { delta_y } => {
                if loading || delta_y.abs() <= WHEEL_THRESHOLD {
                    return None;
                }
                if !self.wheel.try_fire(now) {
                    return None;
                }
                Some(if delta_y > 0.0 {
                    NavIntent::Next
                } else {
                    NavIntent::Previous
                })
            }
            InputEvent::DragStart { y } => {
                self.drag_start = Some(y);
                self.drag_intent = None;
                None
            }
            InputEvent::DragMove { y } => {
                let start = self.drag_start?;
                // Dragging up pulls the next image in.
                let delta = start - y;
                self.drag_intent = if delta.abs() <= DRAG_THRESHOLD {
                    None
                } else if delta > 0.0 {
                    Some(NavIntent::Next)
                } else {
                    Some(NavIntent::Previous)
                };
                None
            }
            InputEvent::DragEnd => {
                self.drag_start = None;
                let intent = self.drag_intent.take();
                if loading {
                    None
                } else {
                    intent
                }
            }
        }
    }
}
