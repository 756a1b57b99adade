pub mod events;
pub mod gesture;
pub mod throttle;

pub use events::{InputEvent, KeyCode, NavIntent};
pub use gesture::GestureMapper;
pub use throttle::Throttle;
