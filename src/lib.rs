pub mod app;
pub mod input;
pub mod net;
pub mod store;

pub use app::viewer::Viewer;
