pub mod history;
pub mod navigator;
pub mod settings;
pub mod viewer;

pub use history::{DisplaySize, HistoryChain, ImageNode, NodeId};
pub use navigator::{NavError, NavSnapshot, Navigator, Phase, SkipReason, Step};
pub use settings::{HeadReset, NavigatorSettings, ViewerSettings};
pub use viewer::{DownloadError, SetupError, Viewer};
