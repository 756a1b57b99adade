use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.dogpix.lol";
pub const DEFAULT_TOTAL_IMAGES: u32 = 16124;
pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// What the display index becomes when the user steps back past the first
/// recorded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadReset {
    /// Uniform in `0..10`.
    Random,
    Fixed(u32),
}

#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    pub total_images: u32,
    /// Artificial pause after each fetch. `None` disables it.
    pub settle_delay: Option<Range<Duration>>,
    pub head_reset: HeadReset,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            total_images: DEFAULT_TOTAL_IMAGES,
            settle_delay: Some(Duration::from_millis(100)..Duration::from_millis(300)),
            head_reset: HeadReset::Random,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub api_base: String,
    pub request_timeout: Option<Duration>,
    pub upload_max_bytes: u64,
    /// Where the favorites record lives. `None` means the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub navigator: NavigatorSettings,
}

impl ViewerSettings {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("dogpix")
        })
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            data_dir: None,
            navigator: NavigatorSettings::default(),
        }
    }
}
