use super::navigator::{NavError, NavSnapshot, Navigator, Step};
use super::settings::ViewerSettings;
use crate::net::data_url::{self, DataUrlError};
use crate::net::http::HttpClient;
use crate::net::source::{FetchError, HttpImageSource, ImageSource};
use crate::net::upload::{UploadError, Uploader};
use crate::store::favorites::{FavoriteSet, Favorites};
use crate::store::kv::{FileStore, KeyValueStore, StorageError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

const DOWNLOAD_STEM: &str = "dog-image";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Current image is not stored inline")]
    NotInline,
    #[error("Bad image data: {0}")]
    DataUrl(#[from] DataUrlError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Image source: {0}")]
    Source(#[from] FetchError),
    #[error("Uploader: {0}")]
    Upload(#[from] UploadError),
    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Everything a front end needs, built once and handed around by reference.
pub struct Viewer {
    navigator: Navigator,
    favorites: Mutex<Favorites>,
    uploader: Uploader,
    settings: ViewerSettings,
}

impl Viewer {
    /// Uploads go through `http`, normally the client `source` also uses.
    pub fn new(
        settings: ViewerSettings,
        http: HttpClient,
        source: Arc<dyn ImageSource>,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self, SetupError> {
        let uploader = Uploader::new(http, &settings.api_base, settings.upload_max_bytes)?;

        Ok(Self {
            navigator: Navigator::new(source, settings.navigator.clone()),
            favorites: Mutex::new(Favorites::load(store)),
            uploader,
            settings,
        })
    }

    /// Talks to the real API and keeps favorites on disk.
    pub fn from_settings(settings: ViewerSettings) -> Result<Self, SetupError> {
        let http = HttpClient::new(settings.request_timeout)?;
        let source = HttpImageSource::with_client(http.clone(), &settings.api_base)?;
        let store = FileStore::new(settings.resolved_data_dir());
        log::info!("Favorites stored in {}", store.dir().display());

        Self::new(settings, http, Arc::new(source), Box::new(store))
    }

    fn favorites_lock(&self) -> MutexGuard<'_, Favorites> {
        self.favorites.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn snapshot(&self) -> NavSnapshot {
        self.navigator.snapshot()
    }

    pub async fn initialize(&self) -> Result<Step, NavError> {
        self.navigator.initialize().await
    }

    pub async fn next(&self) -> Result<Step, NavError> {
        self.navigator.advance().await
    }

    pub async fn previous(&self) -> Result<Step, NavError> {
        self.navigator.retreat().await
    }

    pub fn is_favorite(&self) -> bool {
        self.navigator
            .current_url()
            .map(|url| self.favorites_lock().contains(&url))
            .unwrap_or(false)
    }

    pub fn favorites(&self) -> FavoriteSet {
        self.favorites_lock().set().clone()
    }

    /// Flip the current image in or out of favorites. Returns the new
    /// state, or `None` when nothing is showing.
    pub fn toggle_favorite(&self) -> Result<Option<bool>, StorageError> {
        let Some(url) = self.navigator.current_url() else {
            return Ok(None);
        };
        self.favorites_lock().toggle(&url).map(Some)
    }

    pub fn save_favorite(&self) -> Result<bool, StorageError> {
        match self.navigator.current_url() {
            Some(url) => self.favorites_lock().save(&url),
            None => Ok(false),
        }
    }

    pub fn remove_favorite(&self) -> Result<bool, StorageError> {
        match self.navigator.current_url() {
            Some(url) => self.favorites_lock().remove(&url),
            None => Ok(false),
        }
    }

    /// Drop any favorite, shown or not.
    pub fn remove_favorite_url(&self, url: &str) -> Result<bool, StorageError> {
        self.favorites_lock().remove(url)
    }

    /// Write the current image into `dir`. Returns the file written, or
    /// `None` when nothing is showing.
    pub async fn download_current(&self, dir: &Path) -> Result<Option<PathBuf>, DownloadError> {
        let Some(url) = self.navigator.current_url() else {
            return Ok(None);
        };
        if !data_url::is_data_url(&url) {
            return Err(DownloadError::NotInline);
        }

        let decoded = data_url::decode(&url)?;
        let path = dir.join(format!(
            "{}.{}",
            DOWNLOAD_STEM,
            data_url::extension_for(&decoded.mime)
        ));
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &decoded.bytes).await?;

        log::info!("Saved {} bytes to {}", decoded.bytes.len(), path.display());
        Ok(Some(path))
    }

    pub async fn submit_image(&self, path: &Path) -> Result<(), UploadError> {
        self.uploader.submit_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::settings::{HeadReset, NavigatorSettings};
    use crate::net::source::testing::ScriptedSource;
    use crate::net::test_server::{spawn_test_server, CannedResponse};
    use crate::store::favorites::FAVORITES_KEY;
    use crate::store::kv::MemoryStore;

    fn settings_for(api_base: &str) -> ViewerSettings {
        ViewerSettings {
            api_base: api_base.to_string(),
            navigator: NavigatorSettings {
                total_images: 50,
                settle_delay: None,
                head_reset: HeadReset::Fixed(0),
            },
            ..ViewerSettings::default()
        }
    }

    fn viewer_with(store: MemoryStore) -> Viewer {
        let settings = settings_for(crate::app::settings::DEFAULT_API_BASE);
        let http = HttpClient::new(None).unwrap();
        Viewer::new(settings, http, Arc::new(ScriptedSource::new()), Box::new(store)).unwrap()
    }

    fn viewer() -> Viewer {
        viewer_with(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_favorites_follow_current_image() {
        let viewer = viewer();
        viewer.initialize().await.unwrap();
        let first = viewer.navigator().current_url().unwrap();

        assert_eq!(viewer.toggle_favorite().unwrap(), Some(true));
        assert!(viewer.is_favorite());

        viewer.next().await.unwrap();
        assert!(!viewer.is_favorite());

        viewer.previous().await.unwrap();
        assert!(viewer.is_favorite());
        assert_eq!(viewer.favorites().iter().collect::<Vec<_>>(), vec![first.as_str()]);

        assert_eq!(viewer.toggle_favorite().unwrap(), Some(false));
        assert!(viewer.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_remove_are_idempotent() {
        let viewer = viewer();
        viewer.initialize().await.unwrap();

        assert!(viewer.save_favorite().unwrap());
        assert!(!viewer.save_favorite().unwrap());
        assert_eq!(viewer.favorites().len(), 1);

        assert!(viewer.remove_favorite().unwrap());
        assert!(!viewer.remove_favorite().unwrap());
        assert!(viewer.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_favorite_without_current_is_noop() {
        let viewer = viewer();
        assert_eq!(viewer.toggle_favorite().unwrap(), None);
        assert!(!viewer.save_favorite().unwrap());
        assert!(!viewer.is_favorite());
    }

    #[tokio::test]
    async fn test_loads_existing_favorites_and_removes_by_url() {
        let store = MemoryStore::with_entry(FAVORITES_KEY, r#"{"state":["https://x/a.jpg"]}"#);
        let viewer = viewer_with(store);

        assert_eq!(viewer.favorites().len(), 1);
        assert!(viewer.remove_favorite_url("https://x/a.jpg").unwrap());
        assert!(viewer.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_favorites_start_empty() {
        let viewer = viewer_with(MemoryStore::with_entry(FAVORITES_KEY, "]]"));
        assert!(viewer.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_download_current_writes_payload() {
        let viewer = viewer();
        let dir = tempfile::tempdir().unwrap();
        assert!(viewer.download_current(dir.path()).await.unwrap().is_none());

        viewer.initialize().await.unwrap();
        let path = viewer.download_current(dir.path()).await.unwrap().unwrap();

        assert_eq!(path, dir.path().join("dog-image.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"image-1");
    }

    #[tokio::test]
    async fn test_retreat_past_head_through_viewer() {
        let viewer = viewer();
        viewer.initialize().await.unwrap();
        assert_eq!(viewer.previous().await.unwrap(), Step::Fetched);
        assert_eq!(viewer.snapshot().display_index, 0);
        assert_eq!(viewer.snapshot().total_images, 50);
    }

    #[tokio::test]
    async fn test_viewer_from_settings_submits_through_api_base() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let data_dir = tempfile::tempdir().unwrap();

        let (base, requests) = spawn_test_server(CannedResponse::new(201, None, b""));
        let mut settings = settings_for(&base);
        settings.data_dir = Some(data_dir.path().to_path_buf());
        let viewer = Viewer::from_settings(settings).unwrap();

        let upload = data_dir.path().join("dog.png");
        std::fs::write(&upload, &png).unwrap();
        viewer.submit_image(&upload).await.unwrap();
        assert_eq!(requests.recv().unwrap().target, "/api/images/upload");
        assert!(viewer.favorites().is_empty());
    }
}
