use super::data_url::{self, FALLBACK_MIME};
use super::http::{api_url, HttpClient};
use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use url::Url;

const RANDOM_IMAGE_PATH: &str = "api/images/random";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Image source answered with status {status}")]
    Status { status: u16 },
    #[error("Image source returned an empty body")]
    Empty,
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }
}

/// One image as delivered by the source.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl ImagePayload {
    /// The declared type if it names an image, else whatever the bytes look
    /// like, else JPEG.
    pub fn mime(&self) -> &str {
        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
            .filter(|ct| ct.starts_with("image/"));

        declared
            .or_else(|| data_url::sniff_mime(&self.bytes))
            .unwrap_or(FALLBACK_MIME)
    }

    pub fn into_data_url(self) -> String {
        data_url::encode(&self.bytes, self.mime())
    }
}

/// Somewhere random images come from. Every call is independent; nothing
/// stops the same image from coming back twice.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_random(&self) -> Result<ImagePayload, FetchError>;
}

/// `GET {api_base}/api/images/random`
pub struct HttpImageSource {
    http: HttpClient,
    endpoint: Url,
}

impl HttpImageSource {
    pub fn new(api_base: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            endpoint: api_url(api_base, RANDOM_IMAGE_PATH)?,
        })
    }

    pub fn with_client(http: HttpClient, api_base: &str) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            endpoint: api_url(api_base, RANDOM_IMAGE_PATH)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn cache_busted_url(&self) -> Url {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("t", &millis.to_string());
        url
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_random(&self) -> Result<ImagePayload, FetchError> {
        let fetched = self.http.get_bytes(&self.cache_busted_url()).await?;

        if !fetched.status.is_success() {
            return Err(FetchError::Status {
                status: fetched.status.as_u16(),
            });
        }
        if fetched.bytes.is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(ImagePayload {
            bytes: fetched.bytes,
            content_type: fetched.content_type,
        })
    }
}
