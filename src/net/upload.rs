use super::data_url;
use super::http::{api_url, HttpClient};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use thiserror::Error;
use url::Url;

const UPLOAD_PATH: &str = "api/images/upload";
const FORM_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Image is {size} bytes, the limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Upload rejected with status {status}")]
    Rejected { status: u16 },
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Sends new images to the remote catalog.
pub struct Uploader {
    http: HttpClient,
    endpoint: Url,
    max_bytes: u64,
}

impl Uploader {
    pub fn new(http: HttpClient, api_base: &str, max_bytes: u64) -> Result<Self, UploadError> {
        Ok(Self {
            http,
            endpoint: api_url(api_base, UPLOAD_PATH)?,
            max_bytes,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn submit_file(&self, path: &Path) -> Result<(), UploadError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let bytes = tokio::fs::read(path).await?;

        self.submit_bytes(&file_name, bytes).await
    }

    pub async fn submit_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), UploadError> {
        let mime = self.validate(file_name, &bytes)?;
        log::info!("Uploading {} ({} bytes, {})", file_name, bytes.len(), mime);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part(FORM_FIELD, part);

        let status = self.http.post_multipart(&self.endpoint, form).await?;
        check_status(status)?;

        log::info!("Upload of {} accepted", file_name);
        Ok(())
    }

    /// Reject payloads the server would refuse anyway.
    fn validate(&self, file_name: &str, bytes: &[u8]) -> Result<&'static str, UploadError> {
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        data_url::sniff_mime(bytes).ok_or_else(|| UploadError::NotAnImage(file_name.to_string()))
    }
}

/// Only `201 Created` counts as success.
fn check_status(status: StatusCode) -> Result<(), UploadError> {
    if status == StatusCode::CREATED {
        Ok(())
    } else {
        log::warn!("Upload rejected: {}", status);
        Err(UploadError::Rejected {
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::test_server::{spawn_test_server, CannedResponse};

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn uploader(max_bytes: u64) -> Uploader {
        let http = HttpClient::new(None).unwrap();
        Uploader::new(http, "https://api.dogpix.lol", max_bytes).unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            uploader(1024).endpoint().as_str(),
            "https://api.dogpix.lol/api/images/upload"
        );
    }

    #[test]
    fn test_only_created_is_success() {
        assert!(check_status(StatusCode::CREATED).is_ok());
        assert!(matches!(
            check_status(StatusCode::OK),
            Err(UploadError::Rejected { status: 200 })
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_REQUEST),
            Err(UploadError::Rejected { status: 400 })
        ));
    }

    #[test]
    fn test_validate_accepts_png() {
        assert_eq!(uploader(1024).validate("dog.png", PNG_MAGIC).unwrap(), "image/png");
    }

    #[test]
    fn test_validate_rejects_non_images() {
        let err = uploader(1024).validate("notes.txt", b"hello there").unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(name) if name == "notes.txt"));
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let err = uploader(8).validate("dog.png", PNG_MAGIC).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 16, limit: 8 }));
    }

    #[tokio::test]
    async fn test_submit_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = uploader(1024)
            .submit_file(&dir.path().join("nope.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }

    #[tokio::test]
    async fn test_submit_file_not_an_image_never_hits_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"just text").unwrap();

        let err = uploader(1024).submit_file(&path).await.unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(_)));
    }

    #[tokio::test]
    async fn test_submit_bytes_posts_multipart_image() {
        let (base, requests) = spawn_test_server(CannedResponse::new(201, None, b""));
        let http = HttpClient::new(Some(std::time::Duration::from_secs(5))).unwrap();
        let uploader = Uploader::new(http, &base, 1024).unwrap();

        uploader
            .submit_bytes("dog.png", PNG_MAGIC.to_vec())
            .await
            .unwrap();

        let request = requests.recv().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/api/images/upload");
        assert!(request.headers["content-type"].starts_with("multipart/form-data; boundary="));

        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains(r#"name="image""#));
        assert!(body.contains(r#"filename="dog.png""#));
        assert!(body.to_ascii_lowercase().contains("content-type: image/png"));
        assert!(request.body.windows(PNG_MAGIC.len()).any(|w| w == PNG_MAGIC));
    }

    #[tokio::test]
    async fn test_submit_bytes_ok_is_not_created() {
        let (base, _requests) =
            spawn_test_server(CannedResponse::new(200, Some("application/json"), b"{}"));
        let uploader = Uploader::new(HttpClient::new(None).unwrap(), &base, 1024).unwrap();

        let err = uploader
            .submit_bytes("dog.png", PNG_MAGIC.to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected { status: 200 }));
    }

    #[tokio::test]
    async fn test_submit_bytes_server_unavailable() {
        let (base, _requests) = spawn_test_server(CannedResponse::new(503, None, b""));
        let uploader = Uploader::new(HttpClient::new(None).unwrap(), &base, 1024).unwrap();

        let err = uploader
            .submit_bytes("dog.png", PNG_MAGIC.to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected { status: 503 }));
    }
}
