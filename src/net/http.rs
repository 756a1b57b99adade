use futures_util::StreamExt;
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Resolve an API path against a base URL, keeping any path prefix the base
/// already carries.
pub fn api_url(base: &str, path: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

/// Raw response body plus the declared content type.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub status: StatusCode,
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    const USER_AGENT: &'static str = concat!("dogpix/", env!("CARGO_PKG_VERSION"));

    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(Self::USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GET `url` and collect the whole body, whatever the status.
    pub async fn get_bytes(&self, url: &Url) -> Result<Fetched, reqwest::Error> {
        let start = Instant::now();
        log::info!("Fetching bytes from: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        log::debug!(
            "Response: status={}, content-type={}, length={:?}",
            status,
            content_type.as_deref().unwrap_or("unknown"),
            content_length
        );

        let mut stream = response.bytes_stream();
        let mut bytes = Vec::with_capacity(content_length.unwrap_or(0).min(MAX_PREALLOC) as usize);
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
        }

        log::info!(
            "Received {} bytes in {:.0}ms",
            bytes.len(),
            start.elapsed().as_secs_f32() * 1000.0
        );

        Ok(Fetched {
            bytes,
            content_type,
            status,
        })
    }

    pub async fn post_multipart(
        &self,
        url: &Url,
        form: Form,
    ) -> Result<StatusCode, reqwest::Error> {
        let response = self.client.post(url.as_str()).multipart(form).send().await?;
        Ok(response.status())
    }
}
