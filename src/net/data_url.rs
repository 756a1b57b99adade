//! `data:` URLs for images held entirely in memory.
//!
//! Fetched payloads are turned into self-contained strings so a node's `url`
//! can be handed straight to whatever renders it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use thiserror::Error;

/// Used when neither the server nor the bytes say what the image is.
pub const FALLBACK_MIME: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("Not a data URL")]
    MissingScheme,
    #[error("Invalid data URL format")]
    MissingComma,
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Guess an image mime type from magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// File extension for an image mime type, `jpg` when unknown.
pub fn extension_for(mime: &str) -> &'static str {
    ImageFormat::from_mime_type(mime)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("jpg")
}

pub fn encode(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

pub fn decode(url: &str) -> Result<DataUrl, DataUrlError> {
    // Format: data:[<mediatype>][;base64],<data>
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingScheme)?;
    let (header, data) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };

    let bytes = if is_base64 {
        STANDARD.decode(data)?
    } else {
        urlencoding::decode_binary(data.as_bytes()).into_owned()
    };

    let mime = if mime.is_empty() { "text/plain" } else { mime };

    Ok(DataUrl {
        mime: mime.to_string(),
        bytes,
    })
}
