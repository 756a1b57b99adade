pub mod data_url;
pub mod http;
pub mod source;
pub mod upload;

pub use http::HttpClient;
pub use source::{FetchError, HttpImageSource, ImagePayload, ImageSource};
pub use upload::{UploadError, Uploader};

#[cfg(test)]
pub(crate) mod test_server;
