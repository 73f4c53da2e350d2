use std::io;
use std::path::PathBuf;

use reqwest::{Method, StatusCode};
use snafu::Snafu;
use url::Url;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InitError {
    #[snafu(display("Invalid base url: {base_url}"))]
    BaseUrl {
        base_url: String,
        source: url::ParseError,
    },
    #[snafu(display("HTTP client initialization error"))]
    HttpClient { source: reqwest::Error },
}

pub type InitResult<T> = std::result::Result<T, InitError>;

/// Any failure of a request helper
///
/// "Not found" is not an error: reads report it as `Ok(None)`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    #[snafu(display("Invalid target: {target}"))]
    InvalidTarget {
        target: String,
        source: url::ParseError,
    },
    #[snafu(display("{method} {url} failed"))]
    Transport {
        method: Method,
        url: Url,
        source: reqwest::Error,
    },
    #[snafu(display("{method} {url} returned {status}: {body}"))]
    Status {
        method: Method,
        url: Url,
        status: StatusCode,
        body: String,
    },
    #[snafu(display("Can't encode request body for {method} {url}"))]
    Encode {
        method: Method,
        url: Url,
        source: serde_json::Error,
    },
    #[snafu(display("Invalid JSON in response to {method} {url}"))]
    Decode {
        method: Method,
        url: Url,
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP status, if the server responded at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response text of a non-success reply
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UploadFormError {
    #[snafu(display("Can't read {}", path.display()))]
    ReadFile { path: PathBuf, source: io::Error },
    #[snafu(display("Not a file path: {}", path.display()))]
    MissingFileName { path: PathBuf },
}

pub type UploadFormResult<T> = std::result::Result<T, UploadFormError>;
