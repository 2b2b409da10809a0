use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TerminologyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build request URL: {0}")]
    UrlParse(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("upload not permitted: {0}")]
    UploadNotPermitted(String),
    #[error("failed to read upload file: {0}")]
    UploadFileRead(std::io::Error),

    #[error("failed to read document: {0}")]
    DocumentRead(std::io::Error),
    #[error(
        "failed to deserialize document (path: {path}): {source}",
        path = path.display()
    )]
    DocumentDeserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Text(#[from] ayush_types::TextError),
}

pub type TerminologyResult<T> = std::result::Result<T, TerminologyError>;
