use hyper::StatusCode;
use thiserror::Error;

/// Every way an upload request can fail
#[derive(Debug, Error)]
pub enum UploadError {
    /// The `file` part could not be read from the request
    #[error("{0}")]
    Extraction(String),

    /// Declared size above the configured limit; carries the client message
    #[error("{0}")]
    TooLarge(String),

    /// Leading bytes match no known image signature
    #[error("{0}")]
    NotImage(String),

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("failed to read upload: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to store upload: {0}")]
    Write(#[source] std::io::Error),
}

impl UploadError {
    /// HTTP status reported to the client
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge(_) | Self::NotImage(_) | Self::InvalidFileName(_) => {
                StatusCode::BAD_REQUEST
            }
            // A missing or malformed `file` part is a 500
            Self::Extraction(_) | Self::Read(_) | Self::Write(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<multer::Error> for UploadError {
    fn from(err: multer::Error) -> Self {
        Self::Extraction(err.to_string())
    }
}
