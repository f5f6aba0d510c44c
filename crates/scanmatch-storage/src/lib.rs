use scanmatch_core::CoreError;
use thiserror::Error;

pub mod client;
pub mod source;

pub use client::FirebaseClient;
pub use source::RemoteDocumentSource;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("listing failed: {0}")]
    ListingFailed(String),
    #[error("failed to resolve item {name}: {message}")]
    ItemResolutionFailed { name: String, message: String },
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for CoreError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::ListingFailed(message) => CoreError::Listing(message),
            StorageError::ItemResolutionFailed { name, message } => {
                CoreError::ItemResolution(format!("{name}: {message}"))
            }
            StorageError::DownloadFailed(message) => CoreError::ItemResolution(message),
            StorageError::Http(error) => CoreError::ItemResolution(error.to_string()),
            StorageError::Io(error) => CoreError::ItemResolution(error.to_string()),
        }
    }
}
