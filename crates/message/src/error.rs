use thiserror::Error;

use crate::protocol::MessageError;
use crate::stream::StreamError;
use crate::upload::UploadedFileError;
use crate::uri::UriError;

/// Umbrella error for operations that can fail in more than one layer,
/// builders most of all. Each variant wraps the layer's own error type.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    UploadedFile(#[from] UploadedFileError),
}
