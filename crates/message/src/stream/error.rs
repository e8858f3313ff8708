use std::io;
use thiserror::Error;

/// An error raised by [`Stream`][super::Stream] operations.
///
/// Every variant reports a misuse of the stream (closed, detached, or
/// mode-incompatible) except [`Io`][StreamError::Io], which carries the
/// underlying operating system failure.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("no resource available, the stream has been closed or detached")]
    Unavailable,

    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("invalid stream mode: {mode:?}")]
    InvalidMode { mode: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl StreamError {
    pub fn invalid_mode<S: ToString>(mode: S) -> Self {
        Self::InvalidMode { mode: mode.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
