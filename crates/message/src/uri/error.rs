use thiserror::Error;

/// An error raised while parsing or mutating a [`Uri`][super::Uri].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("the source URI string appears to be malformed")]
    Malformed,

    #[error("unsupported scheme {scheme:?}, it must be an empty string, \"http\" or \"https\"")]
    UnsupportedScheme { scheme: String },

    #[error("invalid port {port}, it must be in the 1..=65535 range")]
    InvalidPort { port: u32 },
}

impl UriError {
    pub fn unsupported_scheme<S: ToString>(scheme: S) -> Self {
        Self::UnsupportedScheme { scheme: scheme.to_string() }
    }

    pub fn invalid_port(port: u32) -> Self {
        Self::InvalidPort { port }
    }
}
