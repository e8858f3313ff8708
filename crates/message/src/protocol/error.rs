use thiserror::Error;

/// An error raised while validating message components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("invalid header name {name:?}, it must be an RFC 7230 token")]
    InvalidHeaderName { name: String },

    #[error("invalid value {value:?} for header {name:?}, it must contain only visible characters, spaces and tabs")]
    InvalidHeaderValue { name: String, value: String },

    #[error("header {name:?} must be given at least one value")]
    EmptyHeaderValues { name: String },

    #[error("unsupported protocol version {version:?}, it must be one of \"1.0\", \"1.1\", \"2.0\" or \"2\"")]
    UnsupportedVersion { version: String },

    #[error("invalid method {method:?}, it must be a non-empty string")]
    InvalidMethod { method: String },

    #[error("invalid request target {target:?}, it must not contain whitespace")]
    InvalidRequestTarget { target: String },

    #[error("invalid status code {code}, it must be in the 100..=599 range")]
    InvalidStatusCode { code: u16 },

    #[error("parsed body must be a JSON object or array")]
    InvalidParsedBody,
}

impl MessageError {
    pub fn invalid_header_name<S: ToString>(name: S) -> Self {
        Self::InvalidHeaderName { name: name.to_string() }
    }

    pub fn invalid_header_value<N: ToString, V: ToString>(name: N, value: V) -> Self {
        Self::InvalidHeaderValue { name: name.to_string(), value: value.to_string() }
    }

    pub fn empty_header_values<S: ToString>(name: S) -> Self {
        Self::EmptyHeaderValues { name: name.to_string() }
    }

    pub fn unsupported_version<S: ToString>(version: S) -> Self {
        Self::UnsupportedVersion { version: version.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_request_target<S: ToString>(target: S) -> Self {
        Self::InvalidRequestTarget { target: target.to_string() }
    }

    pub fn invalid_status_code(code: u16) -> Self {
        Self::InvalidStatusCode { code }
    }
}
