//! Immutable HTTP message value objects
//!
//! This crate provides the value types an HTTP layer passes around: requests,
//! responses, server-side requests, URIs, byte streams and uploaded files.
//! It deliberately contains no I/O loop and no router; it is the vocabulary
//! those layers share.
//!
//! # Features
//!
//! - Immutable messages: `with_*` methods return a new value, clones taken
//!   before a mutation keep observing the old state
//! - Case-insensitive header access that preserves the registered spelling
//!   and insertion order
//! - A `Host` header kept in sync with the request URI
//! - RFC 3986 URI handling with component normalization and idempotent
//!   percent-encoding
//! - Bodies backed by memory buffers or files, shared across message clones
//! - Uploaded files with single-consumption semantics
//!
//! # Example
//!
//! ```
//! use micro_message::{Body, Request, Response};
//!
//! fn handle(request: &Request) -> Response {
//!     Response::builder()
//!         .status(200)
//!         .header("Content-Type", "text/plain")
//!         .body(Body::from_content(format!("{} {}", request.method(), request.request_target())))
//!         .build()
//!         .unwrap()
//! }
//!
//! let request = Request::builder()
//!     .method("GET")
//!     .uri("http://example.com/hello?name=world")
//!     .build()
//!     .unwrap();
//! assert_eq!(request.header_line("host"), "example.com");
//!
//! let response = handle(&request);
//! assert_eq!(response.reason_phrase(), "OK");
//! assert_eq!(
//!     response.body().to_bytes().unwrap().as_ref(),
//!     b"GET /hello?name=world"
//! );
//! ```

pub mod error;
pub mod factory;
pub mod protocol;
pub mod stream;
pub mod upload;
pub mod uri;

pub use error::HttpError;
pub use protocol::{
    HeaderBag, HeaderValues, MessageError, ProtocolVersion, Request, RequestBuilder, Response,
    ResponseBuilder, ServerRequest, ServerRequestBuilder,
};
pub use stream::{Body, Stream, StreamError};
pub use upload::{UploadStatus, UploadedFile, UploadedFileError, UploadedFiles};
pub use uri::{Scheme, Uri, UriError};
