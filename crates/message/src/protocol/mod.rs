//! Immutable HTTP message types.
//!
//! [`Request`], [`Response`] and [`ServerRequest`] share a common core of
//! protocol version, headers and body. All of them follow the same
//! mutation contract: `with_*` and `without_*` methods consume the
//! receiver and return a new value, so any clone taken before a mutation
//! keeps observing the old state. Bodies are the one exception, clones
//! share the underlying stream.

mod error;
mod header;
mod message;
mod request;
mod response;
mod server_request;
mod version;

pub use error::MessageError;
pub use header::{HeaderBag, HeaderValues};
pub use request::{Request, RequestBuilder};
pub use response::{standard_reason, Response, ResponseBuilder};
pub use server_request::{ServerRequest, ServerRequestBuilder};
pub use version::ProtocolVersion;
