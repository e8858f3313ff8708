//! Free functions for the common construction paths.
//!
//! Thin wrappers over the builders and constructors, for callers that
//! create messages generically and do not care about the intermediate
//! builder types.

use std::fs::File;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::HttpError;
use crate::protocol::{Request, Response, ServerRequest};
use crate::stream::{Body, Stream, StreamError};
use crate::upload::{UploadStatus, UploadedFile};
use crate::uri::{Uri, UriError};

/// Creates a request with the given method and URI.
///
/// # Errors
///
/// See [`RequestBuilder::build`][crate::protocol::RequestBuilder::build].
pub fn create_request(method: &str, uri: &str) -> Result<Request, HttpError> {
    Request::builder().method(method).uri(uri).build()
}

/// Creates a response with the given status code; an empty `reason` picks
/// the standard phrase.
///
/// # Errors
///
/// See [`ResponseBuilder::build`][crate::protocol::ResponseBuilder::build].
pub fn create_response(status: u16, reason: &str) -> Result<Response, HttpError> {
    let builder = Response::builder().status(status);
    if reason.is_empty() {
        builder.build()
    } else {
        builder.reason(reason).build()
    }
}

/// Creates a server request with the given method, URI and server
/// parameters.
///
/// # Errors
///
/// See [`ServerRequestBuilder::build`][crate::protocol::ServerRequestBuilder::build].
pub fn create_server_request(
    method: &str,
    uri: &str,
    server_params: Map<String, Value>,
) -> Result<ServerRequest, HttpError> {
    ServerRequest::builder()
        .method(method)
        .uri(uri)
        .server_params(server_params)
        .build()
}

/// Parses a URI.
///
/// # Errors
///
/// See [`Uri::new`].
pub fn create_uri(uri: &str) -> Result<Uri, UriError> {
    Uri::new(uri)
}

/// Creates an in-memory body holding `content`, rewound to the start.
pub fn create_stream<C: AsRef<[u8]>>(content: C) -> Body {
    Body::from_content(content)
}

/// Opens a file-backed body.
///
/// # Errors
///
/// See [`Stream::open`].
pub fn create_stream_from_file<P: AsRef<Path>>(path: P, mode: &str) -> Result<Body, StreamError> {
    Body::open(path, mode)
}

/// Wraps an already-open file handle in a body.
pub fn create_stream_from_handle(file: File) -> Body {
    Body::from_stream(Stream::from_handle(file))
}

/// Creates an uploaded file over a stream with its client metadata.
pub fn create_uploaded_file(
    body: Body,
    size: Option<u64>,
    status: UploadStatus,
    client_filename: Option<&str>,
    client_media_type: Option<&str>,
) -> UploadedFile {
    let mut upload = UploadedFile::from_body(body, size, status);
    if let Some(filename) = client_filename {
        upload = upload.with_client_filename(filename);
    }
    if let Some(media_type) = client_media_type {
        upload = upload.with_client_media_type(media_type);
    }
    upload
}
