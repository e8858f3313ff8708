use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::HttpError;
use crate::stream::Body;
use crate::upload::UploadedFiles;
use crate::uri::Uri;

use super::request::RequestBuilder;
use super::{HeaderValues, MessageError, ProtocolVersion, Request};

/// An incoming HTTP request as seen by a server.
///
/// Extends [`Request`] with the server-side state a handler works with:
/// the parameters of the connection, cookies, the parsed query string,
/// uploaded files, a parsed body and free-form per-request attributes.
/// Immutable like every message type; server parameters are fixed at
/// construction, everything else has a `with_*` mutator.
#[derive(Clone, Debug)]
pub struct ServerRequest {
    request: Request,
    server_params: Map<String, Value>,
    cookie_params: Map<String, Value>,
    query_params: Map<String, Value>,
    uploaded_files: UploadedFiles,
    parsed_body: Option<Value>,
    attributes: Map<String, Value>,
}

impl ServerRequest {
    pub fn builder() -> ServerRequestBuilder {
        ServerRequestBuilder::default()
    }

    /// Parameters of the connection and server environment, fixed at
    /// construction.
    pub fn server_params(&self) -> &Map<String, Value> {
        &self.server_params
    }

    pub fn cookie_params(&self) -> &Map<String, Value> {
        &self.cookie_params
    }

    /// Replaces the cookies. Independent of any `Cookie` header.
    pub fn with_cookie_params(mut self, cookies: Map<String, Value>) -> Self {
        self.cookie_params = cookies;
        self
    }

    pub fn query_params(&self) -> &Map<String, Value> {
        &self.query_params
    }

    /// Replaces the parsed query parameters. Independent of the URI query
    /// string.
    pub fn with_query_params(mut self, query: Map<String, Value>) -> Self {
        self.query_params = query;
        self
    }

    pub fn uploaded_files(&self) -> &UploadedFiles {
        &self.uploaded_files
    }

    pub fn with_uploaded_files(mut self, files: UploadedFiles) -> Self {
        self.uploaded_files = files;
        self
    }

    /// The parsed representation of the body, when a parser produced one.
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// Replaces the parsed body. Only structured data is accepted, a
    /// scalar would lose the distinction between "absent" and "empty".
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidParsedBody`] for values other than an
    /// object, an array or `None`.
    pub fn with_parsed_body(mut self, body: Option<Value>) -> Result<Self, MessageError> {
        if let Some(value) = &body {
            if !matches!(value, Value::Object(_) | Value::Array(_)) {
                return Err(MessageError::InvalidParsedBody);
            }
        }
        self.parsed_body = body;
        Ok(self)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Sets a per-request attribute.
    pub fn with_attribute<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.attributes.insert(name.to_owned(), value.into());
        self
    }

    /// Removes a per-request attribute; a no-op when absent.
    pub fn without_attribute(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }

    pub fn method(&self) -> &str {
        self.request.method()
    }

    /// See [`Request::with_method`].
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidMethod`] when the method is empty.
    pub fn with_method(mut self, method: &str) -> Result<Self, MessageError> {
        self.request = self.request.with_method(method)?;
        Ok(self)
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// See [`Request::with_uri`].
    pub fn with_uri(mut self, uri: Uri, preserve_host: bool) -> Self {
        self.request = self.request.with_uri(uri, preserve_host);
        self
    }

    pub fn request_target(&self) -> Cow<'_, str> {
        self.request.request_target()
    }

    /// See [`Request::with_request_target`].
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidRequestTarget`] when the target contains
    /// whitespace.
    pub fn with_request_target(mut self, target: &str) -> Result<Self, MessageError> {
        self.request = self.request.with_request_target(target)?;
        Ok(self)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.request.version()
    }

    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.request = self.request.with_version(version);
        self
    }

    /// Iterates over all headers in order, registered spelling first.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.request.headers()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.request.has_header(name)
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.request.header_values(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.request.header_line(name)
    }

    /// Replaces the header.
    ///
    /// # Errors
    ///
    /// See [`HeaderBag::insert`][super::HeaderBag::insert].
    pub fn with_header<V: Into<HeaderValues>>(
        mut self,
        name: &str,
        values: V,
    ) -> Result<Self, MessageError> {
        self.request = self.request.with_header(name, values)?;
        Ok(self)
    }

    /// Appends values to the header.
    ///
    /// # Errors
    ///
    /// See [`HeaderBag::append`][super::HeaderBag::append].
    pub fn with_added_header<V: Into<HeaderValues>>(
        mut self,
        name: &str,
        values: V,
    ) -> Result<Self, MessageError> {
        self.request = self.request.with_added_header(name, values)?;
        Ok(self)
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.request = self.request.without_header(name);
        self
    }

    pub fn body(&self) -> &Body {
        self.request.body()
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.request = self.request.with_body(body);
        self
    }
}

/// Builds a [`ServerRequest`], validating everything in
/// [`build`][Self::build].
#[derive(Debug, Default)]
pub struct ServerRequestBuilder {
    request: RequestBuilder,
    server_params: Map<String, Value>,
    cookie_params: Map<String, Value>,
    query_params: Map<String, Value>,
    uploaded_files: UploadedFiles,
    parsed_body: Option<Value>,
}

impl ServerRequestBuilder {
    /// Sets the method. Defaults to `GET`.
    pub fn method(mut self, method: &str) -> Self {
        self.request = self.request.method(method);
        self
    }

    /// Sets the URI string. Defaults to the empty URI.
    pub fn uri(mut self, uri: &str) -> Self {
        self.request = self.request.uri(uri);
        self
    }

    /// Adds a header. Repeating a name appends to it.
    pub fn header<V: Into<HeaderValues>>(mut self, name: &str, values: V) -> Self {
        self.request = self.request.header(name, values);
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.request = self.request.body(body);
        self
    }

    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.request = self.request.version(version);
        self
    }

    pub fn server_params(mut self, params: Map<String, Value>) -> Self {
        self.server_params = params;
        self
    }

    pub fn cookie_params(mut self, cookies: Map<String, Value>) -> Self {
        self.cookie_params = cookies;
        self
    }

    pub fn query_params(mut self, query: Map<String, Value>) -> Self {
        self.query_params = query;
        self
    }

    pub fn uploaded_files(mut self, files: UploadedFiles) -> Self {
        self.uploaded_files = files;
        self
    }

    /// Sets the parsed body, validated in [`build`][Self::build].
    pub fn parsed_body(mut self, body: Value) -> Self {
        self.parsed_body = Some(body);
        self
    }

    /// Assembles the server request, deriving the `Host` header from the
    /// URI when none was given.
    ///
    /// # Errors
    ///
    /// Same as [`RequestBuilder::build`], plus
    /// [`MessageError::InvalidParsedBody`] for a scalar parsed body.
    pub fn build(self) -> Result<ServerRequest, HttpError> {
        let request = ServerRequest {
            request: self.request.build()?,
            server_params: self.server_params,
            cookie_params: self.cookie_params,
            query_params: self.query_params,
            uploaded_files: self.uploaded_files,
            parsed_body: None,
            attributes: Map::new(),
        };
        Ok(request.with_parsed_body(self.parsed_body)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::upload::{UploadStatus, UploadedFile};

    use super::*;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn defaults_are_empty() {
        let request = ServerRequest::builder().build().unwrap();
        assert!(request.server_params().is_empty());
        assert!(request.cookie_params().is_empty());
        assert!(request.query_params().is_empty());
        assert!(request.uploaded_files().is_empty());
        assert!(request.parsed_body().is_none());
        assert!(request.attributes().is_empty());
        assert_eq!(request.method(), "GET");
    }

    #[test]
    fn server_params_are_fixed_at_construction() {
        let request = ServerRequest::builder()
            .server_params(map(&[("REMOTE_ADDR", json!("127.0.0.1"))]))
            .build()
            .unwrap();
        assert_eq!(request.server_params()["REMOTE_ADDR"], json!("127.0.0.1"));
    }

    #[test]
    fn attributes_are_set_and_removed() {
        let request = ServerRequest::builder().build().unwrap();
        let request = request.with_attribute("route", json!({"name": "home"}));

        assert_eq!(request.attribute("route"), Some(&json!({"name": "home"})));
        assert_eq!(request.attribute("missing"), None);

        let request = request.without_attribute("route").without_attribute("missing");
        assert!(request.attributes().is_empty());
    }

    #[test]
    fn parsed_body_accepts_structured_data_only() {
        let request = ServerRequest::builder().build().unwrap();

        let request = request.with_parsed_body(Some(json!({"name": "value"}))).unwrap();
        assert_eq!(request.parsed_body(), Some(&json!({"name": "value"})));

        let request = request.with_parsed_body(None).unwrap();
        assert!(request.parsed_body().is_none());

        assert!(matches!(
            request.clone().with_parsed_body(Some(json!("scalar"))),
            Err(MessageError::InvalidParsedBody)
        ));
        assert!(matches!(
            request.with_parsed_body(Some(json!(42))),
            Err(MessageError::InvalidParsedBody)
        ));
    }

    #[test]
    fn cookie_and_query_params_are_replaced() {
        let request = ServerRequest::builder()
            .build()
            .unwrap()
            .with_cookie_params(map(&[("session", json!("abc123"))]))
            .with_query_params(map(&[("page", json!("2")), ("tags", json!(["a", "b"]))]));

        assert_eq!(request.cookie_params()["session"], json!("abc123"));
        assert_eq!(request.query_params()["tags"], json!(["a", "b"]));
    }

    #[test]
    fn uploaded_files_are_attached() {
        let mut files = UploadedFiles::default();
        files.insert(
            "cv",
            UploadedFile::from_body(Body::from_content("doc"), Some(3), UploadStatus::Ok),
        );

        let request = ServerRequest::builder().build().unwrap().with_uploaded_files(files);
        assert_eq!(request.uploaded_files().file("cv").unwrap().size(), Some(3));
    }

    #[test]
    fn builder_carries_server_side_state() {
        let mut files = UploadedFiles::default();
        files.insert(
            "doc",
            UploadedFile::from_body(Body::from_content("d"), Some(1), UploadStatus::Ok),
        );

        let request = ServerRequest::builder()
            .cookie_params(map(&[("session", json!("s1"))]))
            .query_params(map(&[("q", json!("rust"))]))
            .uploaded_files(files)
            .parsed_body(json!({"q": "rust"}))
            .build()
            .unwrap();

        assert_eq!(request.cookie_params()["session"], json!("s1"));
        assert_eq!(request.query_params()["q"], json!("rust"));
        assert!(request.uploaded_files().file("doc").is_some());
        assert_eq!(request.parsed_body(), Some(&json!({"q": "rust"})));

        assert!(matches!(
            ServerRequest::builder().parsed_body(json!("scalar")).build(),
            Err(HttpError::Message(MessageError::InvalidParsedBody))
        ));
    }

    #[test]
    fn request_behavior_is_inherited() {
        let request = ServerRequest::builder()
            .method("POST")
            .uri("http://example.com:8080/submit?draft=1")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .build()
            .unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.header_values("host"), ["example.com:8080"]);
        assert_eq!(request.request_target(), "/submit?draft=1");
        assert_eq!(request.header_line("content-type"), "application/x-www-form-urlencoded");
    }

    #[test]
    fn mutators_leave_the_receiver_untouched() {
        let request = ServerRequest::builder().build().unwrap();
        let modified = request.clone().with_attribute("id", json!(7));

        assert!(request.attribute("id").is_none());
        assert_eq!(modified.attribute("id"), Some(&json!(7)));
    }
}
