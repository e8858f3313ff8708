use std::borrow::Cow;

use tracing::trace;

use crate::error::HttpError;
use crate::stream::Body;
use crate::uri::Uri;

use super::message::Message;
use super::{HeaderValues, MessageError, ProtocolVersion};

/// An outgoing HTTP request.
///
/// Immutable: every `with_*` method returns a new value and leaves the
/// receiver untouched. The `Host` header is kept in sync with the URI, it
/// is derived from the URI authority at construction time and whenever the
/// URI changes, unless explicitly preserved.
#[derive(Clone, Debug)]
pub struct Request {
    message: Message,
    method: String,
    uri: Uri,
    request_target: Option<String>,
}

impl Request {
    /// Creates a request with the given method and URI and no headers.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidMethod`] when the method is empty.
    pub fn new(method: &str, uri: Uri) -> Result<Self, MessageError> {
        validate_method(method)?;
        let mut request = Self {
            message: Message::default(),
            method: method.to_owned(),
            uri,
            request_target: None,
        };
        request.sync_host_from_uri();
        Ok(request)
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Replaces the method. Methods are case-sensitive and stored as given.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidMethod`] when the method is empty.
    pub fn with_method(mut self, method: &str) -> Result<Self, MessageError> {
        if method == self.method {
            return Ok(self);
        }
        validate_method(method)?;
        self.method = method.to_owned();
        Ok(self)
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Replaces the URI.
    ///
    /// The `Host` header is re-derived from the new URI unless
    /// `preserve_host` is set and the request already carries a non-empty
    /// `Host` header. A URI without a host never clears an existing header.
    pub fn with_uri(mut self, uri: Uri, preserve_host: bool) -> Self {
        if uri == self.uri {
            return self;
        }
        self.uri = uri;
        if !preserve_host || !self.has_nonempty_host() {
            self.sync_host_from_uri();
        }
        self
    }

    /// The request target, derived from the URI path and query unless one
    /// was set explicitly. Falls back to `/` when the path is empty.
    pub fn request_target(&self) -> Cow<'_, str> {
        if let Some(target) = &self.request_target {
            return Cow::Borrowed(target);
        }

        let path = self.uri.path();
        if path.is_empty() {
            return Cow::Borrowed("/");
        }

        let query = self.uri.query();
        if query.is_empty() {
            path
        } else {
            Cow::Owned(format!("{path}?{query}"))
        }
    }

    /// Overrides the derived request target. An empty target restores
    /// derivation from the URI.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidRequestTarget`] when the target contains
    /// whitespace.
    pub fn with_request_target(mut self, target: &str) -> Result<Self, MessageError> {
        if target.contains(|c: char| c.is_ascii_whitespace()) {
            return Err(MessageError::invalid_request_target(target));
        }
        self.request_target = if target.is_empty() { None } else { Some(target.to_owned()) };
        Ok(self)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.message.version()
    }

    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.message = self.message.with_version(version);
        self
    }

    /// Iterates over all headers in order, registered spelling first.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.message.headers().iter()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.message.headers().has(name)
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.message.headers().values(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.message.headers().line(name)
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
        self.message = self.message.with_header(name, values)?;
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
        self.message = self.message.with_added_header(name, values)?;
        Ok(self)
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.message = self.message.without_header(name);
        self
    }

    pub fn body(&self) -> &Body {
        self.message.body()
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.message = self.message.with_body(body);
        self
    }

    pub(crate) fn from_parts(message: Message, method: String, uri: Uri) -> Self {
        let mut request = Self { message, method, uri, request_target: None };
        if !request.has_header("host") {
            request.sync_host_from_uri();
        }
        request
    }

    fn has_nonempty_host(&self) -> bool {
        self.header_values("host").iter().any(|value| !value.is_empty())
    }

    /// Derives the `Host` header from the URI authority and moves it to the
    /// front of the header list. Does nothing when the URI has no host.
    fn sync_host_from_uri(&mut self) {
        let host = self.uri.host();
        if host.is_empty() {
            return;
        }

        let mut value = host.to_owned();
        if let Some(port) = self.uri.port() {
            value.push(':');
            value.push_str(&port.to_string());
        }

        trace!(host = %value, "syncing host header from uri");
        self.message.headers_mut().promote_first("Host", value);
    }
}

/// Builds a [`Request`], validating everything in [`build`][Self::build].
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<String>,
    uri: Option<String>,
    headers: Vec<(String, HeaderValues)>,
    body: Option<Body>,
    version: Option<ProtocolVersion>,
}

impl RequestBuilder {
    /// Sets the method. Defaults to `GET`.
    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_owned());
        self
    }

    /// Sets the URI string. Defaults to the empty URI.
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = Some(uri.to_owned());
        self
    }

    /// Adds a header. Repeating a name appends to it.
    pub fn header<V: Into<HeaderValues>>(mut self, name: &str, values: V) -> Self {
        self.headers.push((name.to_owned(), values.into()));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Assembles the request, deriving the `Host` header from the URI when
    /// none was given.
    ///
    /// # Errors
    ///
    /// Any [`UriError`][crate::UriError] from parsing the URI and any
    /// [`MessageError`] from the method or headers.
    pub fn build(self) -> Result<Request, HttpError> {
        let uri = match self.uri.as_deref() {
            Some(uri) => Uri::new(uri)?,
            None => Uri::default(),
        };

        let method = self.method.unwrap_or_else(|| "GET".to_owned());
        validate_method(&method)?;

        let mut message = Message::default();
        if let Some(version) = self.version {
            message = message.with_version(version);
        }
        for (name, values) in self.headers {
            message.headers_mut().append(&name, values)?;
        }
        if let Some(body) = self.body {
            message = message.with_body(body);
        }

        Ok(Request::from_parts(message, method, uri))
    }
}

/// A method is any non-empty string, stored verbatim and matched
/// case-sensitively.
pub(crate) fn validate_method(method: &str) -> Result<(), MessageError> {
    if method.is_empty() {
        return Err(MessageError::invalid_method(method));
    }
    Ok(())
}
