use crate::error::HttpError;
use crate::stream::Body;

use super::message::Message;
use super::{HeaderValues, MessageError, ProtocolVersion};

/// An outgoing HTTP response.
///
/// Immutable: every `with_*` method returns a new value and leaves the
/// receiver untouched.
#[derive(Clone, Debug)]
pub struct Response {
    message: Message,
    status: u16,
    reason: String,
}

impl Response {
    /// Creates a response with the given status code, no headers and the
    /// standard reason phrase.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidStatusCode`] outside the 100..=599 range.
    pub fn new(status: u16) -> Result<Self, MessageError> {
        validate_status(status)?;
        Ok(Self {
            message: Message::default(),
            status,
            reason: standard_reason(status).to_owned(),
        })
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The reason phrase: the explicitly set one, the standard phrase for
    /// the status code, or empty when neither exists.
    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    /// Replaces the status code and reason phrase.
    ///
    /// An empty or absent `reason` falls back to the standard phrase for
    /// the code.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidStatusCode`] outside the 100..=599 range.
    pub fn with_status(mut self, status: u16, reason: Option<&str>) -> Result<Self, MessageError> {
        validate_status(status)?;
        let reason = match reason {
            Some(reason) if !reason.is_empty() => reason,
            _ => standard_reason(status),
        };
        if status == self.status && reason == self.reason {
            return Ok(self);
        }
        self.status = status;
        self.reason = reason.to_owned();
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
}

impl Default for Response {
    /// A `200 OK` response.
    fn default() -> Self {
        Self {
            message: Message::default(),
            status: 200,
            reason: standard_reason(200).to_owned(),
        }
    }
}

/// Builds a [`Response`], validating everything in [`build`][Self::build].
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<u16>,
    reason: Option<String>,
    headers: Vec<(String, HeaderValues)>,
    body: Option<Body>,
    version: Option<ProtocolVersion>,
}

impl ResponseBuilder {
    /// Sets the status code. Defaults to 200.
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a custom reason phrase.
    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_owned());
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

    /// Assembles the response.
    ///
    /// # Errors
    ///
    /// Any [`MessageError`] from the status code or headers.
    pub fn build(self) -> Result<Response, HttpError> {
        let status = self.status.unwrap_or(200);
        let mut response = Response::new(status)?;
        if let Some(reason) = self.reason {
            response = response.with_status(status, Some(&reason))?;
        }
        if let Some(version) = self.version {
            response = response.with_version(version);
        }
        for (name, values) in self.headers {
            response.message.headers_mut().append(&name, values)?;
        }
        if let Some(body) = self.body {
            response = response.with_body(body);
        }
        Ok(response)
    }
}

fn validate_status(status: u16) -> Result<(), MessageError> {
    if !(100..=599).contains(&status) {
        return Err(MessageError::invalid_status_code(status));
    }
    Ok(())
}

/// The IANA-registered reason phrase for a status code, empty when the code
/// has none.
pub fn standard_reason(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_response_is_200_ok() {
        let response = Response::default();
        assert_eq!(response.status(), 200);
        assert_eq!(response.reason_phrase(), "OK");
        assert_eq!(response.version(), ProtocolVersion::V1_1);
    }

    #[test]
    fn standard_reason_is_looked_up() {
        let response = Response::new(404).unwrap();
        assert_eq!(response.reason_phrase(), "Not Found");

        let response = response.with_status(511, None).unwrap();
        assert_eq!(response.reason_phrase(), "Network Authentication Required");
    }

    #[test]
    fn unregistered_codes_have_no_phrase() {
        let response = Response::new(599).unwrap();
        assert_eq!(response.reason_phrase(), "");
    }

    #[test]
    fn custom_reason_wins_and_empty_restores_standard() {
        let response = Response::new(404).unwrap().with_status(404, Some("Nothing Here")).unwrap();
        assert_eq!(response.reason_phrase(), "Nothing Here");

        let response = response.with_status(404, Some("")).unwrap();
        assert_eq!(response.reason_phrase(), "Not Found");
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        assert!(matches!(Response::new(99), Err(MessageError::InvalidStatusCode { code: 99 })));
        assert!(matches!(Response::new(600), Err(MessageError::InvalidStatusCode { code: 600 })));
        assert!(matches!(
            Response::default().with_status(1000, None),
            Err(MessageError::InvalidStatusCode { code: 1000 })
        ));
    }

    #[test]
    fn builder_assembles_headers_and_body() {
        let response = Response::builder()
            .status(201)
            .header("Location", "/things/42")
            .header("X-Twice", "a")
            .header("x-twice", "b")
            .body(Body::from_content("created"))
            .build()
            .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.header_line("location"), "/things/42");
        assert_eq!(response.header_values("x-twice"), ["a", "b"]);
        assert_eq!(response.body().to_bytes().unwrap().as_ref(), b"created");
    }

    #[test]
    fn builder_applies_a_custom_reason() {
        let response = Response::builder().status(404).reason("Nothing Here").build().unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(response.reason_phrase(), "Nothing Here");

        // an empty builder reason falls back to the standard phrase
        let response = Response::builder().status(404).reason("").build().unwrap();
        assert_eq!(response.reason_phrase(), "Not Found");
    }

    #[test]
    fn mutators_leave_the_receiver_untouched() {
        let response = Response::default();
        let modified = response.clone().with_status(404, None).unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(modified.status(), 404);
    }
}
