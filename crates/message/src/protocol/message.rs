use once_cell::sync::OnceCell;

use crate::stream::Body;

use super::{HeaderBag, HeaderValues, MessageError, ProtocolVersion};

/// State shared by every HTTP message: protocol version, headers and body.
///
/// [`Request`][super::Request], [`Response`][super::Response] and
/// [`ServerRequest`][super::ServerRequest] embed this and delegate to it.
/// The body is materialized lazily so that messages which never touch it
/// do not allocate a stream.
#[derive(Clone, Debug)]
pub(crate) struct Message {
    version: ProtocolVersion,
    headers: HeaderBag,
    body: OnceCell<Body>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::default(),
            headers: HeaderBag::default(),
            body: OnceCell::new(),
        }
    }
}

impl Message {
    pub(crate) fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub(crate) fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn headers(&self) -> &HeaderBag {
        &self.headers
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderBag {
        &mut self.headers
    }

    pub(crate) fn with_header<V: Into<HeaderValues>>(
        mut self,
        name: &str,
        values: V,
    ) -> Result<Self, MessageError> {
        self.headers.insert(name, values)?;
        Ok(self)
    }

    pub(crate) fn with_added_header<V: Into<HeaderValues>>(
        mut self,
        name: &str,
        values: V,
    ) -> Result<Self, MessageError> {
        self.headers.append(name, values)?;
        Ok(self)
    }

    pub(crate) fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// The message body, created empty on first access.
    pub(crate) fn body(&self) -> &Body {
        self.body.get_or_init(Body::empty)
    }

    pub(crate) fn with_body(self, body: Body) -> Self {
        if self.body.get().is_some_and(|current| current.ptr_eq(&body)) {
            return self;
        }
        Self { body: OnceCell::with_value(body), ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_created_lazily_and_shared_with_clones() {
        let message = Message::default();
        let body = message.body().clone();
        assert!(message.clone().body().ptr_eq(&body));
    }

    #[test]
    fn with_body_is_a_no_op_for_the_same_handle() {
        let body = Body::from_content("x");
        let message = Message::default().with_body(body.clone());
        let unchanged = message.with_body(body.clone());
        assert!(unchanged.body().ptr_eq(&body));
    }
}
