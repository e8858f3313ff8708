use std::io::SeekFrom;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use super::{Resource, Stream, StreamError};

/// Shared handle to the [`Stream`] carried by a message body.
///
/// Cloning a `Body` clones the handle, not the bytes: every clone operates
/// on the same underlying stream, the way copy-on-write messages share their
/// body across `with_*` calls. The handle itself stays usable from multiple
/// threads, but no read/write ordering is promised, a single logical
/// request/response is expected to drive it from one flow at a time.
#[derive(Clone, Debug)]
pub struct Body {
    stream: Arc<Mutex<Stream>>,
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body {
    /// Creates a body over an empty, readable, writable, seekable in-memory
    /// stream.
    pub fn empty() -> Self {
        Self::from_stream(Stream::memory())
    }

    /// Creates a body holding `content`, rewound to the start.
    pub fn from_content<C: AsRef<[u8]>>(content: C) -> Self {
        let mut stream = Stream::memory();
        // memory streams are always writable and seekable
        let _written = stream.write(content.as_ref());
        let _rewound = stream.rewind();
        Self::from_stream(stream)
    }

    /// Wraps an existing stream.
    pub fn from_stream(stream: Stream) -> Self {
        Self { stream: Arc::new(Mutex::new(stream)) }
    }

    /// Opens a file-backed body.
    ///
    /// # Errors
    ///
    /// See [`Stream::open`].
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self, StreamError> {
        Stream::open(path, mode).map(Self::from_stream)
    }

    /// Returns `true` when both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }

    /// Locks and returns the underlying stream.
    pub fn stream(&self) -> MutexGuard<'_, Stream> {
        self.stream.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn is_readable(&self) -> bool {
        self.stream().is_readable()
    }

    pub fn is_writable(&self) -> bool {
        self.stream().is_writable()
    }

    pub fn is_seekable(&self) -> bool {
        self.stream().is_seekable()
    }

    pub fn eof(&self) -> bool {
        self.stream().eof()
    }

    pub fn size(&self) -> Option<u64> {
        self.stream().size()
    }

    pub fn tell(&self) -> Result<u64, StreamError> {
        self.stream().tell()
    }

    pub fn seek(&self, pos: SeekFrom) -> Result<u64, StreamError> {
        self.stream().seek(pos)
    }

    pub fn rewind(&self) -> Result<(), StreamError> {
        self.stream().rewind()
    }

    pub fn read(&self, length: usize) -> Result<Bytes, StreamError> {
        self.stream().read(length)
    }

    /// Reads the remaining contents from the current position.
    pub fn contents(&self) -> Result<Bytes, StreamError> {
        self.stream().contents()
    }

    /// Reads the full contents from the beginning of the stream.
    ///
    /// Seeks to the start first when the stream is seekable, mirroring
    /// string conversion of a message body.
    pub fn to_bytes(&self) -> Result<Bytes, StreamError> {
        let mut stream = self.stream();
        if stream.is_seekable() {
            stream.rewind()?;
        }
        stream.contents()
    }

    pub fn write(&self, data: &[u8]) -> Result<usize, StreamError> {
        self.stream().write(data)
    }

    /// Separates the underlying resource, leaving every clone of this body
    /// unusable.
    pub fn detach(&self) -> Option<Resource> {
        self.stream().detach()
    }

    pub fn close(&self) {
        self.stream().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_stream() {
        let body = Body::from_content("shared");
        let clone = body.clone();
        assert!(body.ptr_eq(&clone));

        body.seek(SeekFrom::End(0)).unwrap();
        clone.write(b" bytes").unwrap();

        assert_eq!(body.to_bytes().unwrap(), Bytes::from_static(b"shared bytes"));
    }

    #[test]
    fn from_content_is_rewound() {
        let body = Body::from_content("payload");
        assert_eq!(body.tell().unwrap(), 0);
        assert_eq!(body.contents().unwrap(), Bytes::from_static(b"payload"));
    }

    #[test]
    fn detach_applies_to_all_clones() {
        let body = Body::from_content("gone");
        let clone = body.clone();

        assert!(body.detach().is_some());
        assert!(matches!(clone.contents(), Err(StreamError::Unavailable)));
    }
}
