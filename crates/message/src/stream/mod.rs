//! Byte stream wrapper backing message bodies and uploaded files.
//!
//! A [`Stream`] owns either an in-memory buffer or an open file and exposes
//! the read/write/seek surface messages need. Capabilities are derived from
//! the `fopen`-style mode string the stream was opened with, so a stream
//! opened read-only reports a clean [`StreamError::NotWritable`] instead of
//! bubbling up an opaque OS error.
//!
//! Streams are plain owned values; the shared handle that messages hold is
//! [`Body`].

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

mod body;
pub use body::Body;

mod error;
pub use error::StreamError;

/// Chunk size used when draining a stream of unknown length.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// The resource underlying a [`Stream`].
///
/// Returned by [`Stream::detach`] so callers can keep using the raw handle
/// after the stream itself becomes unusable.
#[derive(Debug)]
pub enum Resource {
    /// Growable in-memory buffer.
    Buffer(Cursor<Vec<u8>>),
    /// Open file handle.
    File(File),
}

impl Resource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Buffer(cursor) => cursor.read(buf),
            Self::File(file) => file.read(buf),
        }
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Buffer(cursor) => cursor.write(data),
            Self::File(file) => file.write(data),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Self::Buffer(cursor) => cursor.seek(pos),
            Self::File(file) => file.seek(pos),
        }
    }
}

/// A readable/writable/seekable byte stream over a file or memory buffer.
///
/// Operations on a closed or detached stream fail with
/// [`StreamError::Unavailable`]; operations the open mode does not permit
/// fail with [`StreamError::NotReadable`] / [`NotWritable`] /
/// [`NotSeekable`].
///
/// [`NotWritable`]: StreamError::NotWritable
/// [`NotSeekable`]: StreamError::NotSeekable
#[derive(Debug)]
pub struct Stream {
    resource: Option<Resource>,
    readable: bool,
    writable: bool,
    seekable: bool,
    /// Cached byte size, invalidated by writes.
    size: Option<u64>,
    /// Set when a read attempt returned no bytes, cleared by seeking.
    eof: bool,
}

impl Default for Stream {
    fn default() -> Self {
        Self::memory()
    }
}

impl Stream {
    /// Creates an empty, readable, writable, seekable in-memory stream.
    pub fn memory() -> Self {
        Self {
            resource: Some(Resource::Buffer(Cursor::new(Vec::new()))),
            readable: true,
            writable: true,
            seekable: true,
            size: None,
            eof: false,
        }
    }

    /// Opens a file stream with an `fopen`-style mode string.
    ///
    /// Supported base modes are `r`, `r+`, `w`, `w+`, `a`, `a+`, `x`, `x+`,
    /// `c` and `c+`; a `b` or `t` suffix is accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidMode`] for an unknown mode string and
    /// [`StreamError::Io`] when the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let (options, readable, writable) = parse_mode(mode)?;

        debug!(path = %path.display(), mode, "opening file stream");
        let file = options.open(path)?;

        Ok(Self {
            resource: Some(Resource::File(file)),
            readable,
            writable,
            seekable: true,
            size: None,
            eof: false,
        })
    }

    /// Wraps an already-open file handle.
    ///
    /// The open mode of a [`File`] cannot be introspected, so the stream is
    /// reported readable, writable and seekable; an incompatible operation
    /// surfaces as [`StreamError::Io`] from the first failing OS call.
    pub fn from_handle(file: File) -> Self {
        Self {
            resource: Some(Resource::File(file)),
            readable: true,
            writable: true,
            seekable: true,
            size: None,
            eof: false,
        }
    }

    /// Returns `true` while the stream still owns its resource.
    pub fn is_available(&self) -> bool {
        self.resource.is_some()
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Returns `true` once a read attempt has hit the end of the stream, or
    /// when no resource is available.
    pub fn eof(&self) -> bool {
        self.resource.is_none() || self.eof
    }

    /// Returns the size of the stream in bytes, if known.
    ///
    /// The size is cached until the next write.
    pub fn size(&mut self) -> Option<u64> {
        if self.size.is_some() {
            return self.size;
        }

        self.size = match self.resource.as_ref()? {
            Resource::Buffer(cursor) => Some(cursor.get_ref().len() as u64),
            Resource::File(file) => file.metadata().ok().map(|meta| meta.len()),
        };
        self.size
    }

    /// Returns the current position of the read/write cursor.
    pub fn tell(&mut self) -> Result<u64, StreamError> {
        let resource = self.resource.as_mut().ok_or(StreamError::Unavailable)?;
        match resource {
            Resource::Buffer(cursor) => Ok(cursor.position()),
            Resource::File(file) => Ok(file.stream_position()?),
        }
    }

    /// Seeks to a position in the stream.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let resource = self.resource.as_mut().ok_or(StreamError::Unavailable)?;

        if !self.seekable {
            return Err(StreamError::NotSeekable);
        }

        let position = resource.seek(pos)?;
        self.eof = false;
        Ok(position)
    }

    /// Seeks to the beginning of the stream.
    pub fn rewind(&mut self) -> Result<(), StreamError> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Reads up to `length` bytes from the current position.
    ///
    /// Fewer bytes may be returned if the underlying resource has fewer
    /// available; an empty result marks the end of the stream.
    pub fn read(&mut self, length: usize) -> Result<Bytes, StreamError> {
        let resource = self.resource.as_mut().ok_or(StreamError::Unavailable)?;

        if !self.readable {
            return Err(StreamError::NotReadable);
        }

        let mut buf = vec![0u8; length];
        let n = resource.read(&mut buf)?;
        buf.truncate(n);

        if n == 0 && length > 0 {
            self.eof = true;
        }

        Ok(Bytes::from(buf))
    }

    /// Reads the remaining contents from the current position to the end.
    pub fn contents(&mut self) -> Result<Bytes, StreamError> {
        let resource = self.resource.as_mut().ok_or(StreamError::Unavailable)?;

        if !self.readable {
            return Err(StreamError::NotReadable);
        }

        let mut buf = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let n = resource.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        self.eof = true;
        Ok(Bytes::from(buf))
    }

    /// Writes `data` at the current position, returning the number of bytes
    /// written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        let resource = self.resource.as_mut().ok_or(StreamError::Unavailable)?;

        if !self.writable {
            return Err(StreamError::NotWritable);
        }

        self.size = None;
        Ok(resource.write(data)?)
    }

    /// Separates the underlying resource from the stream.
    ///
    /// The stream is unusable afterwards: every operation fails with
    /// [`StreamError::Unavailable`].
    pub fn detach(&mut self) -> Option<Resource> {
        self.readable = false;
        self.writable = false;
        self.seekable = false;
        self.size = None;
        self.resource.take()
    }

    /// Closes the stream, dropping the underlying resource.
    pub fn close(&mut self) {
        drop(self.detach());
    }
}

fn parse_mode(mode: &str) -> Result<(OpenOptions, bool, bool), StreamError> {
    // binary/text suffixes carry no meaning here
    let base: String = mode.chars().filter(|c| !matches!(c, 'b' | 't')).collect();

    let mut options = OpenOptions::new();
    let (readable, writable) = match base.as_str() {
        "r" => {
            options.read(true);
            (true, false)
        }
        "r+" => {
            options.read(true).write(true);
            (true, true)
        }
        "w" => {
            options.write(true).create(true).truncate(true);
            (false, true)
        }
        "w+" => {
            options.read(true).write(true).create(true).truncate(true);
            (true, true)
        }
        "a" => {
            options.append(true).create(true);
            (false, true)
        }
        "a+" => {
            options.read(true).append(true).create(true);
            (true, true)
        }
        "x" => {
            options.write(true).create_new(true);
            (false, true)
        }
        "x+" => {
            options.read(true).write(true).create_new(true);
            (true, true)
        }
        "c" => {
            options.write(true).create(true);
            (false, true)
        }
        "c+" => {
            options.read(true).write(true).create(true);
            (true, true)
        }
        _ => return Err(StreamError::invalid_mode(mode)),
    };

    Ok((options, readable, writable))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let unique = format!("micro-message-{}-{}", std::process::id(), name);
        std::env::temp_dir().join(unique)
    }

    #[test]
    fn memory_stream_read_write_seek() {
        let mut stream = Stream::memory();
        assert!(stream.is_readable());
        assert!(stream.is_writable());
        assert!(stream.is_seekable());
        assert_eq!(stream.size(), Some(0));

        assert_eq!(stream.write(b"hello world").unwrap(), 11);
        assert_eq!(stream.size(), Some(11));
        assert_eq!(stream.tell().unwrap(), 11);

        stream.rewind().unwrap();
        assert_eq!(stream.read(5).unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(stream.contents().unwrap(), Bytes::from_static(b" world"));
        assert!(stream.eof());

        stream.seek(SeekFrom::Start(6)).unwrap();
        assert!(!stream.eof());
        assert_eq!(stream.contents().unwrap(), Bytes::from_static(b"world"));
    }

    #[test]
    fn detached_stream_is_unusable() {
        let mut stream = Stream::memory();
        stream.write(b"data").unwrap();

        let resource = stream.detach();
        assert!(matches!(resource, Some(Resource::Buffer(_))));

        assert!(!stream.is_available());
        assert!(!stream.is_readable());
        assert!(!stream.is_writable());
        assert!(!stream.is_seekable());
        assert!(stream.eof());
        assert_eq!(stream.size(), None);

        assert!(matches!(stream.read(1), Err(StreamError::Unavailable)));
        assert!(matches!(stream.write(b"x"), Err(StreamError::Unavailable)));
        assert!(matches!(stream.tell(), Err(StreamError::Unavailable)));
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(StreamError::Unavailable)));
    }

    #[test]
    fn file_stream_respects_mode() {
        let path = temp_path("mode.txt");
        std::fs::write(&path, b"content").unwrap();

        let mut stream = Stream::open(&path, "r").unwrap();
        assert!(stream.is_readable());
        assert!(!stream.is_writable());
        assert_eq!(stream.size(), Some(7));
        assert!(matches!(stream.write(b"nope"), Err(StreamError::NotWritable)));
        assert_eq!(stream.contents().unwrap(), Bytes::from_static(b"content"));

        let mut stream = Stream::open(&path, "w").unwrap();
        assert!(!stream.is_readable());
        assert!(stream.is_writable());
        assert!(matches!(stream.read(1), Err(StreamError::NotReadable)));
        stream.write(b"replaced").unwrap();
        drop(stream);

        assert_eq!(std::fs::read(&path).unwrap(), b"replaced");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let path = temp_path("unused.txt");
        assert!(matches!(
            Stream::open(&path, "rw"),
            Err(StreamError::InvalidMode { .. })
        ));
    }
}
