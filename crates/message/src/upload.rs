//! Uploaded files attached to a server request.
//!
//! An [`UploadedFile`] wraps either a temporary file on disk or an
//! already-open stream, together with the upload metadata the client
//! declared. It can be consumed exactly once, by reading it as a
//! [`Body`] or by moving it to its final location; every clone observes
//! the consumed state.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::debug;

use crate::stream::{Body, Stream, StreamError};

/// Bytes copied per iteration when draining a stream-backed upload to disk.
const MOVE_CHUNK_SIZE: usize = 512_000;

/// Outcome of a file upload, mirroring the conventional CGI error codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    /// The upload completed successfully.
    #[default]
    Ok,
    /// The file exceeds the maximum size allowed by the server.
    IniSize,
    /// The file exceeds the maximum size declared by the form.
    FormSize,
    /// The file was only partially uploaded.
    Partial,
    /// No file was uploaded.
    NoFile,
    /// The server has no temporary directory to store the file in.
    NoTmpDir,
    /// The server failed to write the file to disk.
    CantWrite,
    /// An extension stopped the upload.
    Extension,
}

impl UploadStatus {
    /// The conventional numeric code for the status.
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
        }
    }

    /// Decodes a conventional numeric code. Code 5 is unassigned.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::IniSize),
            2 => Some(Self::FormSize),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::NoTmpDir),
            7 => Some(Self::CantWrite),
            8 => Some(Self::Extension),
            _ => None,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "the upload completed successfully",
            Self::IniSize => "the uploaded file exceeds the maximum size allowed by the server",
            Self::FormSize => "the uploaded file exceeds the maximum size declared by the form",
            Self::Partial => "the file was only partially uploaded",
            Self::NoFile => "no file was uploaded",
            Self::NoTmpDir => "missing a temporary directory to store the file in",
            Self::CantWrite => "failed to write the file to disk",
            Self::Extension => "an extension stopped the file upload",
        }
    }
}

/// An error raised while reading or moving an [`UploadedFile`].
#[derive(Error, Debug)]
pub enum UploadedFileError {
    #[error("the upload did not complete: {}", .status.reason())]
    Failed { status: UploadStatus },

    #[error("the uploaded file has already been moved")]
    AlreadyMoved,

    #[error("the target path must not be empty")]
    EmptyTargetPath,

    #[error("the directory {} does not exist or is not writable", .path.display())]
    TargetDirectory { path: PathBuf },

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where the uploaded bytes currently live. Cleared once consumed.
#[derive(Debug)]
struct Source {
    moved: bool,
    file: Option<PathBuf>,
    stream: Option<Body>,
}

/// A single file received with a request.
///
/// Clones share the consumed state: moving one clone marks them all moved.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    source: Arc<Mutex<Source>>,
    size: Option<u64>,
    status: UploadStatus,
    client_filename: Option<String>,
    client_media_type: Option<String>,
}

impl UploadedFile {
    /// Wraps a temporary file on disk.
    pub fn from_file<P: Into<PathBuf>>(path: P, size: Option<u64>, status: UploadStatus) -> Self {
        Self {
            source: Arc::new(Mutex::new(Source {
                moved: false,
                file: Some(path.into()),
                stream: None,
            })),
            size,
            status,
            client_filename: None,
            client_media_type: None,
        }
    }

    /// Wraps an already-open stream.
    pub fn from_body(body: Body, size: Option<u64>, status: UploadStatus) -> Self {
        Self {
            source: Arc::new(Mutex::new(Source {
                moved: false,
                file: None,
                stream: Some(body),
            })),
            size,
            status,
            client_filename: None,
            client_media_type: None,
        }
    }

    /// Attaches the filename the client declared.
    pub fn with_client_filename(mut self, filename: &str) -> Self {
        self.client_filename = Some(filename.to_owned());
        self
    }

    /// Attaches the media type the client declared.
    pub fn with_client_media_type(mut self, media_type: &str) -> Self {
        self.client_media_type = Some(media_type.to_owned());
        self
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// The filename the client declared. Untrusted, never use it as a path.
    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    /// The media type the client declared. Untrusted.
    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    /// Opens the uploaded bytes as a body. A file-backed upload is opened
    /// lazily on first call and the handle is reused afterwards.
    ///
    /// # Errors
    ///
    /// [`UploadedFileError::Failed`] when the upload did not complete and
    /// [`UploadedFileError::AlreadyMoved`] after a move.
    pub fn body(&self) -> Result<Body, UploadedFileError> {
        let mut source = self.usable_source()?;

        if let Some(stream) = &source.stream {
            return Ok(stream.clone());
        }

        // usable_source ruled out the moved state, a file must remain
        let file = source.file.clone().ok_or(UploadedFileError::AlreadyMoved)?;
        let body = Body::open(&file, "r+")?;
        source.stream = Some(body.clone());
        Ok(body)
    }

    /// Moves the uploaded bytes to `target`, consuming the upload.
    ///
    /// A file-backed upload is renamed; a stream-backed one is drained to
    /// the target in chunks.
    ///
    /// # Errors
    ///
    /// [`UploadedFileError::Failed`], [`UploadedFileError::AlreadyMoved`],
    /// [`UploadedFileError::EmptyTargetPath`] and
    /// [`UploadedFileError::TargetDirectory`], plus any I/O failure.
    pub fn move_to<P: AsRef<Path>>(&self, target: P) -> Result<(), UploadedFileError> {
        let target = target.as_ref();
        if target.as_os_str().is_empty() {
            return Err(UploadedFileError::EmptyTargetPath);
        }

        let mut source = self.usable_source()?;

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.is_dir() || fs::metadata(dir)?.permissions().readonly() {
            return Err(UploadedFileError::TargetDirectory { path: dir.to_owned() });
        }

        if let Some(file) = &source.file {
            fs::rename(file, target)?;
        } else if let Some(stream) = &source.stream {
            if stream.is_seekable() {
                stream.rewind()?;
            }
            let mut dest = Stream::open(target, "w")?;
            while !stream.eof() {
                let chunk = stream.read(MOVE_CHUNK_SIZE)?;
                if chunk.is_empty() {
                    break;
                }
                dest.write(&chunk)?;
            }
        } else {
            return Err(UploadedFileError::AlreadyMoved);
        }

        debug!(target = %target.display(), "uploaded file moved");
        source.moved = true;
        source.file = None;
        source.stream = None;
        Ok(())
    }

    fn usable_source(&self) -> Result<MutexGuard<'_, Source>, UploadedFileError> {
        if self.status != UploadStatus::Ok {
            return Err(UploadedFileError::Failed { status: self.status });
        }
        let source = self.source.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if source.moved {
            return Err(UploadedFileError::AlreadyMoved);
        }
        Ok(source)
    }
}

/// A node in an uploaded-files tree: a single file or a named group, the
/// way multipart forms nest fields.
#[derive(Clone, Debug)]
pub enum UploadedFileNode {
    File(UploadedFile),
    Group(UploadedFiles),
}

impl From<UploadedFile> for UploadedFileNode {
    fn from(file: UploadedFile) -> Self {
        Self::File(file)
    }
}

impl From<UploadedFiles> for UploadedFileNode {
    fn from(group: UploadedFiles) -> Self {
        Self::Group(group)
    }
}

/// The uploaded files of a request, keyed by field name and arbitrarily
/// nested.
#[derive(Clone, Debug, Default)]
pub struct UploadedFiles {
    entries: BTreeMap<String, UploadedFileNode>,
}

impl UploadedFiles {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts a file or group under a field name, replacing any previous
    /// entry.
    pub fn insert<N: Into<UploadedFileNode>>(&mut self, name: &str, node: N) {
        self.entries.insert(name.to_owned(), node.into());
    }

    pub fn get(&self, name: &str) -> Option<&UploadedFileNode> {
        self.entries.get(name)
    }

    /// The file under the field name, if the entry is a single file.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        match self.entries.get(name) {
            Some(UploadedFileNode::File(file)) => Some(file),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UploadedFileNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }
}

impl<N: Into<UploadedFileNode>> FromIterator<(String, N)> for UploadedFiles {
    fn from_iter<T: IntoIterator<Item = (String, N)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(name, node)| (name, node.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("upload-{}-{unique}-{name}", std::process::id()))
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            UploadStatus::Ok,
            UploadStatus::IniSize,
            UploadStatus::FormSize,
            UploadStatus::Partial,
            UploadStatus::NoFile,
            UploadStatus::NoTmpDir,
            UploadStatus::CantWrite,
            UploadStatus::Extension,
        ] {
            assert_eq!(UploadStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(UploadStatus::from_code(5), None);
        assert_eq!(UploadStatus::from_code(9), None);
    }

    #[test]
    fn metadata_is_reported_as_given() {
        let upload = UploadedFile::from_body(Body::from_content("x"), Some(1), UploadStatus::Ok)
            .with_client_filename("photo.png")
            .with_client_media_type("image/png");

        assert_eq!(upload.size(), Some(1));
        assert_eq!(upload.status(), UploadStatus::Ok);
        assert_eq!(upload.client_filename(), Some("photo.png"));
        assert_eq!(upload.client_media_type(), Some("image/png"));
    }

    #[test]
    fn failed_uploads_cannot_be_consumed() {
        let upload = UploadedFile::from_body(Body::empty(), None, UploadStatus::Partial);
        assert!(matches!(
            upload.body(),
            Err(UploadedFileError::Failed { status: UploadStatus::Partial })
        ));
        assert!(matches!(
            upload.move_to(temp_path("failed")),
            Err(UploadedFileError::Failed { .. })
        ));
    }

    #[test]
    fn stream_backed_move_writes_the_target() {
        let upload = UploadedFile::from_body(
            Body::from_content("uploaded bytes"),
            None,
            UploadStatus::Ok,
        );
        let target = temp_path("stream-move");

        upload.move_to(&target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"uploaded bytes");
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn file_backed_move_renames_the_file() {
        let origin = temp_path("file-origin");
        fs::write(&origin, b"tmp contents").unwrap();
        let target = temp_path("file-target");

        let upload = UploadedFile::from_file(&origin, Some(12), UploadStatus::Ok);
        upload.move_to(&target).unwrap();

        assert!(!origin.exists());
        assert_eq!(fs::read(&target).unwrap(), b"tmp contents");
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn moving_twice_is_rejected_across_clones() {
        let upload = UploadedFile::from_body(Body::from_content("x"), None, UploadStatus::Ok);
        let clone = upload.clone();
        let target = temp_path("move-once");

        upload.move_to(&target).unwrap();
        assert!(matches!(clone.move_to(&target), Err(UploadedFileError::AlreadyMoved)));
        assert!(matches!(clone.body(), Err(UploadedFileError::AlreadyMoved)));
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn missing_target_directory_is_rejected() {
        let upload = UploadedFile::from_body(Body::from_content("x"), None, UploadStatus::Ok);
        let target = temp_path("no-such-dir").join("file");
        assert!(matches!(
            upload.move_to(&target),
            Err(UploadedFileError::TargetDirectory { .. })
        ));
    }

    #[test]
    fn file_backed_body_reads_the_file() {
        let origin = temp_path("file-body");
        fs::write(&origin, b"on disk").unwrap();

        let upload = UploadedFile::from_file(&origin, None, UploadStatus::Ok);
        let body = upload.body().unwrap();
        assert_eq!(body.contents().unwrap().as_ref(), b"on disk");

        // the handle is cached
        assert!(body.ptr_eq(&upload.body().unwrap()));
        fs::remove_file(&origin).unwrap();
    }

    #[test]
    fn trees_nest_and_look_up_files() {
        let mut nested = UploadedFiles::default();
        nested.insert("avatar", UploadedFile::from_body(Body::empty(), None, UploadStatus::Ok));

        let mut files = UploadedFiles::default();
        files.insert("profile", nested);
        files.insert("cv", UploadedFile::from_body(Body::empty(), None, UploadStatus::Ok));

        assert_eq!(files.len(), 2);
        assert!(files.file("cv").is_some());
        assert!(files.file("profile").is_none());
        assert!(matches!(files.get("profile"), Some(UploadedFileNode::Group(group)) if group.len() == 1));
    }
}
