use std::fmt;
use std::io;

/// Error enum with all errors that can be returned by functions from this crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An operation other than `mount` was attempted before a disk was mounted.
    NotMounted,
    /// `mount` was called on a filesystem that already has a disk mounted.
    AlreadyMounted,
    /// The disk gateway failed to open or report geometry for the backing image.
    BadDisk,
    /// The superblock signature does not match `ECS150FS`.
    BadSignature,
    /// The superblock's block counts are inconsistent with each other or with the disk.
    BadGeometry,
    /// A block read or write failed against an already-mounted disk.
    IoFailure(io::Error),
    /// A filename was empty or too long to fit in a directory entry.
    BadName,
    /// No file or directory entry matches the requested name.
    NotFound,
    /// A file with the same name already exists.
    Exists,
    /// The root directory has no free entry for a new file.
    DirFull,
    /// `delete` was attempted on a file that has an open file descriptor.
    Busy,
    /// A file descriptor was out of range or not currently open.
    BadFd,
    /// The open file table has no free slot for a new descriptor.
    TooManyOpen,
    /// `lseek` was attempted to an offset past the end of the file.
    BadOffset,
    /// The FAT has no free cell left to extend a chain.
    Full,
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotMounted => write!(f, "no disk is currently mounted"),
            Error::AlreadyMounted => write!(f, "a disk is already mounted"),
            Error::BadDisk => write!(f, "disk gateway failed to open or report geometry"),
            Error::BadSignature => write!(f, "superblock signature is not ECS150FS"),
            Error::BadGeometry => write!(f, "superblock block counts do not match the disk"),
            Error::IoFailure(err) => write!(f, "disk I/O error: {}", err),
            Error::BadName => write!(f, "filename is empty or too long"),
            Error::NotFound => write!(f, "no such file"),
            Error::Exists => write!(f, "file already exists"),
            Error::DirFull => write!(f, "root directory is full"),
            Error::Busy => write!(f, "file has an open descriptor"),
            Error::BadFd => write!(f, "invalid file descriptor"),
            Error::TooManyOpen => write!(f, "too many open files"),
            Error::BadOffset => write!(f, "seek offset is past end of file"),
            Error::Full => write!(f, "no free space left on disk"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoFailure(err)
    }
}
