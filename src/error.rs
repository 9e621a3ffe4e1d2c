//! Unified error type for store, snapshot, and sync operations.

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// File system problem on the snapshot or temp file (open, read, write,
    /// rename).
    Io(String),
    /// An existing snapshot file did not decode as a single JSON object.
    Decode(String),
    /// The store's contents could not be serialized to JSON.
    Encode(String),
    /// Fewer bytes landed on disk than were serialized. The rename is
    /// skipped, so the previous snapshot is still intact.
    ShortWrite {
        /// Bytes actually written to the temp file.
        written: u64,
        /// Bytes the serialized snapshot should have occupied.
        expected: u64,
    },
    /// Creating or removing the `.lock` marker file failed.
    Lock(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Decode(msg) => write!(f, "decode error: {msg}"),
            Error::Encode(msg) => write!(f, "encode error: {msg}"),
            Error::ShortWrite { written, expected } => {
                write!(f, "short write: {written} of {expected} bytes reached disk")
            }
            Error::Lock(msg) => write!(f, "lock marker error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
