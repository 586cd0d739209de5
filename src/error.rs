use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the bencode [`Encoder`](crate::bencode::Encoder).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A dictionary key was not strictly greater than the key before it.
    #[error("dictionary key {key:?} must sort after {previous:?}")]
    KeyOrder { previous: String, key: String },

    /// A value was written inside a dictionary without a preceding key.
    #[error("dictionary value written without a key")]
    MissingKey,

    /// A dictionary was closed, or a key written, while a value was pending.
    #[error("dictionary key {0:?} has no value")]
    MissingValue(String),

    /// A key was written outside of a dictionary.
    #[error("key written outside of a dictionary")]
    KeyOutsideDict,

    /// `end` was called with no open list or dictionary.
    #[error("unbalanced end marker")]
    Unbalanced,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Fatal errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("piece length has to be > 0 and addressable, got {0}")]
    InvalidPieceLength(u64),

    #[error("at least one announce url is required")]
    NoTrackers,

    #[error("announce url #{0} is empty")]
    EmptyTracker(usize),

    #[error("no source paths given")]
    NoSources,

    #[error("could not access {path}: {source}")]
    SourceAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a file or directory: {0}")]
    UnsupportedSource(PathBuf),

    #[error("could not canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't include file \"{0}\" twice")]
    DuplicateSource(PathBuf),

    #[error("can't include \"{inner}\" twice, it is already part of \"{outer}\"")]
    NestedSource { inner: PathBuf, outer: PathBuf },

    #[error("refusing to overwrite {0}, it is one of the source files")]
    OutputIsSource(PathBuf),

    #[error("could not open destination file {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} changed while hashing: expected {expected} bytes, read {actual}")]
    ContentChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
