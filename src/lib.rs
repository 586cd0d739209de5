//! # createtorrent
//!
//! A library for creating BitTorrent metainfo files from a single file, a
//! directory tree, or an assortment of paths.
//!
//! Files are walked in a fixed order and streamed through one SHA-1 piece
//! hasher, so pieces span file boundaries exactly as clients expect. The
//! document is written with a canonical bencode encoder while hashing runs.
//!
//! ## Example
//!
//! ```no_run
//! use createtorrent::{BuildOptions, SourceSpec, TorrentBuilder, TrackerSpec};
//! use std::path::{Path, PathBuf};
//!
//! let trackers = TrackerSpec::new(["http://tracker.example.com:6969/tracker/announce"]).unwrap();
//! let source = SourceSpec::from_paths(vec![PathBuf::from("my_dir")]).unwrap();
//! let builder = TorrentBuilder::new(trackers, source, BuildOptions::default());
//! let mut diagnostics = Vec::new();
//! let report = builder
//!     .write_file(Path::new("my_dir.torrent"), false, &mut diagnostics)
//!     .unwrap();
//! println!("{} pieces", report.piece_count);
//! ```

pub mod bencode;
pub mod builder;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod piece;
pub mod resolver;
pub mod scanner;
pub mod trackers;

// Re-export main types for convenience
pub use builder::TorrentBuilder;
pub use diagnostics::{Diagnostic, Diagnostics, StderrReporter};
pub use error::{BuildError, EncodeError};
pub use models::{BuildOptions, BuildReport, EntryOrder, FileEntry};
pub use resolver::SourceSpec;
pub use trackers::TrackerSpec;
