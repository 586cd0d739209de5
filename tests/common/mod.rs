#![allow(dead_code)]

use serde::Deserialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use createtorrent::{BuildOptions, Diagnostic, SourceSpec, TorrentBuilder, TrackerSpec};

pub const TRACKER: &str = "http://tracker.example.com:6969/tracker/announce";

#[derive(Debug, Deserialize)]
pub struct Metainfo {
    pub announce: String,
    #[serde(rename = "announce-list", default)]
    pub announce_list: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "created by")]
    pub created_by: String,
    #[serde(rename = "creation date", default)]
    pub creation_date: Option<i64>,
    pub info: Info,
}

#[derive(Debug, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub files: Option<Vec<FileItem>>,
    pub name: String,
    #[serde(rename = "piece length")]
    pub piece_length: u64,
    #[serde(with = "serde_bytes")]
    pub pieces: Vec<u8>,
    #[serde(default)]
    pub private: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FileItem {
    pub length: u64,
    pub path: Vec<String>,
}

impl Info {
    pub fn piece_count(&self) -> usize {
        assert_eq!(self.pieces.len() % 20, 0, "pieces is not a multiple of 20");
        self.pieces.len() / 20
    }

    pub fn paths(&self) -> Vec<String> {
        self.files
            .as_ref()
            .map(|files| files.iter().map(|f| f.path.join("/")).collect())
            .unwrap_or_default()
    }
}

pub fn decode(bytes: &[u8]) -> Metainfo {
    serde_bencode::from_bytes(bytes).expect("Failed to decode metainfo")
}

pub fn create_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, data).unwrap();
    path
}

pub fn create_sized_file(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().set_len(size).unwrap();
    path
}

pub fn options(piece_length: u64) -> BuildOptions {
    BuildOptions {
        piece_length,
        creation_date: Some(1_700_000_000),
        ..BuildOptions::default()
    }
}

/// Build into memory, returning the raw document and the diagnostics.
pub fn build_with(
    trackers: TrackerSpec,
    source: SourceSpec,
    options: BuildOptions,
) -> (Vec<u8>, Vec<Diagnostic>) {
    let mut out = Vec::new();
    let mut diags = Vec::new();
    TorrentBuilder::new(trackers, source, options)
        .write_to(&mut out, &mut diags)
        .expect("Failed to build torrent");
    (out, diags)
}

pub fn build(source: SourceSpec, options: BuildOptions) -> Vec<u8> {
    build_with(TrackerSpec::new([TRACKER]).unwrap(), source, options).0
}

pub fn sha1(data: &[u8]) -> Vec<u8> {
    use sha1::{Digest, Sha1};
    Sha1::digest(data).to_vec()
}
