use serde::Serialize;

use super::file::FileEntry;

/// Summary of a finished build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub name: String,
    pub single_file: bool,
    pub announce: String,
    pub piece_length: u64,
    pub piece_count: usize,
    pub total_size: u64,
    pub files: Vec<FileEntry>,
    pub creation_date: Option<i64>,
    /// Hex SHA-1 of the encoded `info` dictionary
    pub info_hash: String,
}

/// What a build would contain, found without hashing
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub name: String,
    pub single_file: bool,
    pub files: Vec<FileEntry>,
    pub total_size: u64,
    pub piece_length: u64,
    pub piece_count: u64,
}
