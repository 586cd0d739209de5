mod file;
mod options;
mod report;

pub use file::{FileEntry, FileInfo, os_bytes};
pub use options::{BuildOptions, EntryOrder};
pub use report::{BuildReport, ScanSummary};
