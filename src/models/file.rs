use serde::Serialize;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Component, PathBuf};

/// A regular file found while walking the sources
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Path relative to the base directory, as written to the metainfo
    pub path: PathBuf,
    /// Path used to read the file
    pub full_path: PathBuf,
    /// File size in bytes
    pub len: u64,
}

impl FileInfo {
    /// Path segments of the relative path. Only named components are kept,
    /// so no segment is empty, `.` or `..`.
    pub fn segments(&self) -> Vec<&OsStr> {
        self.path
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn to_entry(&self) -> FileEntry {
        FileEntry {
            length: self.len,
            path: self
                .segments()
                .into_iter()
                .map(|s| s.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// File entry as listed in the `files` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub length: u64,
    pub path: Vec<String>,
}

/// Raw bytes of a file name. Non UTF-8 names survive unchanged on Unix.
pub fn os_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Cow::Borrowed(name.as_bytes())
    }
    #[cfg(not(unix))]
    {
        match name.to_string_lossy() {
            Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
            Cow::Owned(s) => Cow::Owned(s.into_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        let info = FileInfo {
            path: PathBuf::from("CD1/./Sample/myfile.avi"),
            full_path: PathBuf::from("/data/CD1/Sample/myfile.avi"),
            len: 12,
        };
        assert_eq!(info.segments(), vec!["CD1", "Sample", "myfile.avi"]);
        assert_eq!(
            info.to_entry(),
            FileEntry {
                length: 12,
                path: vec!["CD1".into(), "Sample".into(), "myfile.avi".into()],
            }
        );
    }
}
