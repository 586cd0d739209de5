//! Classifies source paths and picks the base each file is named against.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::FALLBACK_ROOT_NAME;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::BuildError;

/// What the caller asked to share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    SingleFile(PathBuf),
    Directory(PathBuf),
    Assortment(Vec<PathBuf>),
}

impl SourceSpec {
    /// One path is classified by what it is on disk; several paths always
    /// form an assortment.
    pub fn from_paths(mut paths: Vec<PathBuf>) -> Result<Self, BuildError> {
        match paths.len() {
            0 => Err(BuildError::NoSources),
            1 => {
                let path = paths.remove(0);
                let metadata = fs::metadata(&path).map_err(|source| BuildError::SourceAccess {
                    path: path.clone(),
                    source,
                })?;
                if metadata.is_dir() {
                    Ok(SourceSpec::Directory(path))
                } else if metadata.is_file() {
                    Ok(SourceSpec::SingleFile(path))
                } else {
                    Err(BuildError::UnsupportedSource(path))
                }
            }
            _ => Ok(SourceSpec::Assortment(paths)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    File,
    Directory,
}

/// One input of a multi-file torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Canonical path of the input
    pub path: PathBuf,
    /// Stripped from every file path below `path`
    pub base: PathBuf,
    pub kind: RootKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Single { path: PathBuf },
    Multi { roots: Vec<Root> },
}

/// Name and layout of the torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub name: OsString,
    pub layout: Layout,
}

pub fn resolve(spec: &SourceSpec, diag: &mut dyn Diagnostics) -> Result<ResolvedSource, BuildError> {
    match spec {
        SourceSpec::SingleFile(path) => resolve_file(path),
        SourceSpec::Directory(path) => resolve_directory(path),
        SourceSpec::Assortment(paths) => resolve_assortment(paths, diag),
    }
}

fn resolve_file(path: &Path) -> Result<ResolvedSource, BuildError> {
    let metadata = fs::metadata(path).map_err(|source| BuildError::SourceAccess {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(BuildError::UnsupportedSource(path.to_path_buf()));
    }
    let name = match path.file_name() {
        Some(name) => name.to_os_string(),
        None => final_segment(&canonicalize(path)?),
    };
    Ok(ResolvedSource {
        name,
        layout: Layout::Single {
            path: path.to_path_buf(),
        },
    })
}

fn resolve_directory(path: &Path) -> Result<ResolvedSource, BuildError> {
    let canonical = canonicalize(path)?;
    if !canonical.is_dir() {
        return Err(BuildError::UnsupportedSource(path.to_path_buf()));
    }
    // The sole source must be readable; nested directories may fail later.
    fs::read_dir(&canonical).map_err(|source| BuildError::SourceAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ResolvedSource {
        name: final_segment(&canonical),
        layout: Layout::Multi {
            roots: vec![Root {
                path: canonical.clone(),
                base: canonical,
                kind: RootKind::Directory,
            }],
        },
    })
}

fn resolve_assortment(
    paths: &[PathBuf],
    diag: &mut dyn Diagnostics,
) -> Result<ResolvedSource, BuildError> {
    if paths.is_empty() {
        return Err(BuildError::NoSources);
    }

    let canonical = paths
        .iter()
        .map(|p| canonicalize(p))
        .collect::<Result<Vec<_>, _>>()?;
    check_overlaps(&canonical)?;

    let parents: Vec<PathBuf> = canonical.iter().map(|p| parent_of(p)).collect();
    let common = common_directory(&parents);

    let (name, common) = match common {
        Some(dir) => {
            diag.report(Diagnostic::BaseDirectory { path: dir.clone() });
            (final_segment(&dir), Some(dir))
        }
        None => {
            diag.report(Diagnostic::NoCommonDirectory);
            (OsString::from(FALLBACK_ROOT_NAME), None)
        }
    };

    let mut roots = Vec::with_capacity(canonical.len());
    for (path, parent) in canonical.into_iter().zip(parents) {
        let kind = match fs::metadata(&path) {
            Ok(m) if m.is_file() => RootKind::File,
            Ok(m) if m.is_dir() => RootKind::Directory,
            Ok(_) => {
                diag.report(Diagnostic::UnsupportedEntry { path });
                continue;
            }
            Err(e) => {
                diag.report(Diagnostic::SkippedEntry {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let base = common.clone().unwrap_or(parent);
        roots.push(Root { path, base, kind });
    }

    Ok(ResolvedSource {
        name,
        layout: Layout::Multi { roots },
    })
}

/// Identical inputs, or an input inside another input, would list the same
/// file twice.
fn check_overlaps(paths: &[PathBuf]) -> Result<(), BuildError> {
    for (i, path) in paths.iter().enumerate() {
        for earlier in &paths[..i] {
            if path == earlier {
                return Err(BuildError::DuplicateSource(path.clone()));
            }
            if path.starts_with(earlier) {
                return Err(BuildError::NestedSource {
                    inner: path.clone(),
                    outer: earlier.clone(),
                });
            }
            if earlier.starts_with(path) {
                return Err(BuildError::NestedSource {
                    inner: earlier.clone(),
                    outer: path.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Longest leading run of whole components shared by every path. `None` when
/// they share nothing beyond the filesystem root.
pub fn common_directory(paths: &[PathBuf]) -> Option<PathBuf> {
    let (first, rest) = paths.split_first()?;
    let mut shared: Vec<Component<'_>> = first.components().collect();
    for path in rest {
        let matching = shared
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| *a == b)
            .count();
        shared.truncate(matching);
    }
    if !shared.iter().any(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(shared.iter().collect())
}

fn canonicalize(path: &Path) -> Result<PathBuf, BuildError> {
    path.canonicalize().map_err(|source| BuildError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map_or_else(|| path.to_path_buf(), Path::to_path_buf)
}

fn final_segment(path: &Path) -> OsString {
    path.file_name()
        .map_or_else(|| OsString::from(FALLBACK_ROOT_NAME), |n| n.to_os_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_common_directory() {
        let paths = vec![
            PathBuf::from("/data/music/a.flac"),
            PathBuf::from("/data/music/b.flac"),
        ];
        assert_eq!(common_directory(&paths), Some(PathBuf::from("/data/music")));

        // Never splits a name: "foo1" and "foo2" share "/a", not "/a/foo"
        let paths = vec![PathBuf::from("/a/foo1"), PathBuf::from("/a/foo2")];
        assert_eq!(common_directory(&paths), Some(PathBuf::from("/a")));

        let paths = vec![PathBuf::from("/x/one"), PathBuf::from("/y/two")];
        assert_eq!(common_directory(&paths), None);

        assert_eq!(common_directory(&[]), None);
    }

    #[test]
    fn test_from_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        File::create(&file).unwrap();

        assert_eq!(
            SourceSpec::from_paths(vec![file.clone()]).unwrap(),
            SourceSpec::SingleFile(file.clone())
        );
        assert_eq!(
            SourceSpec::from_paths(vec![dir.path().to_path_buf()]).unwrap(),
            SourceSpec::Directory(dir.path().to_path_buf())
        );
        assert!(matches!(
            SourceSpec::from_paths(vec![dir.path().join("missing")]),
            Err(BuildError::SourceAccess { .. })
        ));
        assert!(matches!(
            SourceSpec::from_paths(vec![]),
            Err(BuildError::NoSources)
        ));
    }

    #[test]
    fn test_assortment_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.txt");
        File::create(&file).unwrap();
        let alias = dir.path().join(".").join("x.txt");

        let spec = SourceSpec::Assortment(vec![file.clone(), alias]);
        let mut diags = Vec::new();
        assert!(matches!(
            resolve(&spec, &mut diags),
            Err(BuildError::DuplicateSource(_))
        ));
    }

    #[test]
    fn test_assortment_nested() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let file = sub.join("x.txt");
        File::create(&file).unwrap();

        let spec = SourceSpec::Assortment(vec![sub, file]);
        let mut diags = Vec::new();
        assert!(matches!(
            resolve(&spec, &mut diags),
            Err(BuildError::NestedSource { .. })
        ));
    }

    #[test]
    fn test_assortment_base() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("share/docs")).unwrap();
        fs::create_dir_all(root.join("share/music")).unwrap();
        let a = root.join("share/docs/a.txt");
        File::create(&a).unwrap();
        let music = root.join("share/music");

        let spec = SourceSpec::Assortment(vec![a.clone(), music.clone()]);
        let mut diags = Vec::new();
        let resolved = resolve(&spec, &mut diags).unwrap();

        assert_eq!(resolved.name, OsString::from("share"));
        let Layout::Multi { roots } = resolved.layout else {
            panic!("expected a multi-file layout");
        };
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].kind, RootKind::File);
        assert_eq!(roots[0].base, root.join("share"));
        assert_eq!(roots[1].kind, RootKind::Directory);
        assert_eq!(roots[1].path, music);
        assert!(matches!(diags.as_slice(), [Diagnostic::BaseDirectory { .. }]));
    }

    #[test]
    fn test_directory_name_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir(&content).unwrap();

        let spec = SourceSpec::Directory(content.join("."));
        let mut diags = Vec::new();
        let resolved = resolve(&spec, &mut diags).unwrap();
        assert_eq!(resolved.name, OsString::from("content"));
    }
}
