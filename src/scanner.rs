use jwalk::{Parallelism, WalkDir};
use std::fs;
use std::path::Path;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::BuildError;
use crate::models::{BuildOptions, EntryOrder, FileInfo};
use crate::resolver::{Root, RootKind};

/// How the walker filters and bounds a traversal
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions<'a> {
    pub include_hidden: bool,
    pub max_depth: usize,
    pub order: EntryOrder,
    /// Never yielded, typically the torrent being written
    pub exclude: Option<&'a Path>,
}

impl<'a> WalkOptions<'a> {
    pub fn new(options: &BuildOptions, exclude: Option<&'a Path>) -> Self {
        Self {
            include_hidden: options.include_hidden,
            max_depth: options.max_depth,
            order: options.order,
            exclude,
        }
    }
}

/// Visit every regular file below the roots, in order.
///
/// File roots are yielded as is. Directory roots are walked without following
/// symlinks. Entries that can't be read are reported and skipped; only errors
/// returned by `visit` stop the walk.
pub fn walk_roots<F>(
    roots: &[Root],
    options: &WalkOptions<'_>,
    diag: &mut dyn Diagnostics,
    mut visit: F,
) -> Result<(), BuildError>
where
    F: FnMut(FileInfo, &mut dyn Diagnostics) -> Result<(), BuildError>,
{
    for root in roots {
        match root.kind {
            RootKind::File => {
                let len = match fs::metadata(&root.path) {
                    Ok(m) => m.len(),
                    Err(e) => {
                        diag.report(Diagnostic::SkippedEntry {
                            path: root.path.clone(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };
                if let Some(info) = file_info(&root.path, &root.base, len, diag) {
                    visit(info, diag)?;
                }
            }
            RootKind::Directory => walk_directory(root, options, diag, &mut visit)?,
        }
    }
    Ok(())
}

fn walk_directory<F>(
    root: &Root,
    options: &WalkOptions<'_>,
    diag: &mut dyn Diagnostics,
    visit: &mut F,
) -> Result<(), BuildError>
where
    F: FnMut(FileInfo, &mut dyn Diagnostics) -> Result<(), BuildError>,
{
    // Entries one level past the limit are still listed so that files in the
    // deepest allowed directory are found; directories there are not entered.
    let walker = WalkDir::new(&root.path)
        .parallelism(Parallelism::Serial)
        .follow_links(false)
        .skip_hidden(false)
        .sort(options.order == EntryOrder::Sorted)
        .max_depth(options.max_depth.saturating_add(1));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                diag.report(Diagnostic::SkippedEntry {
                    path: e.path().unwrap_or(&root.path).to_path_buf(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if entry.depth == 0 {
            continue;
        }

        let entry_path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if entry.depth > options.max_depth {
                diag.report(Diagnostic::DepthExceeded {
                    path: entry_path,
                    limit: options.max_depth,
                });
            }
            continue;
        }

        if !file_type.is_file() {
            diag.report(Diagnostic::UnsupportedEntry { path: entry_path });
            continue;
        }

        if !options.include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        if options.exclude == Some(entry_path.as_path()) {
            diag.report(Diagnostic::SkippedOutput { path: entry_path });
            continue;
        }

        let len = match entry.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                diag.report(Diagnostic::SkippedEntry {
                    path: entry_path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if let Some(info) = file_info(&entry_path, &root.base, len, diag) {
            visit(info, diag)?;
        }
    }
    Ok(())
}

fn file_info(
    full_path: &Path,
    base: &Path,
    len: u64,
    diag: &mut dyn Diagnostics,
) -> Option<FileInfo> {
    match full_path.strip_prefix(base) {
        Ok(relative) if relative.components().next().is_some() => Some(FileInfo {
            path: relative.to_path_buf(),
            full_path: full_path.to_path_buf(),
            len,
        }),
        _ => {
            diag.report(Diagnostic::SkippedEntry {
                path: full_path.to_path_buf(),
                reason: format!("not below base directory {}", base.display()),
            });
            None
        }
    }
}

/// Collect the files that a build would hash, without reading them.
pub fn scan_files(
    roots: &[Root],
    options: &WalkOptions<'_>,
    diag: &mut dyn Diagnostics,
) -> Result<(Vec<FileInfo>, u64), BuildError> {
    let mut files = Vec::new();
    let mut total_size = 0u64;
    walk_roots(roots, options, diag, |info, _| {
        total_size += info.len;
        files.push(info);
        Ok(())
    })?;
    Ok((files, total_size))
}
