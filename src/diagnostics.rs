//! Diagnostics emitted while building, separate from the build result.

use console::style;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A file is about to be hashed.
    AddingFile { path: PathBuf },
    /// Base directory chosen for an assortment.
    BaseDirectory { path: PathBuf },
    /// The assortment shares no directory; the synthetic root name is used.
    NoCommonDirectory,
    /// An entry could not be stat'ed, opened or read and was left out.
    SkippedEntry { path: PathBuf, reason: String },
    /// Not a regular file or directory (symlink, device, socket, ...).
    UnsupportedEntry { path: PathBuf },
    /// A directory nested deeper than the limit was not entered.
    DepthExceeded { path: PathBuf, limit: usize },
    /// The destination file lies inside a source and was left out.
    SkippedOutput { path: PathBuf },
    /// The primary announce url lacks a full path and was rewritten.
    LegacyTracker { url: String, rewritten: String },
    /// Extra announce urls can't be combined with a legacy url.
    ExtraTrackersDropped { count: usize },
    /// More announce urls than supported were given.
    TooManyTrackers { limit: usize },
    /// No files ended up in the torrent.
    NoFiles,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::AddingFile { .. }
            | Diagnostic::BaseDirectory { .. }
            | Diagnostic::SkippedOutput { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::AddingFile { path } => write!(f, "adding {}", path.display()),
            Diagnostic::BaseDirectory { path } => {
                write!(f, "using base directory \"{}\"", path.display())
            }
            Diagnostic::NoCommonDirectory => f.write_str("these files have no directory in common"),
            Diagnostic::SkippedEntry { path, reason } => {
                write!(f, "skipping {} ({})", path.display(), reason)
            }
            Diagnostic::UnsupportedEntry { path } => write!(
                f,
                "ignoring {} (no directory or regular file)",
                path.display()
            ),
            Diagnostic::DepthExceeded { path, limit } => write!(
                f,
                "skipping directory {} (nested deeper than {} levels)",
                path.display(),
                limit
            ),
            Diagnostic::SkippedOutput { path } => {
                write!(f, "skipping output file {}", path.display())
            }
            Diagnostic::LegacyTracker { url, rewritten } => write!(
                f,
                "deprecated use of announce {:?}, using {:?}. Use the full path of the tracker url, \
                 ex: http://example.com:6881/tracker/announce.php",
                url, rewritten
            ),
            Diagnostic::ExtraTrackersDropped { count } => write!(
                f,
                "cannot use multiple announce with legacy port and path tags, ignoring {} url(s)",
                count
            ),
            Diagnostic::TooManyTrackers { limit } => write!(
                f,
                "more than {} announce urls. The rest will be ignored",
                limit
            ),
            Diagnostic::NoFiles => f.write_str("no files found"),
        }
    }
}

/// Receiver of diagnostics.
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl Diagnostics for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Prints warnings to stderr, and informational lines too when verbose.
pub struct StderrReporter {
    verbose: bool,
    warnings: usize,
}

impl StderrReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            warnings: 0,
        }
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }
}

impl Diagnostics for StderrReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => {
                self.warnings += 1;
                eprintln!("{} {}", style("warning:").yellow().bold(), diagnostic);
            }
            Severity::Info if self.verbose => {
                eprintln!("  {}", style(diagnostic).dim());
            }
            Severity::Info => {}
        }
    }
}
