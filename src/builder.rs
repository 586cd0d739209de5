use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use sha1::{Digest, Sha1};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bencode::Encoder;
use crate::config::CREATED_BY;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::BuildError;
use crate::models::{BuildOptions, BuildReport, FileEntry, FileInfo, ScanSummary, os_bytes};
use crate::piece::{PieceHasher, calculate_num_pieces};
use crate::resolver::{Layout, ResolvedSource, RootKind, SourceSpec, resolve};
use crate::scanner::{WalkOptions, scan_files, walk_roots};
use crate::trackers::TrackerSpec;

/// Builder for creating torrent files
pub struct TorrentBuilder {
    trackers: TrackerSpec,
    source: SourceSpec,
    options: BuildOptions,
    show_progress: bool,
}

impl TorrentBuilder {
    pub fn new(trackers: TrackerSpec, source: SourceSpec, options: BuildOptions) -> Self {
        Self {
            trackers,
            source,
            options,
            show_progress: false,
        }
    }

    /// Enable progress bar
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.show_progress = progress;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn trackers(&self) -> &TrackerSpec {
        &self.trackers
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    /// Encode the metainfo into `sink`.
    ///
    /// On error the sink holds a truncated document; use
    /// [`write_file`](Self::write_file) to have it cleaned up.
    pub fn write_to<W: Write>(
        &self,
        sink: W,
        diag: &mut dyn Diagnostics,
    ) -> Result<BuildReport, BuildError> {
        let hasher = self.piece_hasher()?;
        let resolved = resolve(&self.source, diag)?;
        Assembly::new(self, sink).run(&resolved, hasher, None, diag)
    }

    /// Encode the metainfo into a new file at `output`.
    ///
    /// Options and sources are checked before the file is created. If the
    /// build fails afterwards the file is removed.
    pub fn write_file(
        &self,
        output: &Path,
        overwrite: bool,
        diag: &mut dyn Diagnostics,
    ) -> Result<BuildReport, BuildError> {
        let hasher = self.piece_hasher()?;
        let resolved = resolve(&self.source, diag)?;
        if let Ok(existing) = output.canonicalize() {
            if is_source_file(&resolved, &existing) {
                return Err(BuildError::OutputIsSource(output.to_path_buf()));
            }
        }

        let file = open_output(output, overwrite)?;
        let exclude = output.canonicalize().ok();

        let result = Assembly::new(self, BufWriter::new(file)).run(
            &resolved,
            hasher,
            exclude.as_deref(),
            diag,
        );
        if result.is_err() {
            let _ = fs::remove_file(output);
        }
        result
    }

    /// The window is reserved here, before any output exists, so a piece
    /// length too large to allocate is an error rather than an abort.
    fn piece_hasher(&self) -> Result<PieceHasher, BuildError> {
        let window = self.options.window_len()?;
        PieceHasher::try_new(window)
            .map_err(|_| BuildError::InvalidPieceLength(self.options.piece_length))
    }

    /// Scan the sources without hashing or writing anything.
    pub fn dry_run(&self, diag: &mut dyn Diagnostics) -> Result<ScanSummary, BuildError> {
        self.options.window_len()?;
        let resolved = resolve(&self.source, diag)?;
        let name = resolved.name.to_string_lossy().into_owned();

        let (files, total_size, single_file) = match &resolved.layout {
            Layout::Single { path } => {
                let len = fs::metadata(path)
                    .map_err(|source| BuildError::SourceAccess {
                        path: path.clone(),
                        source,
                    })?
                    .len();
                let entry = FileEntry {
                    length: len,
                    path: vec![name.clone()],
                };
                (vec![entry], len, true)
            }
            Layout::Multi { roots } => {
                let walk = WalkOptions::new(&self.options, None);
                let (files, total) = scan_files(roots, &walk, diag)?;
                if files.is_empty() {
                    diag.report(Diagnostic::NoFiles);
                }
                (files.iter().map(FileInfo::to_entry).collect(), total, false)
            }
        };

        Ok(ScanSummary {
            name,
            single_file,
            files,
            total_size,
            piece_length: self.options.piece_length,
            piece_count: calculate_num_pieces(total_size, self.options.piece_length),
        })
    }
}

/// True if `output` (canonical) is one of the files that would be hashed.
fn is_source_file(resolved: &ResolvedSource, output: &Path) -> bool {
    match &resolved.layout {
        Layout::Single { path } => path.canonicalize().is_ok_and(|p| p == output),
        Layout::Multi { roots } => roots
            .iter()
            .any(|root| root.kind == RootKind::File && root.path == output),
    }
}

fn open_output(output: &Path, overwrite: bool) -> Result<File, BuildError> {
    let result = if overwrite {
        File::create(output)
    } else {
        File::options().write(true).create_new(true).open(output)
    };
    result.map_err(|source| BuildError::Destination {
        path: output.to_path_buf(),
        source,
    })
}

/// Progress through the document. Every stage owns a fixed set of keys, and
/// stages only move forward, which keeps keys in sorted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Init,
    TrackerWritten,
    CommentWritten,
    CreatorWritten,
    DateWritten,
    InfoOpened,
    FilesDescribed,
    PieceLengthWritten,
    PiecesWritten,
    PrivateFlagWritten,
    InfoClosed,
    Done,
}

/// Passes writes through, hashing them while enabled.
struct InfoHashWriter<W> {
    inner: W,
    hasher: Option<Sha1>,
}

impl<W: Write> InfoHashWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: None,
        }
    }

    fn start_hashing(&mut self) {
        self.hasher = Some(Sha1::new());
    }

    fn finish_hashing(&mut self) -> Option<[u8; 20]> {
        self.hasher.take().map(|h| h.finalize().into())
    }
}

impl<W: Write> Write for InfoHashWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// One run of writing a document.
struct Assembly<'a, W: Write> {
    builder: &'a TorrentBuilder,
    enc: Encoder<InfoHashWriter<W>>,
    stage: Stage,
    files: Vec<FileEntry>,
    progress: Option<ProgressBar>,
}

impl<'a, W: Write> Assembly<'a, W> {
    fn new(builder: &'a TorrentBuilder, sink: W) -> Self {
        let progress = builder.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] {bytes} hashed ({bytes_per_sec}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Hashing...");
            pb
        });

        Self {
            builder,
            enc: Encoder::new(InfoHashWriter::new(sink)),
            stage: Stage::Init,
            files: Vec::new(),
            progress,
        }
    }

    fn enter(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{:?} can't follow {:?}", next, self.stage);
        self.stage = next;
    }

    fn run(
        mut self,
        resolved: &ResolvedSource,
        mut hasher: PieceHasher,
        exclude: Option<&Path>,
        diag: &mut dyn Diagnostics,
    ) -> Result<BuildReport, BuildError> {
        let builder = self.builder;
        let options = &builder.options;

        // announce, announce-list
        self.enc.begin_dict()?;
        let announce = builder.trackers.announce(diag);
        self.enc.key(b"announce")?;
        self.enc.bytes(announce.url.as_bytes())?;
        if let Some(list) = &announce.list {
            self.enc.key(b"announce-list")?;
            self.enc.begin_list()?;
            for url in list {
                self.enc.begin_list()?;
                self.enc.bytes(url.as_bytes())?;
                self.enc.end()?;
            }
            self.enc.end()?;
        }
        self.enter(Stage::TrackerWritten);

        if let Some(comment) = &options.comment {
            self.enc.key(b"comment")?;
            self.enc.bytes(comment.as_bytes())?;
            self.enter(Stage::CommentWritten);
        }

        self.enc.key(b"created by")?;
        self.enc.bytes(CREATED_BY.as_bytes())?;
        self.enter(Stage::CreatorWritten);

        let creation_date = creation_date(options);
        if let Some(date) = creation_date {
            self.enc.key(b"creation date")?;
            self.enc.integer(date)?;
            self.enter(Stage::DateWritten);
        }

        // info
        self.enc.key(b"info")?;
        self.enc.get_mut().start_hashing();
        self.enc.begin_dict()?;
        self.enter(Stage::InfoOpened);

        match &resolved.layout {
            Layout::Single { path } => {
                let file = File::open(path).map_err(|source| BuildError::Read {
                    path: path.clone(),
                    source,
                })?;
                let len = file
                    .metadata()
                    .map_err(|source| BuildError::Read {
                        path: path.clone(),
                        source,
                    })?
                    .len();
                diag.report(Diagnostic::AddingFile { path: path.clone() });

                self.enc.key(b"length")?;
                self.enc.integer(len)?;
                self.enter(Stage::FilesDescribed);

                self.write_name_and_piece_length(&resolved.name)?;
                self.stream(&mut hasher, file, path, len)?;
                self.files.push(FileEntry {
                    length: len,
                    path: vec![resolved.name.to_string_lossy().into_owned()],
                });
            }
            Layout::Multi { roots } => {
                self.enc.key(b"files")?;
                self.enc.begin_list()?;
                let walk = WalkOptions::new(options, exclude);
                walk_roots(roots, &walk, diag, |info, diag| {
                    self.add_file(&mut hasher, info, diag)
                })?;
                self.enc.end()?;
                if self.files.is_empty() {
                    diag.report(Diagnostic::NoFiles);
                }
                self.enter(Stage::FilesDescribed);

                self.write_name_and_piece_length(&resolved.name)?;
            }
        }

        let pieces = hasher.finish();
        if let Some(pb) = self.progress.take() {
            pb.finish_with_message("Hashing complete");
        }
        self.enc.key(b"pieces")?;
        self.enc.bytes(&pieces.to_bytes())?;
        self.enter(Stage::PiecesWritten);

        if options.private {
            self.enc.key(b"private")?;
            self.enc.integer(1)?;
            self.enter(Stage::PrivateFlagWritten);
        }

        self.enc.end()?;
        let info_hash = self.enc.get_mut().finish_hashing().unwrap_or_default();
        self.enter(Stage::InfoClosed);

        self.enc.end()?;
        debug_assert_eq!(self.enc.depth(), 0);
        self.enc.get_mut().flush()?;
        self.enter(Stage::Done);

        Ok(BuildReport {
            name: resolved.name.to_string_lossy().into_owned(),
            single_file: matches!(resolved.layout, Layout::Single { .. }),
            announce: announce.url,
            piece_length: options.piece_length,
            piece_count: pieces.len(),
            total_size: pieces.total_len(),
            files: self.files,
            creation_date,
            info_hash: hex::encode(info_hash),
        })
    }

    fn write_name_and_piece_length(&mut self, name: &OsStr) -> Result<(), BuildError> {
        self.enc.key(b"name")?;
        self.enc.bytes(&os_bytes(name))?;
        self.enc.key(b"piece length")?;
        self.enc.integer(self.builder.options.piece_length)?;
        self.enter(Stage::PieceLengthWritten);
        Ok(())
    }

    /// Append one `{length, path}` entry and hash the file. A file that
    /// can't be opened is skipped; once its entry is written, any read
    /// problem is fatal.
    fn add_file(
        &mut self,
        hasher: &mut PieceHasher,
        info: FileInfo,
        diag: &mut dyn Diagnostics,
    ) -> Result<(), BuildError> {
        let file = match File::open(&info.full_path) {
            Ok(file) => file,
            Err(e) => {
                diag.report(Diagnostic::SkippedEntry {
                    path: info.full_path,
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };
        diag.report(Diagnostic::AddingFile {
            path: info.full_path.clone(),
        });

        self.enc.begin_dict()?;
        self.enc.key(b"length")?;
        self.enc.integer(info.len)?;
        self.enc.key(b"path")?;
        self.enc.begin_list()?;
        for segment in info.segments() {
            self.enc.bytes(&os_bytes(segment))?;
        }
        self.enc.end()?;
        self.enc.end()?;

        self.stream(hasher, file, &info.full_path, info.len)?;
        self.files.push(info.to_entry());
        Ok(())
    }

    fn stream(
        &self,
        hasher: &mut PieceHasher,
        file: File,
        path: &Path,
        expected: u64,
    ) -> Result<(), BuildError> {
        let reader = file.take(expected);
        let read = match &self.progress {
            Some(pb) => hasher.feed_reader(pb.wrap_read(reader)),
            None => hasher.feed_reader(reader),
        }
        .map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if read != expected {
            return Err(BuildError::ContentChanged {
                path: path.to_path_buf(),
                expected,
                actual: read,
            });
        }
        Ok(())
    }
}

fn creation_date(options: &BuildOptions) -> Option<i64> {
    if options.no_date {
        None
    } else if let Some(timestamp) = options.creation_date {
        Some(timestamp)
    } else {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }
}
