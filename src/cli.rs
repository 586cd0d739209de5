use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    DEFAULT_LEGACY_PATH, DEFAULT_LEGACY_PORT, DEFAULT_PIECE_LENGTH, MAX_ANNOUNCE, MAX_RECURSION,
    Profile,
};
use crate::models::{BuildOptions, EntryOrder};
use crate::trackers::TrackerSpec;

#[derive(Parser, Debug)]
#[command(
    name = "createtorrent",
    version,
    about = "A CLI utility to create BitTorrent metainfo files",
    author = "createtorrent contributors"
)]
pub struct Args {
    /// Files or directories to include, followed by the output torrent file
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Announce URL(s) - can be specified multiple times for backup trackers
    #[arg(short = 'a', long = "announce", value_name = "URL")]
    pub announce: Vec<String>,

    /// Port appended to an announce URL without a path [default: 6881]
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<String>,

    /// Path appended to an announce URL without a path [default: /announce]
    #[arg(short = 'P', long = "path", value_name = "PATH")]
    pub path: Option<String>,

    /// Piece length in bytes [default: 262144]
    #[arg(short = 'l', long = "piece-length", value_name = "BYTES")]
    pub piece_length: Option<u64>,

    /// Add a comment to the metainfo
    #[arg(short = 'c', long = "comment", value_name = "COMMENT")]
    pub comment: Option<String>,

    /// Include hidden files (names starting with '.')
    #[arg(short = 'i', long = "inclusive")]
    pub inclusive: bool,

    /// Set the private flag
    #[arg(short = 'x', long = "private")]
    pub private: bool,

    /// Overwrite output file if it exists
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Don't write the creation date
    #[arg(long = "no-date")]
    pub no_date: bool,

    /// Maximum directory nesting below a source directory [default: 29]
    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Option<usize>,

    /// Order of files within a directory [default: sorted]
    #[arg(long = "order", value_enum)]
    pub order: Option<EntryOrder>,

    /// Config file (defaults to the platform config directory)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Named profile from the config file
    #[arg(long = "profile", value_name = "NAME")]
    pub profile: Option<String>,

    /// Scan the sources and print what would be hashed, without writing
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the build report as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,

    /// Show a progress bar while hashing
    #[arg(long = "progress")]
    pub progress: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Everything a build needs, after config defaults are applied
#[derive(Debug)]
pub struct Invocation {
    pub trackers: TrackerSpec,
    pub sources: Vec<PathBuf>,
    /// `None` for a dry run
    pub output: Option<PathBuf>,
    pub options: BuildOptions,
    /// True if announce urls beyond the supported count were dropped
    pub trackers_truncated: bool,
}

impl Args {
    /// Apply `profile` for every value not given on the command line.
    pub fn into_invocation(self, profile: &Profile) -> Result<Invocation> {
        let mut paths = self.paths;
        let output = if self.dry_run {
            None
        } else {
            if paths.len() < 2 {
                bail!("Expected at least one input followed by the output torrent file");
            }
            paths.pop()
        };

        let mut announce = if self.announce.is_empty() {
            profile.announce.clone().unwrap_or_default()
        } else {
            self.announce
        };
        if announce.is_empty() {
            bail!("At least one announce URL is required (use -a)");
        }
        let trackers_truncated = announce.len() > MAX_ANNOUNCE;
        announce.truncate(MAX_ANNOUNCE);

        let trackers = TrackerSpec::new(announce)
            .context("Invalid announce URL")?
            .with_legacy_port(
                self.port
                    .or_else(|| profile.port.clone())
                    .unwrap_or_else(|| DEFAULT_LEGACY_PORT.to_string()),
            )
            .with_legacy_path(
                self.path
                    .or_else(|| profile.path.clone())
                    .unwrap_or_else(|| DEFAULT_LEGACY_PATH.to_string()),
            );

        let options = BuildOptions {
            piece_length: self
                .piece_length
                .or(profile.piece_length)
                .unwrap_or(DEFAULT_PIECE_LENGTH),
            comment: self.comment.or_else(|| profile.comment.clone()),
            private: self.private || profile.private.unwrap_or(false),
            include_hidden: self.inclusive || profile.inclusive.unwrap_or(false),
            max_depth: self.max_depth.or(profile.max_depth).unwrap_or(MAX_RECURSION),
            order: self.order.or(profile.order).unwrap_or_default(),
            creation_date: None,
            no_date: self.no_date || profile.no_date.unwrap_or(false),
        };

        Ok(Invocation {
            trackers,
            sources: paths,
            output,
            options,
            trackers_truncated,
        })
    }
}
