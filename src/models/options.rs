use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::config::{DEFAULT_PIECE_LENGTH, MAX_RECURSION};
use crate::error::BuildError;

/// Order in which the entries of one directory are visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrder {
    /// By file name bytes. Two builds of the same tree produce the same file.
    #[default]
    Sorted,
    /// As the filesystem enumerates them.
    Filesystem,
}

/// Configuration options for building a torrent
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Piece length in bytes
    pub piece_length: u64,
    pub comment: Option<String>,
    pub private: bool,
    /// Include files whose name starts with `.`
    pub include_hidden: bool,
    /// Directory nesting levels entered below a source directory
    pub max_depth: usize,
    pub order: EntryOrder,
    /// Fixed `creation date`, instead of the current time
    pub creation_date: Option<i64>,
    /// Leave out `creation date`
    pub no_date: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            piece_length: DEFAULT_PIECE_LENGTH,
            comment: None,
            private: false,
            include_hidden: false,
            max_depth: MAX_RECURSION,
            order: EntryOrder::Sorted,
            creation_date: None,
            no_date: false,
        }
    }
}

impl BuildOptions {
    /// The piece length as a window size. Fails for 0 and for values that do
    /// not fit in memory.
    pub fn window_len(&self) -> Result<NonZeroUsize, BuildError> {
        usize::try_from(self.piece_length)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(BuildError::InvalidPieceLength(self.piece_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_len() {
        let mut options = BuildOptions::default();
        assert_eq!(options.window_len().unwrap().get(), 262144);

        options.piece_length = 0;
        assert!(matches!(
            options.window_len(),
            Err(BuildError::InvalidPieceLength(0))
        ));
    }
}
