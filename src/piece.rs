use sha1::{Digest, Sha1};
use std::collections::TryReserveError;
use std::io::{self, Read};
use std::num::NonZeroUsize;

use crate::config::PIECE_HASH_LEN;

/// SHA-1 digest of one piece
pub type PieceHash = [u8; PIECE_HASH_LEN];

/// Streams a logical byte stream through a fixed-size window, producing one
/// SHA-1 per full window.
///
/// The hasher knows nothing about files: feeding two files one after the
/// other hashes their concatenation, so pieces straddle file boundaries.
pub struct PieceHasher {
    window: Vec<u8>,
    piece_length: usize,
    pieces: Vec<PieceHash>,
    total: u64,
}

impl PieceHasher {
    /// Reserve a window of `piece_length` bytes. Fails instead of aborting
    /// when the window can't be allocated.
    pub fn try_new(piece_length: NonZeroUsize) -> Result<Self, TryReserveError> {
        let mut window = Vec::new();
        window.try_reserve_exact(piece_length.get())?;
        Ok(Self {
            window,
            piece_length: piece_length.get(),
            pieces: Vec::new(),
            total: 0,
        })
    }

    pub fn piece_length(&self) -> usize {
        self.piece_length
    }

    /// Bytes fed so far
    pub fn total_len(&self) -> u64 {
        self.total
    }

    /// Append bytes to the stream.
    pub fn feed(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = self.room().min(data.len());
            self.window.extend_from_slice(&data[..take]);
            self.advance(take);
            data = &data[take..];
        }
    }

    /// Read `reader` to the end straight into the window. Returns the number
    /// of bytes consumed.
    pub fn feed_reader<R: Read>(&mut self, mut reader: R) -> io::Result<u64> {
        let mut consumed = 0u64;
        loop {
            let room = self.room() as u64;
            let n = (&mut reader).take(room).read_to_end(&mut self.window)?;
            if n == 0 {
                break;
            }
            self.advance(n);
            consumed += n as u64;
        }
        Ok(consumed)
    }

    /// Flush the trailing short piece, if any, and return every hash.
    pub fn finish(mut self) -> Pieces {
        if !self.window.is_empty() {
            self.pieces.push(Sha1::digest(&self.window).into());
        }
        Pieces {
            hashes: self.pieces,
            total_len: self.total,
        }
    }

    fn room(&self) -> usize {
        self.piece_length - self.window.len()
    }

    fn advance(&mut self, n: usize) {
        self.total += n as u64;
        if self.window.len() == self.piece_length {
            self.pieces.push(Sha1::digest(&self.window).into());
            self.window.clear();
        }
    }
}

/// The sealed piece list of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pieces {
    hashes: Vec<PieceHash>,
    total_len: u64,
}

impl Pieces {
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn hashes(&self) -> &[PieceHash] {
        &self.hashes
    }

    /// Total number of bytes that were hashed.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// The `pieces` byte string: every hash concatenated in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.hashes.concat()
    }
}

/// Calculate the number of pieces for a given total size and piece length
pub fn calculate_num_pieces(total_size: u64, piece_length: u64) -> u64 {
    total_size.div_ceil(piece_length)
}
