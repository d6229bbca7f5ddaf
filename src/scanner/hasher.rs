//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in sequential fixed-size chunks and feeds each
//! chunk into an incremental BLAKE3 state. Memory use is bounded by the
//! chunk size no matter how large the file is.
//!
//! The [`FileHasher`] trait is the seam the hashing coordinator works
//! against; [`Hasher`] is the production implementation.
//!
//! # Example
//!
//! ```no_run
//! use dupefinder::scanner::{hash_to_hex, FileHasher, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_chunk_size(64 * 1024);
//! let result = hasher.hash_file(Path::new("photo.jpg"));
//! if let Some(hash) = result.hash() {
//!     println!("{}", hash_to_hex(hash));
//! }
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{HashError, HashResult};

/// A BLAKE3 digest.
pub type Hash = [u8; 32];

/// Default read chunk size (16 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Smallest chunk size the hasher will use; smaller requests are raised.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest chunk size the hasher will use; larger requests are lowered.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Something that can turn one file into a [`HashResult`].
///
/// Implementations must never panic on I/O failure; they classify the
/// failure into the returned result instead.
pub trait FileHasher: Send + Sync {
    /// Hash the full content of `path`.
    fn hash_file(&self, path: &Path) -> HashResult;
}

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size, clamped to [`MIN_CHUNK_SIZE`]..=[`MAX_CHUNK_SIZE`].
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = clamp_chunk_size(chunk_size);
        self
    }

    /// Effective chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compute the full-content hash of a file.
    ///
    /// # Errors
    ///
    /// Returns a classified [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Hash everything readable from `reader` in fixed-size chunks.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Hash> {
        let mut state = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
        }

        Ok(*state.finalize().as_bytes())
    }
}

impl FileHasher for Hasher {
    fn hash_file(&self, path: &Path) -> HashResult {
        match self.full_hash(path) {
            Ok(hash) => {
                log::trace!("Hashed {}: {}", path.display(), hash_to_hex(&hash));
                HashResult::success(path.to_path_buf(), hash)
            }
            Err(e) => HashResult::failure(path.to_path_buf(), e),
        }
    }
}

/// Clamp a requested chunk size into the supported range.
#[must_use]
pub fn clamp_chunk_size(requested: usize) -> usize {
    let clamped = requested.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
    if clamped != requested {
        log::debug!(
            "Chunk size {} bytes adjusted to {} bytes",
            requested,
            clamped
        );
    }
    clamped
}

/// Render a hash as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;

    hash.iter().fold(String::with_capacity(64), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
