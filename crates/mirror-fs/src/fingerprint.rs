//! Content fingerprints
//!
//! A [`Fingerprint`] is the SHA-256 digest of a file's bytes, rendered in the
//! canonical `sha256:<hex>` format. Files are streamed in fixed-size chunks so
//! large files are never loaded into memory at once.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use fs2::FileExt;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Prefix for all rendered fingerprints
const PREFIX: &str = "sha256:";

/// Default read size when streaming a file through the hasher.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// SHA-256 digest of a file's content.
///
/// Two files with equal fingerprints are treated as content-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(PREFIX)?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Compute the fingerprint of in-memory content.
pub fn fingerprint_bytes(content: &[u8]) -> Fingerprint {
    Fingerprint(Sha256::digest(content).into())
}

/// Compute the fingerprint of a file using [`DEFAULT_CHUNK_SIZE`] reads.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a read fails mid-stream.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
    fingerprint_file_with_chunk_size(path, DEFAULT_CHUNK_SIZE)
}

/// Compute the fingerprint of a file, reading `chunk_size` bytes at a time.
///
/// Holds a shared advisory lock while reading so cooperating writers cannot
/// swap content underneath the hasher.
pub fn fingerprint_file_with_chunk_size(path: &Path, chunk_size: usize) -> Result<Fingerprint> {
    if chunk_size == 0 {
        return Err(Error::InvalidChunkSize);
    }

    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    file.lock_shared().map_err(|e| Error::lock_failed(path, e))?;

    let digest = hash_stream(&mut file, chunk_size).map_err(|e| Error::io(path, e));

    // Lock is released on close as well; an unlock failure is not a read failure
    let _ = file.unlock();

    digest
}

fn hash_stream(reader: &mut impl Read, chunk_size: usize) -> std::io::Result<Fingerprint> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(Fingerprint(hasher.finalize().into()))
}
