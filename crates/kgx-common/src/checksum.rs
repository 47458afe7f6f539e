//! Digest utilities for group keys and input file fingerprints

use crate::error::Result;
use crate::types::ChecksumAlgorithm;
use sha2::{Digest, Sha256, Sha512};
use std::io::Read;
use std::path::Path;

/// Hex digest of a string, used for deterministic group keys
pub fn digest_str(input: &str, algorithm: ChecksumAlgorithm) -> String {
    match algorithm {
        ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(input.as_bytes())),
        ChecksumAlgorithm::Sha512 => hex::encode(Sha512::digest(input.as_bytes())),
    }
}

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => stream_digest::<Sha256, _>(reader),
        ChecksumAlgorithm::Sha512 => stream_digest::<Sha512, _>(reader),
    }
}

fn stream_digest<D: Digest, R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_digest_str_sha256() {
        assert_eq!(
            digest_str("hello world", ChecksumAlgorithm::Sha256),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_digest_str_fixed_width() {
        assert_eq!(digest_str("", ChecksumAlgorithm::Sha256).len(), 64);
        assert_eq!(digest_str("a much longer key input", ChecksumAlgorithm::Sha512).len(), 128);
    }

    #[test]
    fn test_stream_matches_str_digest() {
        let mut cursor = Cursor::new(b"hello world");
        let streamed = compute_checksum(&mut cursor, ChecksumAlgorithm::Sha512).unwrap();
        assert_eq!(streamed, digest_str("hello world", ChecksumAlgorithm::Sha512));
    }

    #[test]
    fn test_compute_file_checksum() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();

        let checksum = compute_file_checksum(file.path(), ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }
}
