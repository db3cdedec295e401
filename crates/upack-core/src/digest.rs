//! SHA-256 digests rendered as lowercase hex.
//!
//! Used both to derive the archive passphrase from its file name and to
//! recompute the attestation log digest.

use sha2::Digest;
use sha2::Sha256;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;

/// Length of a hex-encoded SHA-256 digest.
pub const HEX_DIGEST_LEN: usize = 64;

/// Returns the lowercase hex SHA-256 digest of `data`.
///
/// # Examples
///
/// ```
/// use upack_core::digest::digest_bytes;
///
/// assert_eq!(
///     digest_bytes(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Returns the lowercase hex SHA-256 digest of a file's full contents.
///
/// The file is streamed, never loaded whole.
pub fn digest_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = CopyBuffer::new();
    copy_with_buffer(&mut file, &mut hasher, &mut buffer)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Derives the archive passphrase: the digest of the path's final component.
///
/// Directory components never influence the result, so the same archive
/// opens from any location.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use upack_core::digest::derive_passphrase;
///
/// let a = derive_passphrase(Path::new("/downloads/lib-1.0.7z"));
/// let b = derive_passphrase(Path::new("lib-1.0.7z"));
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
#[must_use]
pub fn derive_passphrase(archive: &Path) -> String {
    let name = archive.file_name().unwrap_or_else(|| archive.as_os_str());
    digest_bytes(name.as_encoded_bytes())
}
