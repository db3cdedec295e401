//! Archive signature detection.
//!
//! The file extension is never trusted; only the leading bytes are.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::Result;
use crate::UnpackError;

/// 7z format magic bytes: `37 7A BC AF 27 1C` ("7z" followed by the
/// format marker).
pub const SEVENZ_MAGIC: [u8; 6] = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];

/// Returns `true` if `header` starts with the 7z signature.
#[must_use]
pub fn is_sevenz(header: &[u8]) -> bool {
    header.starts_with(&SEVENZ_MAGIC)
}

/// Verifies that the file at `path` begins with the 7z signature.
///
/// # Errors
///
/// Returns `UnpackError::Io` if the file cannot be opened or read, and
/// `UnpackError::ArchiveFormat` if it is shorter than the signature or the
/// bytes differ.
pub fn check_signature(path: &Path) -> Result<()> {
    let mut header = [0u8; SEVENZ_MAGIC.len()];
    let mut file = File::open(path)?;

    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..])? {
            0 => break,
            n => filled += n,
        }
    }

    if filled == header.len() && is_sevenz(&header) {
        Ok(())
    } else {
        Err(UnpackError::ArchiveFormat {
            path: path.to_path_buf(),
        })
    }
}
