//! Buffered byte copying shared by hashing and cross-device moves.
//!
//! A single stack buffer is reused for every file in a run instead of
//! allocating per copy.

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;

/// Buffer size for file I/O (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Reusable stack buffer for copy operations.
///
/// # Examples
///
/// ```no_run
/// # use upack_core::copy::{CopyBuffer, copy_with_buffer};
/// # fn example() -> std::io::Result<()> {
/// let mut buffer = CopyBuffer::new();
/// let mut input = std::fs::File::open("payload.whl")?;
/// let mut output = std::fs::File::create("/repo/payload.whl")?;
///
/// let bytes_copied = copy_with_buffer(&mut input, &mut output, &mut buffer)?;
/// println!("Copied {bytes_copied} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    #[allow(clippy::large_stack_arrays)]
    buf: [u8; COPY_BUFFER_SIZE],
}

impl CopyBuffer {
    /// Creates a new zeroed copy buffer.
    #[inline]
    #[must_use]
    #[allow(clippy::large_stack_arrays)]
    pub fn new() -> Self {
        Self {
            buf: [0u8; COPY_BUFFER_SIZE],
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        COPY_BUFFER_SIZE
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies everything from `reader` to `writer` through `buffer`.
///
/// Interrupted reads are retried. Returns the number of bytes copied.
#[inline]
pub fn copy_with_buffer<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> io::Result<u64> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;
        total += bytes_read as u64;
    }

    Ok(total)
}

/// Copies the file at `src` to a new file at `dst`, truncating any
/// existing file, and flushes it to disk.
///
/// The destination's parent directory must already exist.
pub fn copy_file(src: &Path, dst: &Path, buffer: &mut CopyBuffer) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)?;
    let copied = copy_with_buffer(&mut input, &mut output, buffer)?;
    output.sync_all()?;
    Ok(copied)
}
