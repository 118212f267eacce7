//! Buffered stream-to-stream copy.
//!
//! Knows nothing about files: drains any `Read` into any `Write` through a
//! single fixed-size buffer.

use std::io::{self, ErrorKind, Read, Write};

/// Size of the copy buffer (16 KiB)
pub const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// Copy every byte of `source` into `destination`.
///
/// Each filled portion of the buffer is written out completely before the
/// buffer is reused, and the destination is flushed once the source reports
/// end-of-stream, so no trailing bytes are left behind. Returns the number of
/// bytes copied.
pub fn copy<R, W>(source: &mut R, destination: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let filled = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        destination.write_all(&buffer[..filled])?;
        total += filled as u64;
    }

    destination.flush()?;
    Ok(total)
}
