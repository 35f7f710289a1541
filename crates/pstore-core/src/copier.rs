//! Chunked byte transfer with a buffer reused across every entry of a run.

use std::io::{self, Read, Write};

/// Which side of a transfer failed.
#[derive(Debug)]
pub enum StreamFault {
    Read(io::Error),
    Write(io::Error),
}

pub struct Copier {
    buf: Box<[u8]>,
}

impl Copier {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buf: vec![0u8; buffer_size.max(1)].into_boxed_slice(),
        }
    }

    /// Moves `src` into `dst` one chunk at a time until a zero-length read.
    /// Returns the number of bytes written.
    pub fn copy<R, W>(&mut self, src: &mut R, dst: &mut W) -> Result<u64, StreamFault>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut total = 0u64;
        loop {
            let n = match src.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamFault::Read(e)),
            };
            dst.write_all(&self.buf[..n]).map_err(StreamFault::Write)?;
            total += n as u64;
        }
        dst.flush().map_err(StreamFault::Write)?;
        Ok(total)
    }
}
