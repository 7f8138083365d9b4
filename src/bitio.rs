//! Arbitrary-width bit-level I/O.
//!
//! Bits are packed LSB-first within 64-bit words, and words are laid out
//! little-endian on the wire, mirroring the original C implementation's
//! `bitio_write`/`bitio_read` (`htole64`/`le64toh` over a `uint64_t` buffer).
//! A caller never sees the word buffer; `write`/`read` work in terms of a
//! value and a bit count from 1 to 64.

use std::io::{Read, Write};

use crate::Error;

/// 8 KiB word buffer, as recommended for the underlying I/O buffer.
const BUF_WORDS: usize = 1024;

fn check_len(len: usize) -> Result<(), Error> {
    if len == 0 || len > 64 {
        return Err(Error::InvalidArgument {
            detail: format!("bit count {} out of range 1..=64", len),
        });
    }
    Ok(())
}

/// Buffered bit-level writer over any byte sink.
pub struct BitWriter<W: Write> {
    inner: W,
    buf: [u64; BUF_WORDS],
    /// Next bit position to write, in `0..BUF_WORDS*64`.
    next: usize,
    /// Total bytes already flushed to `inner`.
    flushed: u64,
    closable: bool,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: [0; BUF_WORDS],
            next: 0,
            flushed: 0,
            closable: true,
        }
    }

    fn non_closable(inner: W) -> Self {
        let mut w = Self::new(inner);
        w.closable = false;
        w
    }

    /// Write the low `len` bits of `data`, least-significant bit first.
    /// Returns the number of bits actually written (always `len` unless the
    /// underlying sink errors, in which case the error is returned instead).
    pub fn write(&mut self, mut data: u64, len: usize) -> Result<usize, Error> {
        check_len(len)?;
        let mut remaining = len;
        while remaining > 0 {
            let word_idx = self.next / 64;
            let ofs = self.next % 64;
            let n = remaining.min(64 - ofs);
            let mut tmp = self.buf[word_idx];
            tmp |= data << ofs;
            if ofs + n < 64 {
                tmp &= (1u64 << (ofs + n)) - 1;
            }
            self.buf[word_idx] = tmp;
            self.next += n;
            remaining -= n;
            data = data.checked_shr(n as u32).unwrap_or(0);
            if self.next == BUF_WORDS * 64 {
                self.flush_buffer()?;
            }
        }
        Ok(len)
    }

    fn flush_buffer(&mut self) -> Result<(), Error> {
        if self.next == 0 {
            return Ok(());
        }
        let wbytes = (self.next + 7) / 8;
        let mut out = Vec::with_capacity(wbytes);
        for word in self.buf.iter().take((wbytes + 7) / 8) {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.truncate(wbytes);
        self.inner.write_all(&out)?;
        self.flushed += wbytes as u64;
        self.buf = [0; BUF_WORDS];
        self.next = 0;
        Ok(())
    }

    /// Flush any partial word to the underlying sink and flush the sink itself.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.flush_buffer()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and consume this writer. Ambient standard-stream writers refuse
    /// to close, matching `bitio_close`'s rejection of `bstdout`/`bstderr`.
    pub fn close(mut self) -> Result<(), Error> {
        if !self.closable {
            return Err(Error::InvalidArgument {
                detail: "cannot close an ambient standard stream".into(),
            });
        }
        self.flush()
    }

    /// Total bytes written so far, including any not-yet-flushed partial word.
    pub fn byte_count(&self) -> u64 {
        self.flushed + ((self.next + 7) / 8) as u64
    }
}

impl BitWriter<std::io::Stdout> {
    /// Ambient, non-closable handle on standard output.
    pub fn stdout() -> Self {
        Self::non_closable(std::io::stdout())
    }
}

/// Buffered bit-level reader over any byte source.
pub struct BitReader<R: Read> {
    inner: R,
    buf: [u64; BUF_WORDS],
    /// Next bit to read.
    next: usize,
    /// One past the last valid bit currently loaded.
    end: usize,
    closable: bool,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; BUF_WORDS],
            next: 0,
            end: 0,
            closable: true,
        }
    }

    fn non_closable(inner: R) -> Self {
        let mut r = Self::new(inner);
        r.closable = false;
        r
    }

    fn refill(&mut self) -> Result<(), Error> {
        let mut raw = [0u8; BUF_WORDS * 8];
        let n = self.inner.read(&mut raw)?;
        self.buf = [0; BUF_WORDS];
        let full_words = n / 8;
        for (i, word) in self.buf.iter_mut().take(full_words).enumerate() {
            let start = i * 8;
            *word = u64::from_le_bytes(raw[start..start + 8].try_into().unwrap());
        }
        let rem = n % 8;
        if rem > 0 {
            let mut tail = [0u8; 8];
            tail[..rem].copy_from_slice(&raw[full_words * 8..full_words * 8 + rem]);
            self.buf[full_words] = u64::from_le_bytes(tail);
        }
        self.next = 0;
        self.end = 8 * n;
        Ok(())
    }

    /// Read up to `len` bits (1..=64), least-significant bit first.
    /// Returns `(value, count)`; `count < len` only at end of stream.
    pub fn read(&mut self, len: usize) -> Result<(u64, usize), Error> {
        check_len(len)?;
        let mut data: u64 = 0;
        let mut remaining = len;
        let mut got = 0usize;
        while remaining > 0 {
            if self.next == self.end {
                self.refill()?;
                if self.end == 0 {
                    return Ok((data, got));
                }
            }
            let word_idx = self.next / 64;
            let ofs = self.next % 64;
            let avail = self.end - self.next;
            let n = remaining.min(64 - ofs).min(avail);
            let mut tmp = self.buf[word_idx] >> ofs;
            if n != 64 {
                tmp &= (1u64 << n) - 1;
            }
            data |= tmp << got;
            self.next += n;
            remaining -= n;
            got += n;
        }
        Ok((data, got))
    }

    pub fn close(self) -> Result<(), Error> {
        if !self.closable {
            return Err(Error::InvalidArgument {
                detail: "cannot close an ambient standard stream".into(),
            });
        }
        Ok(())
    }
}

impl BitReader<std::io::Stdin> {
    /// Ambient, non-closable handle on standard input.
    pub fn stdin() -> Self {
        Self::non_closable(std::io::stdin())
    }
}
