use std::io::Read;

use crate::error::TokenizeError;
use crate::split::SplitFn;

const INITIAL_CAPACITY: usize = 4096;
const READ_CHUNK: usize = 4096;

/// Drives a [`SplitFn`] over an incremental byte reader, buffering just
/// enough to assemble one token at a time.
///
/// Consumed bytes are compacted out of the internal buffer before every
/// read, so a splitter that discards leading noise (JSON, XML) keeps this
/// scanner's memory bounded to roughly one token's worth of bytes rather
/// than the whole stream.
pub struct Scanner<R> {
    reader: R,
    split: SplitFn,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    at_eof: bool,
}

impl<R: Read> Scanner<R> {
    pub fn new(reader: R, split: SplitFn) -> Self {
        Self {
            reader,
            split,
            buf: vec![0u8; INITIAL_CAPACITY],
            start: 0,
            end: 0,
            at_eof: false,
        }
    }

    /// Produce the next token, or `Ok(None)` once the stream is exhausted.
    pub fn scan(&mut self) -> Result<Option<Vec<u8>>, TokenizeError> {
        loop {
            if self.start < self.end {
                let result = (self.split)(&self.buf[self.start..self.end], self.at_eof)?;
                if result.advance > 0 {
                    self.start += result.advance;
                }
                if let Some(token) = result.token {
                    return Ok(Some(token));
                }
                if result.advance > 0 {
                    continue;
                }
                if self.at_eof {
                    return Ok(None);
                }
            } else if self.at_eof {
                return Ok(None);
            }

            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<(), TokenizeError> {
        if self.at_eof {
            return Ok(());
        }

        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        if self.end == self.buf.len() {
            self.buf.resize(self.buf.len() + READ_CHUNK, 0);
        }

        match self.reader.read(&mut self.buf[self.end..]) {
            Ok(0) => self.at_eof = true,
            Ok(n) => self.end += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(TokenizeError::diagnostic(
                    format!("reader error: {e}"),
                    self.start as u64,
                ))
            }
        }

        Ok(())
    }
}
