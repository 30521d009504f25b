//! Line rendering into fixed buffers.
//!
//! Output format: `[<ticks>] <message>\n`. Every rendered line fits the
//! buffer and ends in exactly one newline; content that does not fit is
//! truncated and the newline is forced into the last byte.

use core::fmt::{self, Write};

use crate::envelope::Envelope;

/// `fmt::Write` adapter over a byte slice that silently truncates.
pub(crate) struct LineWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> LineWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.pos
    }

    /// True once no more bytes fit.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Written content as text.
    ///
    /// Only ASCII is ever written through this type, so truncation cannot
    /// split a character.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.pos]).unwrap_or("")
    }
}

impl Write for LineWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Render one envelope as a complete line.
///
/// Returns the line length; `buf[..len]` is ready for the sink.
pub fn render_line(envelope: &Envelope, buf: &mut [u8]) -> usize {
    if buf.is_empty() {
        return 0;
    }

    let len = {
        let mut writer = LineWriter::new(buf);
        // Truncation is reported as Ok by LineWriter, so these never fail
        let _ = write!(writer, "[{}] ", envelope.timestamp);
        if !writer.is_full() {
            let _ = envelope.template.render(&envelope.fields, &mut writer);
        }
        writer.len()
    };

    terminate_line(buf, len)
}

/// Collapse trailing newlines in `buf[..len]` to exactly one.
///
/// When the content fills the buffer, the last byte is overwritten.
pub fn terminate_line(buf: &mut [u8], len: usize) -> usize {
    if buf.is_empty() {
        return 0;
    }

    let mut end = len.min(buf.len());
    while end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
    }

    if end < buf.len() {
        buf[end] = b'\n';
        end + 1
    } else {
        buf[buf.len() - 1] = b'\n';
        buf.len()
    }
}
