//! Output sinks.
//!
//! [`Output`] is the dual of [`Input`](crate::Input): writers push code
//! points into it while it reports [`is_cont`](Output::is_cont), and
//! suspend as soon as it reports [`is_full`](Output::is_full).
//! [`OutputBuffer`] extends it with the random access that binary framing
//! (e.g. HTTP chunked coding) needs to patch a header in front of content
//! that was already written.

/// A sink for code points with bounded room.
pub trait Output {
    /// Room is available for at least one code point.
    fn is_cont(&self) -> bool;

    /// No room now; more may become available after the caller drains.
    fn is_full(&self) -> bool;

    /// The sink accepts no further output, ever.
    fn is_done(&self) -> bool;

    /// The sink is faulted.
    fn is_error(&self) -> bool {
        false
    }

    /// Writes one code point. Only valid while [`is_cont`](Self::is_cont).
    fn write(&mut self, c: char);

    /// Writes `text[offset..]` while room remains, returning the byte offset
    /// reached. The result equals `text.len()` once everything is written.
    fn write_from(&mut self, text: &str, offset: usize) -> usize {
        let mut offset = offset;
        for c in text[offset..].chars() {
            if !self.is_cont() {
                break;
            }
            self.write(c);
            offset += c.len_utf8();
        }
        offset
    }
}

impl<O: Output + ?Sized> Output for &mut O {
    #[inline]
    fn is_cont(&self) -> bool {
        (**self).is_cont()
    }

    #[inline]
    fn is_full(&self) -> bool {
        (**self).is_full()
    }

    #[inline]
    fn is_done(&self) -> bool {
        (**self).is_done()
    }

    #[inline]
    fn is_error(&self) -> bool {
        (**self).is_error()
    }

    #[inline]
    fn write(&mut self, c: char) {
        (**self).write(c)
    }
}

/// A growable text sink, optionally bounded per drain.
///
/// With a window set, at most `window` code points are accepted between
/// calls to [`take`](Self::take). This is how tests and transports exercise
/// writer suspension without a real socket.
#[derive(Debug, Clone, Default)]
pub struct StringOutput {
    text: String,
    window: Option<usize>,
    written: usize,
    closed: bool,
}

impl StringOutput {
    /// An unbounded sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink accepting `window` code points per drain.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }

    /// Text written so far and not yet taken.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Drains the written text and reopens the window.
    pub fn take(&mut self) -> String {
        self.written = 0;
        core::mem::take(&mut self.text)
    }

    /// Refuses all further output.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Consumes the sink, returning everything not yet taken.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl Output for StringOutput {
    #[inline]
    fn is_cont(&self) -> bool {
        !self.closed && self.window.is_none_or(|window| self.written < window)
    }

    #[inline]
    fn is_full(&self) -> bool {
        !self.closed && !self.is_cont()
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.closed
    }

    #[inline]
    fn write(&mut self, c: char) {
        self.text.push(c);
        self.written += 1;
    }
}

/// An [`Output`] over octets with a movable write index and limit.
///
/// Code points are written as single octets (ISO-8859-1); writing a code
/// point above `U+00FF` or past the limit faults the buffer.
pub trait OutputBuffer: Output {
    /// Next write position.
    fn index(&self) -> usize;

    /// Moves the write position. Must not exceed the limit.
    fn set_index(&mut self, index: usize);

    /// End of the writable region.
    fn limit(&self) -> usize;

    /// Moves the end of the writable region. Must not exceed the capacity.
    fn set_limit(&mut self, limit: usize);

    /// Total size of the backing storage.
    fn capacity(&self) -> usize;

    /// Writes one octet at the index.
    fn write_byte(&mut self, byte: u8);

    /// Copies `len` octets from `from` to `to`; the regions may overlap.
    fn move_bytes(&mut self, from: usize, to: usize, len: usize);

    /// Octets between index and limit.
    #[inline]
    fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.index())
    }

    /// Writes as much of `bytes` as fits, returning the count written.
    fn write_slice(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.remaining());
        for &byte in &bytes[..count] {
            self.write_byte(byte);
        }
        count
    }
}

/// A fixed-capacity octet buffer.
///
/// # Example
///
/// ```ignore
/// let mut buffer = ByteBuffer::with_capacity(4096);
/// let state = encoder.pull(&mut buffer);
/// socket.write_all(buffer.as_slice())?;
/// buffer.clear();
/// ```
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
    index: usize,
    limit: usize,
    overflow: bool,
}

impl ByteBuffer {
    /// A zeroed buffer of `capacity` octets with the limit at capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
            index: 0,
            limit: capacity,
            overflow: false,
        }
    }

    /// Octets written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.index]
    }

    /// Resets the index to 0 and the limit to capacity.
    pub fn clear(&mut self) {
        self.index = 0;
        self.limit = self.bytes.len();
        self.overflow = false;
    }

    /// Copies out the written octets and clears the buffer.
    pub fn take(&mut self) -> Vec<u8> {
        let written = self.as_slice().to_vec();
        self.clear();
        written
    }
}

impl Output for ByteBuffer {
    #[inline]
    fn is_cont(&self) -> bool {
        !self.overflow && self.index < self.limit
    }

    #[inline]
    fn is_full(&self) -> bool {
        !self.overflow && self.index >= self.limit
    }

    #[inline]
    fn is_done(&self) -> bool {
        false
    }

    #[inline]
    fn is_error(&self) -> bool {
        self.overflow
    }

    fn write(&mut self, c: char) {
        match u8::try_from(u32::from(c)) {
            Ok(byte) => self.write_byte(byte),
            Err(_) => self.overflow = true,
        }
    }
}

impl OutputBuffer for ByteBuffer {
    #[inline]
    fn index(&self) -> usize {
        self.index
    }

    #[inline]
    fn set_index(&mut self, index: usize) {
        self.index = index.min(self.limit);
    }

    #[inline]
    fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    fn set_limit(&mut self, limit: usize) {
        self.limit = limit.min(self.bytes.len());
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        if self.index < self.limit {
            self.bytes[self.index] = byte;
            self.index += 1;
        } else {
            self.overflow = true;
        }
    }

    fn move_bytes(&mut self, from: usize, to: usize, len: usize) {
        self.bytes.copy_within(from..from + len, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_output_window() {
        let mut output = StringOutput::with_window(3);
        let offset = output.write_from("hello", 0);
        assert_eq!(offset, 3);
        assert!(output.is_full());
        assert_eq!(output.take(), "hel");
        assert!(output.is_cont());
        assert_eq!(output.write_from("hello", offset), 5);
        assert_eq!(output.take(), "lo");
    }

    #[test]
    fn test_string_output_close() {
        let mut output = StringOutput::new();
        output.close();
        assert!(output.is_done());
        assert!(!output.is_cont());
        assert!(!output.is_full());
    }

    #[test]
    fn test_byte_buffer_limit_and_overflow() {
        let mut buffer = ByteBuffer::with_capacity(4);
        assert_eq!(buffer.write_slice(b"abcdef"), 4);
        assert!(buffer.is_full());
        buffer.write_byte(b'x');
        assert!(buffer.is_error());
    }

    #[test]
    fn test_byte_buffer_rejects_wide_chars() {
        let mut buffer = ByteBuffer::with_capacity(4);
        buffer.write('é');
        assert_eq!(buffer.as_slice(), &[0xE9]);
        buffer.write('ł');
        assert!(buffer.is_error());
    }

    #[test]
    fn test_byte_buffer_move_bytes() {
        let mut buffer = ByteBuffer::with_capacity(8);
        buffer.set_index(4);
        buffer.write_slice(b"ab");
        buffer.move_bytes(4, 0, 2);
        buffer.set_index(2);
        assert_eq!(buffer.as_slice(), b"ab");
    }
}
