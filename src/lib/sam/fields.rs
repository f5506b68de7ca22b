//! Line and tab-field scanning over raw SAM bytes.

use std::ops::Range;

use memchr::{memchr, memchr_iter};

/// Field delimiter within a SAM record line.
pub const FIELD_DELIMITER: u8 = b'\t';

/// One line of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Byte offset of the line start within the buffer
    pub offset: usize,
    /// Line bytes including the trailing `\n` when present
    pub bytes: &'a [u8],
}

impl<'a> Line<'a> {
    /// Line bytes without the `\n` terminator or a `\r` before it.
    #[must_use]
    pub fn content(&self) -> &'a [u8] {
        let body = self.bytes.strip_suffix(b"\n").unwrap_or(self.bytes);
        body.strip_suffix(b"\r").unwrap_or(body)
    }

    /// Line bytes without the `\n` terminator. A `\r` is kept.
    #[must_use]
    pub fn without_newline(&self) -> &'a [u8] {
        self.bytes.strip_suffix(b"\n").unwrap_or(self.bytes)
    }

    /// Length the line occupies once written newline-terminated.
    #[must_use]
    pub fn terminated_len(&self) -> usize {
        self.without_newline().len() + 1
    }

    /// True for lines that are empty apart from their terminator.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content().is_empty()
    }
}

/// Iterator over the lines of a buffer, see [`lines`].
pub struct LineIter<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for LineIter<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let start = self.pos;
        let end = memchr(b'\n', &self.buf[start..]).map_or(self.buf.len(), |i| start + i + 1);
        self.pos = end;
        Some(Line { offset: start, bytes: &self.buf[start..end] })
    }
}

/// Iterates the `\n`-separated lines of `buf`. A final line without a terminator is yielded too.
#[must_use]
pub fn lines(buf: &[u8]) -> LineIter<'_> {
    LineIter { buf, pos: 0 }
}

/// True for `@`-prefixed header lines.
#[must_use]
pub fn is_header_line(line: &[u8]) -> bool {
    line.first() == Some(&b'@')
}

/// Returns field `index` (0-based) of a line's content, or `None` if the line has fewer fields.
#[must_use]
pub fn field(content: &[u8], index: usize) -> Option<&[u8]> {
    content.split(|&b| b == FIELD_DELIMITER).nth(index)
}

/// Fills `spans` with the byte ranges of the leading fields of `content`.
///
/// Returns how many spans were filled. Scanning stops once `spans` is full, so a line with
/// more fields than requested costs no extra work.
pub fn field_spans(content: &[u8], spans: &mut [Range<usize>]) -> usize {
    if spans.is_empty() {
        return 0;
    }
    let mut filled = 0;
    let mut start = 0;
    for tab in memchr_iter(FIELD_DELIMITER, content) {
        spans[filled] = start..tab;
        filled += 1;
        start = tab + 1;
        if filled == spans.len() {
            return filled;
        }
    }
    spans[filled] = start..content.len();
    filled + 1
}

/// Parses a signed decimal position: an optional leading `-` followed by one or more digits.
///
/// ```
/// use samshard_lib::sam::fields::parse_position;
///
/// assert_eq!(parse_position(b"100"), Some(100));
/// assert_eq!(parse_position(b"-5"), Some(-5));
/// assert_eq!(parse_position(b"+5"), None);
/// assert_eq!(parse_position(b"12a"), None);
/// ```
#[must_use]
pub fn parse_position(bytes: &[u8]) -> Option<i64> {
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, bytes),
    };
    let magnitude = parse_digits(digits)?;
    let value = i64::try_from(magnitude).ok()?;
    Some(if negative { -value } else { value })
}

/// Parses an unsigned decimal FLAG that fits in 16 bits.
#[must_use]
pub fn parse_flag(bytes: &[u8]) -> Option<u16> {
    parse_digits(bytes).and_then(|v| u16::try_from(v).ok())
}

fn parse_digits(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u64, |acc, &b| {
        if b.is_ascii_digit() { acc.checked_mul(10)?.checked_add(u64::from(b - b'0')) } else { None }
    })
}
