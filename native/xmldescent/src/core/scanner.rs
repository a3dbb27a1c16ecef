//! Cursor and matching primitives
//!
//! Every grammar rule is built from these primitives. A successful match
//! advances the cursor and returns the consumed token; a failed match
//! leaves the cursor untouched. The cursor never moves backwards.
//!
//! Delimiter searches use memchr (SIMD when available).

use memchr::{memchr3, memmem, memrchr2};

/// Description used in diagnostics when the cursor is at the end of input
pub const END_OF_INPUT: &str = "end of input";

/// Scan position over a source buffer
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner at the start of the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0, line: 1 }
    }

    /// Current byte offset
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Current 1-based line number
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get the unconsumed part of the input
    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Consume `len` bytes and return them as the matched token.
    /// `len` must land on a char boundary.
    fn commit(&mut self, len: usize) -> &'a str {
        let token = &self.input[self.pos..self.pos + len];
        self.pos += len;
        self.line += count_line_breaks(token);
        token
    }

    /// Consume `text` if the input continues with it
    pub fn try_literal(&mut self, text: &str) -> Option<&'a str> {
        if self.remaining().starts_with(text) {
            Some(self.commit(text.len()))
        } else {
            None
        }
    }

    /// Consume the prefix whose length `matcher` reports. The reported
    /// length must land on a char boundary. Always succeeds.
    pub fn take_match<M>(&mut self, matcher: M) -> &'a str
    where
        M: FnOnce(&'a str) -> usize,
    {
        let len = matcher(self.remaining());
        self.commit(len)
    }

    /// Consume the longest (possibly empty) run of chars matching `pred`
    pub fn take_while<P>(&mut self, pred: P) -> &'a str
    where
        P: Fn(char) -> bool,
    {
        self.take_match(|rest| {
            rest.char_indices()
                .find(|&(_, c)| !pred(c))
                .map_or(rest.len(), |(i, _)| i)
        })
    }

    /// Like `take_while`, but fails on an empty run
    pub fn try_while1<P>(&mut self, pred: P) -> Option<&'a str>
    where
        P: Fn(char) -> bool,
    {
        match self.remaining().chars().next() {
            Some(c) if pred(c) => Some(self.take_while(pred)),
            _ => None,
        }
    }

    /// Consume everything before the first occurrence of `terminator`,
    /// or the rest of the input when it never occurs
    pub fn take_until(&mut self, terminator: &str) -> &'a str {
        self.take_match(|rest| {
            memmem::find(rest.as_bytes(), terminator.as_bytes()).unwrap_or(rest.len())
        })
    }

    /// Consume an XML `Name`
    pub fn try_name(&mut self) -> Option<&'a str> {
        match self.remaining().chars().next() {
            Some(c) if is_name_start_char(c) => Some(self.take_while(is_name_char)),
            _ => None,
        }
    }

    /// Consume one or more whitespace characters
    #[inline]
    pub fn try_space(&mut self) -> Option<&'a str> {
        self.try_while1(is_space)
    }

    /// Consume through the first `>` that is not inside a quoted span.
    /// Fails without moving when there is no such `>`.
    pub fn skip_balanced(&mut self) -> Option<&'a str> {
        let bytes = self.remaining().as_bytes();
        let mut pos = 0;

        while let Some(offset) = memchr3(b'"', b'\'', b'>', &bytes[pos..]) {
            let found = pos + offset;
            match bytes[found] {
                b'>' => return Some(self.commit(found + 1)),
                quote => {
                    let close = memchr::memchr(quote, &bytes[found + 1..])?;
                    pos = found + 1 + close + 1;
                }
            }
        }
        None
    }

    /// Check whether the input continues with `text`, without consuming
    #[inline]
    pub fn peek_literal(&self, text: &str) -> bool {
        self.remaining().starts_with(text)
    }

    /// Next char for diagnostics, or "end of input"
    pub fn peek_display_char(&self) -> String {
        match self.remaining().chars().next() {
            Some(c) => c.to_string(),
            None => END_OF_INPUT.to_string(),
        }
    }

    /// 1-based column of the cursor, counted in chars from the last line break
    pub fn column(&self) -> usize {
        let consumed = &self.input[..self.pos];
        let line_start = memrchr2(b'\r', b'\n', consumed.as_bytes()).map_or(0, |i| i + 1);
        consumed[line_start..].chars().count() + 1
    }
}

/// Count line breaks, treating `\r\n` as a single break
pub fn count_line_breaks(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut pos = 0;

    while let Some(offset) = memchr::memchr2(b'\r', b'\n', &bytes[pos..]) {
        let found = pos + offset;
        count += 1;
        pos = if bytes[found] == b'\r' && bytes.get(found + 1) == Some(&b'\n') {
            found + 2
        } else {
            found + 1
        };
    }
    count
}

/// XML whitespace: space, tab, carriage return, line feed
#[inline]
pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// XML 1.0 (5th edition) NameStartChar
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}' |
        '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}'
    )
}

/// XML 1.0 (5th edition) NameChar
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}
