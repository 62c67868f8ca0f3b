//! Keystroke decoding
//!
//! Turns the raw byte stream from the connection into [`Key`] events, one
//! UTF-8 character at a time.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

const CTRL_C: char = '\x03';
const CTRL_D: char = '\x04';
const BACKSPACE: char = '\x08';
const DELETE: char = '\x7f';

/// One decoded keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// CR, LF, or a CR+LF pair
    Enter,
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D
    EndOfInput,
    /// Backspace or DEL
    Backspace,
    /// A printable character
    Char(char),
    /// Anything else: other control characters, invalid UTF-8
    Ignored,
}

impl Key {
    pub fn classify(c: char) -> Self {
        match c {
            '\r' | '\n' => Key::Enter,
            CTRL_C => Key::Interrupt,
            CTRL_D => Key::EndOfInput,
            BACKSPACE | DELETE => Key::Backspace,
            c if !c.is_control() => Key::Char(c),
            _ => Key::Ignored,
        }
    }
}

/// Buffered keystroke reader over the connection's readable half
pub struct KeyReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> KeyReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Next keystroke, or `None` once the stream is closed
    ///
    /// A CR whose LF is already buffered is folded into a single
    /// [`Key::Enter`]; the reader never waits for that LF.
    pub async fn next_key(&mut self) -> io::Result<Option<Key>> {
        let Some(decoded) = self.read_char().await? else {
            return Ok(None);
        };
        let Some(c) = decoded else {
            return Ok(Some(Key::Ignored));
        };

        if c == '\r' && self.reader.buffer().first() == Some(&b'\n') {
            self.reader.consume(1);
        }
        Ok(Some(Key::classify(c)))
    }

    /// Decode one UTF-8 scalar. The inner `None` marks an invalid sequence.
    ///
    /// Continuation bytes are only consumed once seen to be continuation
    /// bytes, so a stray lead byte never swallows the keys after it.
    async fn read_char(&mut self) -> io::Result<Option<Option<char>>> {
        let Some(first) = self.read_byte().await? else {
            return Ok(None);
        };

        let width = utf8_width(first);
        if width == 0 {
            return Ok(Some(None));
        }

        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            let Some(next) = self.reader.fill_buf().await?.first().copied() else {
                return Ok(None);
            };
            if !is_continuation(next) {
                return Ok(Some(None));
            }
            self.reader.consume(1);
            *slot = next;
        }

        Ok(Some(
            std::str::from_utf8(&bytes[..width])
                .ok()
                .and_then(|s| s.chars().next()),
        ))
    }

    async fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.reader.read_u8().await {
            Ok(b) => Ok(Some(b)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn is_continuation(b: u8) -> bool {
    (0x80..=0xbf).contains(&b)
}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0,
    }
}
