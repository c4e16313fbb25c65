use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio::sync::mpsc;

/// Replacement character yielded for bytes that do not decode as UTF-8.
const REPLACEMENT: char = '\u{FFFD}';

/// A buffered rune reader over any [`AsyncRead`] that can replay everything
/// read since a marked position.
///
/// The scanner uses this to parse speculatively: it marks the position of a
/// candidate `{` or `[`, lets the lexer read ahead as far as it needs, and on
/// failure rewinds to just past the probed rune. Capture is only active
/// between [`mark_start`](Self::mark_start) and a rewind or
/// [`mark_end`](Self::mark_end), so the long non-JSON spans between
/// candidates are never buffered.
pub struct RewindReader<R> {
    reader: R,
    /// Bytes to serve before touching `reader` again, front first.
    replay: VecDeque<u8>,
    /// Current chunk read from the source but not yet consumed.
    chunk: BytesMut,
    chunk_size: usize,
    /// Raw source bytes read since the last `mark_start`.
    capture: Vec<u8>,
    capturing: bool,
    /// Raw bytes of the most recent `read_rune`, kept for `unread`.
    last_rune: Option<([u8; 4], usize)>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> RewindReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            replay: VecDeque::new(),
            chunk: BytesMut::new(),
            chunk_size: chunk_size.max(1),
            capture: Vec::new(),
            capturing: false,
            last_rune: None,
            eof: false,
        }
    }

    async fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.replay.pop_front() {
            return Ok(Some(b));
        }

        while self.chunk.is_empty() {
            if self.eof {
                return Ok(None);
            }
            self.chunk.reserve(self.chunk_size);
            if self.reader.read_buf(&mut self.chunk).await? == 0 {
                self.eof = true;
                return Ok(None);
            }
        }

        let b = self.chunk[0];
        self.chunk.advance(1);
        Ok(Some(b))
    }

    /// Reads the next UTF-8 scalar value. Invalid sequences yield U+FFFD and
    /// consume exactly one byte, so scanning can continue past them.
    /// Returns `Ok(None)` at end of stream.
    pub async fn read_rune(&mut self) -> io::Result<Option<char>> {
        let Some(b0) = self.next_byte().await? else {
            self.last_rune = None;
            return Ok(None);
        };

        let width = utf8_width(b0);
        if width == 1 {
            return Ok(Some(self.commit(&[b0], b0 as char)));
        }
        if width == 0 {
            return Ok(Some(self.commit(&[b0], REPLACEMENT)));
        }

        let mut bytes = [b0, 0, 0, 0];
        let mut have = 1;
        while have < width {
            match self.next_byte().await? {
                Some(b) if b & 0xC0 == 0x80 => {
                    bytes[have] = b;
                    have += 1;
                }
                Some(b) => {
                    self.replay.push_front(b);
                    break;
                }
                None => break,
            }
        }

        if have == width {
            if let Ok(s) = std::str::from_utf8(&bytes[..width]) {
                let c = s.chars().next().unwrap_or(REPLACEMENT);
                return Ok(Some(self.commit(&bytes[..width], c)));
            }
        }

        // Truncated or overlong sequence: keep only the lead byte, put the
        // rest back so they are decoded on their own.
        for i in (1..have).rev() {
            self.replay.push_front(bytes[i]);
        }
        Ok(Some(self.commit(&[b0], REPLACEMENT)))
    }

    fn commit(&mut self, raw: &[u8], c: char) -> char {
        let mut stored = [0u8; 4];
        stored[..raw.len()].copy_from_slice(raw);
        self.last_rune = Some((stored, raw.len()));
        if self.capturing {
            self.capture.extend_from_slice(raw);
        }
        c
    }

    /// Pushes the most recently read rune back; the next read yields it
    /// again. Only one step of unread is supported.
    pub fn unread(&mut self) {
        if let Some((bytes, len)) = self.last_rune.take() {
            for i in (0..len).rev() {
                self.replay.push_front(bytes[i]);
            }
            if self.capturing {
                let keep = self.capture.len().saturating_sub(len);
                self.capture.truncate(keep);
            }
        }
    }

    /// Marks the current position as the rewind anchor and starts capturing.
    pub fn mark_start(&mut self) {
        self.capturing = true;
        self.capture.clear();
    }

    /// Stops capturing. The capture buffer must already be drained by a
    /// rewind; anything else is a bug in the caller.
    pub fn mark_end(&mut self) {
        debug_assert!(self.capture.is_empty(), "mark_end with pending capture");
        self.capturing = false;
    }

    /// Number of source bytes captured since the last `mark_start`.
    pub(crate) fn captured_len(&self) -> usize {
        self.capture.len()
    }

    /// Rewinds to the mark, discarding the first rune of the captured
    /// region. Used after a failed speculative parse so the next scan
    /// continues just past the probed opener.
    pub fn return_and_skip_one(&mut self) {
        let skip = match self.capture.first() {
            Some(&b) => utf8_width(b).max(1),
            None => 0,
        };
        self.return_and_skip(skip);
    }

    /// Rewinds to the mark, discarding the first `n` captured bytes. After
    /// this, reads are indistinguishable from a reader positioned at
    /// (mark + n). Capture is reset and disabled.
    pub fn return_and_skip(&mut self, n: usize) {
        let n = n.min(self.capture.len());
        for i in (n..self.capture.len()).rev() {
            self.replay.push_front(self.capture[i]);
        }
        self.capture.clear();
        self.capturing = false;
        self.last_rune = None;
    }
}

/// Expected sequence length for a UTF-8 lead byte, or 0 if the byte cannot
/// start a sequence.
fn utf8_width(b: u8) -> usize {
    match b {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// An [`AsyncRead`] fed by chunks of [`Bytes`] from a Tokio mpsc channel.
///
/// Useful for sources that produce data incrementally, like network bodies
/// or test harnesses that want to control chunk boundaries.
pub struct ChannelReader {
    rx: mpsc::Receiver<Bytes>,
    pending: Bytes,
}

impl ChannelReader {
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self {
            rx,
            pending: Bytes::new(),
        }
    }
}

impl AsyncRead for ChannelReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        while self.pending.is_empty() {
            match Pin::new(&mut self.rx).poll_recv(cx) {
                Poll::Ready(Some(chunk)) => self.pending = chunk,
                // Channel closed, signal EOF.
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
        let n = self.pending.len().min(buf.remaining());
        buf.put_slice(&self.pending.split_to(n));
        Poll::Ready(Ok(()))
    }
}
