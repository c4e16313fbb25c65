use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tokio_stream::Stream;
use tracing::{debug, instrument, trace};

use crate::normalize::read_js_value;
use crate::reader::RewindReader;

/// Error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sentinel a callback returns to end extraction without an error.
    /// Never returned to the caller of [`JsonScanner::scan`].
    #[error("stop extraction")]
    Stop,

    /// A filter marked required was never satisfied.
    #[error("required callback was never called")]
    CallbackNeverCalled,

    /// Arbitrary error raised by a user callback, propagated verbatim.
    #[error("callback error: {0}")]
    Callback(Box<dyn std::error::Error + Send + Sync>),
}

impl ExtractError {
    /// Wraps a user error so a callback can abort extraction with it.
    pub fn callback<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Callback(Box::new(err))
    }
}

/// Configuration for [`JsonScanner`].
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Size of the reads issued against the underlying source.
    pub chunk_size: usize,
    /// Upper bound on the source bytes a single candidate may cover. A
    /// candidate running past it is treated as not-a-value and scanning
    /// continues one rune after its opener. `None` means unbounded.
    pub max_value_bytes: Option<usize>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            max_value_bytes: None,
        }
    }
}

/// Scans a byte stream for embedded JSON and JavaScript object or array
/// literals, yielding each as strict, validated JSON.
///
/// The scanner probes every `{` and `[` it encounters, speculatively parses
/// one balanced value, normalises relaxed JavaScript notation to JSON, and
/// keeps the result only if it passes strict validation. Failed probes
/// rewind and scanning resumes one rune later, so arbitrary non-JSON text
/// between values is skipped without being buffered.
///
/// ```no_run
/// use tokio::io::BufReader;
///
/// # async fn run() -> Result<(), jsonsift::ExtractError> {
/// let html = br#"<script>var cfg = {retries: 3, endpoint: '/api'};</script>"#;
/// let mut scanner = jsonsift::JsonScanner::new(BufReader::new(&html[..]));
/// while let Some(value) = scanner.next_value().await? {
///     println!("{}", String::from_utf8_lossy(&value));
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonScanner<R> {
    source: RewindReader<R>,
    max_value_bytes: Option<usize>,
}

impl<R: AsyncRead + Unpin> JsonScanner<R> {
    /// Creates a scanner with default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ScannerConfig::default())
    }

    pub fn with_config(reader: R, config: ScannerConfig) -> Self {
        Self {
            source: RewindReader::new(reader, config.chunk_size),
            max_value_bytes: config.max_value_bytes,
        }
    }

    /// Returns the next embedded value, or `None` once the source is
    /// exhausted. Every returned slice starts with `{` or `[` and is valid
    /// JSON.
    #[instrument(level = "debug", skip(self))]
    pub async fn next_value(&mut self) -> Result<Option<Bytes>, ExtractError> {
        loop {
            let Some(c) = self.source.read_rune().await? else {
                return Ok(None);
            };
            if c != '{' && c != '[' {
                continue;
            }

            // Give the opener back so the lexer sees it too, and remember
            // this spot in case the speculation fails.
            self.source.unread();
            self.source.mark_start();

            match read_js_value(&mut self.source, self.max_value_bytes).await? {
                Some((candidate, consumed)) if is_strict_json(&candidate) => {
                    // The lexer may have read past the value; resume right
                    // after the bytes it actually covered.
                    self.source.return_and_skip(consumed);
                    self.source.mark_end();
                    debug!(len = candidate.len(), "extracted value");
                    return Ok(Some(candidate.freeze()));
                }
                _ => {
                    trace!("rejected candidate, resuming one rune later");
                    self.source.return_and_skip_one();
                }
            }
        }
    }

    /// Invokes `callback` for every embedded value until the source is
    /// exhausted or the callback stops the scan.
    ///
    /// Returning [`ExtractError::Stop`] from the callback terminates the
    /// scan cleanly; any other error is propagated.
    pub async fn scan<F>(&mut self, mut callback: F) -> Result<(), ExtractError>
    where
        F: FnMut(&[u8]) -> Result<(), ExtractError>,
    {
        while let Some(value) = self.next_value().await? {
            match callback(&value) {
                Ok(()) => {}
                Err(ExtractError::Stop) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Returns the next embedded value that deserializes into `T`, skipping
    /// values that do not decode.
    pub async fn next_as<T: DeserializeOwned>(&mut self) -> Result<Option<T>, ExtractError> {
        while let Some(value) = self.next_value().await? {
            if let Ok(decoded) = serde_json::from_slice(&value) {
                return Ok(Some(decoded));
            }
        }
        Ok(None)
    }

    /// Converts the scanner into a stream of extracted values. The stream
    /// ends at end of input, or after yielding one error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, ExtractError>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut scanner = state?;
            match scanner.next_value().await {
                Ok(Some(value)) => Some((Ok(value), Some(scanner))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

/// Strict-JSON validation gate. simd-json unescapes in place, so it gets a
/// scratch copy rather than the candidate itself.
pub(crate) fn is_strict_json(candidate: &[u8]) -> bool {
    if candidate.is_empty() {
        return false;
    }
    let mut scratch = candidate.to_vec();
    simd_json::to_tape(&mut scratch).is_ok()
}
