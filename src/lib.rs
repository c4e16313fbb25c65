//! # jsonsift
//!
//! Finds and extracts every valid JSON value, and every JavaScript object
//! or array literal, embedded anywhere in a byte stream: HTML pages,
//! script sources, logs, LLM output, mixed prose. Relaxed JavaScript
//! notation (unquoted keys, single-quoted and template strings, comments,
//! trailing commas, hex/octal/binary and bigint numbers, `undefined` and
//! `NaN`) is converted to strict JSON before a value is yielded.
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use tokio::sync::mpsc;
//! use tokio::time::{sleep, Duration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), jsonsift::ExtractError> {
//!     // Simulate a page arriving in chunks over the network.
//!     let (tx, rx) = mpsc::channel::<Bytes>(10);
//!     let reader = jsonsift::ChannelReader::new(rx);
//!     let mut scanner = jsonsift::JsonScanner::new(reader);
//!
//!     tokio::spawn(async move {
//!         let page = r#"<script>
//!             var config = {
//!                 // unquoted keys, comments and hex numbers are fine
//!                 endpoint: '/api/v2',
//!                 retries: 0x3,
//!             };
//!         </script>"#;
//!         for part in page.as_bytes().chunks(40) {
//!             tx.send(Bytes::copy_from_slice(part)).await.unwrap();
//!             sleep(Duration::from_millis(20)).await;
//!         }
//!     });
//!
//!     while let Some(value) = scanner.next_value().await? {
//!         // Prints {"endpoint":"/api/v2","retries":3}
//!         println!("{}", String::from_utf8_lossy(&value));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For pulling specific objects out of a page no matter how deeply they are
//! nested, see [`extract_objects`]; for scanning in-memory slices without
//! the relaxed dialect, see [`extract_json`].

#[cfg(test)]
mod tests;

mod reader;
pub use reader::*;

mod lexer;
mod normalize;

mod scanner;
pub use scanner::*;

mod extract_json;
pub use extract_json::*;

mod objects;
pub use objects::*;

mod decode;
pub use decode::*;

mod stream_adapter;
pub use stream_adapter::*;

mod connectors;
pub use connectors::*;
