use std::collections::BTreeMap;

use serde_json::value::RawValue;
use tokio::io::AsyncRead;

use crate::scanner::{ExtractError, JsonScanner};

/// Callback receiving the raw bytes of one extracted value.
pub type ValueCallback<'a> = Box<dyn FnMut(&[u8]) -> Result<(), ExtractError> + Send + 'a>;

/// A key filter plus the callback that claims matching objects during
/// [`extract_objects`].
pub struct ObjectFilter<'a> {
    keys: Vec<String>,
    callback: ValueCallback<'a>,
    required: bool,
}

impl<'a> ObjectFilter<'a> {
    /// Routes every object whose immediate keys include all of `keys` to
    /// `callback`. An empty key list matches every object.
    pub fn new<K, F>(keys: impl IntoIterator<Item = K>, callback: F) -> Self
    where
        K: Into<String>,
        F: FnMut(&[u8]) -> Result<(), ExtractError> + Send + 'a,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            callback: Box::new(callback),
            required: false,
        }
    }

    /// Makes the whole extraction fail with
    /// [`ExtractError::CallbackNeverCalled`] unless this filter's callback
    /// stops at some object.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn matches(&self, object: &BTreeMap<String, &RawValue>) -> bool {
        self.keys.iter().all(|key| object.contains_key(key))
    }
}

/// Extracts all nested objects from `reader` and routes each to the first
/// matching filter.
///
/// Every object discovered by the scanner is checked against the filters in
/// declaration order, including objects nested inside arrays and other
/// objects, however deep. At most one filter claims any given object, and a
/// match does not stop the walk from descending into the object's children.
/// Children are visited in lexicographic key order, so traversal order is
/// deterministic.
///
/// When several filters could match the same object the one declared first
/// wins, even if a later one is more specific: list the most specific
/// filters first.
///
/// A callback returning [`ExtractError::Stop`] marks its filter satisfied;
/// satisfied filters stop matching, and once every filter is satisfied the
/// walk ends early. Arrays never match a filter themselves, but the objects
/// inside them do.
pub async fn extract_objects<R>(
    reader: R,
    mut filters: Vec<ObjectFilter<'_>>,
) -> Result<(), ExtractError>
where
    R: AsyncRead + Unpin,
{
    let mut walk = Walk {
        satisfied: vec![false; filters.len()],
        satisfied_count: 0,
    };

    let mut scanner = JsonScanner::new(reader);
    scanner
        .scan(|bytes| {
            // Scanner output is built from UTF-8 tokens, so this cannot
            // fail in practice.
            let Ok(text) = std::str::from_utf8(bytes) else {
                return Ok(());
            };
            walk.value(text, &mut filters)
        })
        .await?;

    for (filter, done) in filters.iter().zip(&walk.satisfied) {
        if filter.required && !done {
            return Err(ExtractError::CallbackNeverCalled);
        }
    }
    Ok(())
}

struct Walk {
    satisfied: Vec<bool>,
    satisfied_count: usize,
}

impl Walk {
    fn value(&mut self, text: &str, filters: &mut [ObjectFilter<'_>]) -> Result<(), ExtractError> {
        match text.as_bytes().first() {
            Some(b'[') => {
                let items: Vec<&RawValue> = serde_json::from_str(text)?;
                for item in items {
                    self.value(item.get(), filters)?;
                }
            }
            Some(b'{') => {
                let object: BTreeMap<String, &RawValue> = serde_json::from_str(text)?;

                for (index, filter) in filters.iter_mut().enumerate() {
                    if self.satisfied[index] || !filter.matches(&object) {
                        continue;
                    }
                    match (filter.callback)(text.as_bytes()) {
                        Ok(()) => {}
                        Err(ExtractError::Stop) => {
                            self.satisfied[index] = true;
                            self.satisfied_count += 1;
                            if self.satisfied_count == filters.len() {
                                // Every filter has what it wanted; Stop
                                // propagates to the scanner as a clean end.
                                return Err(ExtractError::Stop);
                            }
                        }
                        Err(err) => return Err(err),
                    }
                    // Only the first matching filter is called.
                    break;
                }

                // BTreeMap iterates in key order, which keeps the traversal
                // deterministic for callers comparing callback sequences.
                for child in object.values() {
                    self.value(child.get(), filters)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
