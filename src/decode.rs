use serde::de::DeserializeOwned;

use crate::scanner::ExtractError;

/// Builds a callback that decodes extracted values into `target` until
/// `verify` accepts one.
///
/// Values that do not deserialize into `T` are skipped silently; each one
/// that does overwrites `target`, and `verify` then inspects it. Once
/// `verify` returns true the callback signals [`ExtractError::Stop`] and
/// never touches `target` again, so the accepted value survives even if the
/// callback is invoked further (as it can be inside
/// [`extract_objects`](crate::extract_objects)).
///
/// ```no_run
/// use tokio::io::BufReader;
///
/// #[derive(Default, serde::Deserialize)]
/// struct Repo {
///     name: String,
///     stars: u64,
/// }
///
/// # async fn run() -> Result<(), jsonsift::ExtractError> {
/// let page = br#"...<script>var data = {name: "jsonsift", stars: 7};</script>..."#;
/// let mut repo = Repo::default();
/// let mut scanner = jsonsift::JsonScanner::new(BufReader::new(&page[..]));
/// scanner
///     .scan(jsonsift::decode_into(&mut repo, |r| !r.name.is_empty()))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub fn decode_into<'a, T, F>(
    target: &'a mut T,
    mut verify: F,
) -> impl FnMut(&[u8]) -> Result<(), ExtractError> + Send + 'a
where
    T: DeserializeOwned + Send,
    F: FnMut(&T) -> bool + Send + 'a,
{
    let mut done = false;
    move |bytes| {
        if done {
            return Ok(());
        }
        match serde_json::from_slice::<T>(bytes) {
            Ok(value) => *target = value,
            // Shape mismatch just means this wasn't the object we want.
            Err(_) => return Ok(()),
        }
        if verify(target) {
            done = true;
            return Err(ExtractError::Stop);
        }
        Ok(())
    }
}
