use simd_json::OwnedValue;

use crate::scanner::is_strict_json;

/// Finds the first valid JSON object or array embedded in `bytes`.
///
/// Returns the value's raw bytes (original formatting preserved) together
/// with the offset just past it, so callers can continue scanning there.
/// Unlike the streaming scanner this only recognises strict JSON; relaxed
/// JavaScript notation is the scanner's job.
pub fn extract_json(bytes: &[u8]) -> Option<(&[u8], usize)> {
    let mut offset = 0;
    while offset < bytes.len() {
        let start = offset + bytes[offset..].iter().position(|&c| c == b'{' || c == b'[')?;
        if let Some(len) = balanced_end(&bytes[start..]) {
            let region = &bytes[start..start + len];
            if is_strict_json(region) {
                return Some((region, start + len));
            }
        }
        offset = start + 1;
    }
    None
}

/// Length of the balanced bracket region starting at `bytes[0]`, skipping
/// brackets inside string literals.
fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let (opening, closing) = match bytes.first()? {
        b'{' => (b'{', b'}'),
        b'[' => (b'[', b']'),
        _ => return None,
    };

    let mut count = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, &c) in bytes.iter().enumerate() {
        match (in_string, escape, c) {
            (true, false, b'\\') => escape = true,
            (true, true, _) => escape = false,
            (true, false, b'"') => in_string = false,
            (false, _, b'"') => in_string = true,
            (false, _, c) if c == opening => count += 1,
            (false, _, c) if c == closing => {
                count -= 1;
                if count == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collects every valid JSON value embedded in `data`, in positional order.
/// Values are non-overlapping: scanning resumes after each match, so nested
/// objects inside an already collected value are not reported again.
pub fn extract_json_values(data: &str) -> Vec<&str> {
    let mut extracted = Vec::new();
    let mut base = 0;
    while let Some((region, end)) = extract_json(&data.as_bytes()[base..]) {
        let start = base + end - region.len();
        // Region boundaries are ASCII brackets, so these are char
        // boundaries.
        extracted.push(&data[start..base + end]);
        base += end;
    }
    extracted
}

/// Parses the first embedded JSON value in `bytes` into an owned value.
pub fn extract_json_value(bytes: &[u8]) -> Option<OwnedValue> {
    let (json, _) = extract_json(bytes)?;
    // simd_json needs a mutable buffer.
    let mut scratch = json.to_vec();
    simd_json::to_owned_value(&mut scratch).ok()
}
