#[cfg(test)]
mod tests {
    use crate::{extract_json, extract_json_value, extract_json_values};

    #[test]
    fn extract_json_object() {
        let text = "Header { \"key\": \"value\" } Footer";
        let (json, consumed) = extract_json(text.as_bytes()).unwrap();
        // Slice extraction keeps the original formatting.
        assert_eq!(json, &b"{ \"key\": \"value\" }"[..]);
        assert_eq!(consumed, text.len() - " Footer".len());
    }

    #[test]
    fn extract_json_array() {
        let text = "Some text [1, 2, 3, 4] more text";
        let (json, _) = extract_json(text.as_bytes()).unwrap();
        assert_eq!(json, &b"[1, 2, 3, 4]"[..]);
    }

    #[test]
    fn extract_json_skips_invalid_regions() {
        // The first balanced region is not valid JSON, the second is.
        let text = "{not json} then {\"a\": 1}";
        let (json, _) = extract_json(text.as_bytes()).unwrap();
        assert_eq!(json, &b"{\"a\": 1}"[..]);
    }

    #[test]
    fn extract_json_ignores_brackets_in_strings() {
        let text = r#"pre {"test": "a very }{} mean string"} post"#;
        let (json, _) = extract_json(text.as_bytes()).unwrap();
        assert_eq!(json, &br#"{"test": "a very }{} mean string"}"#[..]);
    }

    #[test]
    fn extract_json_values_collects_in_order() {
        assert_eq!(extract_json_values(r#"{"a": "b"}"#), [r#"{"a": "b"}"#]);
        assert_eq!(extract_json_values("[1, 3, 55]"), ["[1, 3, 55]"]);
        assert_eq!(
            extract_json_values("{} and [] and {\"x\": []}"),
            ["{}", "[]", "{\"x\": []}"]
        );
        // Relaxed notation is the streaming scanner's job, not this one's.
        assert!(extract_json_values("[1, 3, 55, ]").is_empty());
        assert!(extract_json_values("askdflaksmvalsd").is_empty());
        assert!(extract_json_values(r#""json encoded text\nNew line""#).is_empty());
    }

    #[test]
    fn extract_json_value_decodes() {
        let value = extract_json_value(b"noise {\"id\": 7} noise").unwrap();
        assert_eq!(value, simd_json::json!({"id": 7}));
    }

    #[test]
    fn extract_json_value_none_without_value() {
        assert!(extract_json_value(b"nothing here").is_none());
    }
}
