//! Extracts every JSON and JavaScript value from an HTML snippet and prints
//! them one per line.
//!
//! Run with: cargo run --example readme

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<script>
var config = {
    // Comments and unquoted keys are fine
    endpoint: '/api/v2',
    retries: 0x3,
    features: ['search', 'export',],
};
</script>
</head>
<body>
<p>Some text with an inline list [1, 2, 3] in it.</p>
<script type="application/ld+json">
{"@type": "Product", "name": "jsonsift"}
</script>
</body>
</html>"#;

#[tokio::main]
async fn main() -> Result<(), jsonsift::ExtractError> {
    let mut scanner = jsonsift::JsonScanner::new(PAGE.as_bytes());
    scanner
        .scan(|value| {
            println!("{}", String::from_utf8_lossy(value));
            Ok(())
        })
        .await
}
