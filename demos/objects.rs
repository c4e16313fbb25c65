//! Pulls two specific objects out of a page, no matter how deeply they are
//! nested, by matching on their keys.
//!
//! Run with: cargo run --example objects

use jsonsift::{decode_into, extract_objects, ObjectFilter};

const PAGE: &str = r#"<script>
var repo = {
    "name": "jsonsift",
    "owner": {
        login: 'acme',
        id: 32465636,
        html_url: "https://example.com/acme",
    },
    "license": {
        key: "mit",
        name: "MIT License",
        spdx_id: "MIT",
    },
};
</script>"#;

#[derive(Debug, Default, serde::Deserialize)]
struct License {
    key: String,
    name: String,
    #[serde(default)]
    spdx_id: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct Owner {
    login: String,
    id: u64,
    html_url: String,
}

#[tokio::main]
async fn main() -> Result<(), jsonsift::ExtractError> {
    let mut license = License::default();
    let mut owner = Owner::default();

    extract_objects(
        PAGE.as_bytes(),
        vec![
            ObjectFilter::new(
                vec!["key", "name", "spdx_id"],
                decode_into(&mut license, |l| !l.key.is_empty() && !l.name.is_empty()),
            )
            .required(),
            ObjectFilter::new(
                vec!["login", "id", "html_url"],
                decode_into(&mut owner, |o| !o.login.is_empty()),
            )
            .required(),
        ],
    )
    .await?;

    println!("{} published under the {}", owner.login, license.name);
    Ok(())
}
