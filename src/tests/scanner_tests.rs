#[cfg(test)]
mod tests {
    use crate::{ChannelReader, ExtractError, JsonScanner, ScannerConfig};

    use bytes::Bytes;
    use std::io::Cursor;
    use tokio::io::BufReader;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Duration};
    use tokio_stream::StreamExt;

    async fn collect_values(input: &str) -> Vec<String> {
        collect_values_bytes(input.as_bytes()).await
    }

    async fn collect_values_bytes(input: &[u8]) -> Vec<String> {
        let stream = BufReader::new(Cursor::new(input.to_vec()));
        let mut scanner = JsonScanner::new(stream);
        let mut values = Vec::new();
        scanner
            .scan(|b| {
                values.push(String::from_utf8(b.to_vec()).unwrap());
                Ok(())
            })
            .await
            .unwrap();
        values
    }

    // --- Strict JSON embedded in other text ---

    #[tokio::test]
    async fn values_between_text() {
        let cases: &[(&str, &[&str])] = &[
            (
                "{}some {}text[] in {}between{}",
                &["{}", "{}", "[]", "{}", "{}"],
            ),
            ("{}{}[]{}{}", &["{}", "{}", "[]", "{}", "{}"]),
            (r#"{"a": "b"}"#, &[r#"{"a":"b"}"#]),
            ("[1, 3, 55]", &["[1,3,55]"]),
            ("[15, 17, -3]", &["[15,17,-3]"]),
            ("askdflaksmvalsd", &[]),
            // A top-level string is not an object or array.
            (r#""json encoded text\nNew line""#, &[]),
            (
                "{\n\t\"test\": \"this is a very }{} mean string\"\t\n}",
                &[r#"{"test":"this is a very }{} mean string"}"#],
            ),
            (
                "{\n\t\"test\": \"this is another very ][] mean string\"\t\n}",
                &[r#"{"test":"this is another very ][] mean string"}"#],
            ),
        ];
        for (input, want) in cases {
            assert_eq!(collect_values(input).await, *want, "input: {input}");
        }
    }

    #[tokio::test]
    async fn skips_unmatched_openers() {
        let cases: &[(&str, &[&str])] = &[
            (
                r#"{{ "test": "a" } {}text[] in {}between{}"#,
                &[r#"{"test":"a"}"#, "{}", "[]", "{}", "{}"],
            ),
            (
                r#"{{{{{ "test": "a" }} }}}}}}{ {}text[] in {}between{}"#,
                &[r#"{"test":"a"}"#, "{}", "[]", "{}", "{}"],
            ),
        ];
        for (input, want) in cases {
            assert_eq!(collect_values(input).await, *want, "input: {input}");
        }
    }

    #[tokio::test]
    async fn deeply_unbalanced_brackets() {
        let input = "{".repeat(250) + &"}".repeat(100);
        assert_eq!(collect_values(&input).await, ["{}"]);

        let input = "[".repeat(100) + "]";
        assert_eq!(collect_values(&input).await, ["[]"]);
    }

    #[tokio::test]
    async fn unterminated_string_yields_nothing() {
        let input = format!("[\"{}]", "long string ".repeat(100));
        assert_eq!(collect_values(&input).await, Vec::<String>::new());
    }

    // --- Relaxed JavaScript notation ---

    #[tokio::test]
    async fn relaxed_notation_corpus() {
        let cases: &[(&str, &[&str])] = &[
            (r#"{ key: "value" }"#, &[r#"{"key":"value"}"#]),
            ("['a', 'b',]", &[r#"["a","b"]"#]),
            ("[1, 3, 55, ]", &["[1,3,55]"]),
            (
                "{\n\t\"a\": \"b\",\n\t\"c\": \"trailing comma\",\nleading: 'quote',\n}",
                &[r#"{"a":"b","c":"trailing comma","leading":"quote"}"#],
            ),
            (r#"{'test': "Test"}"#, &[r#"{"test":"Test"}"#]),
            (
                r#"["one", 'two', "three", ]"#,
                &[r#"["one","two","three"]"#],
            ),
            (
                r#"<script>var arr = ["one", 'two &amp; three', "four", ];</script>"#,
                &[r#"["one","two &amp; three","four"]"#],
            ),
            (
                r#"<script>
    loadScript('/static/js/sidenav.js', {type: 'module', async: true, defer: true})
  </script>"#,
                &[r#"{"type":"module","async":true,"defer":true}"#],
            ),
            (
                "{ a: 0x15, b: 0o25, c: 0b10101, d: 21n }",
                &[r#"{"a":21,"b":21,"c":21,"d":21}"#],
            ),
            ("{ x: NaN, y: undefined }", &[r#"{"x":null,"y":null}"#]),
            ("{ dec: +21, neg: -0x3 }", &[r#"{"dec":21,"neg":-3}"#]),
            (r#"{"key":  /test/i, useful_data: { "a": "b" }, another_value_we_might_want:"c" }"#,
                &[r#"{"key":"/test/i","useful_data":{"a":"b"},"another_value_we_might_want":"c"}"#]),
            (
                "{\ta: 'null',\tb: `true`, c: \"false\"\t }",
                &[r#"{"a":"null","b":"true","c":"false"}"#],
            ),
            ("['ayy \\'', \"lmao\\\"\"]", &["[\"ayy '\",\"lmao\\\"\"]"]),
        ];
        for (input, want) in cases {
            assert_eq!(collect_values(input).await, *want, "input: {input}");
        }
    }

    #[tokio::test]
    async fn comments_are_dropped() {
        let input = r#"{
	// Keys without quotes are valid in JavaScript, but not in JSON
	key: "value",
	num: 295.2,

	/* Comments are removed while processing */

	"obj": {
		"quoted": 325,
		unquoted: 'test', // This trailing comma will be removed
	}
}"#;
        assert_eq!(
            collect_values(input).await,
            [r#"{"key":"value","num":295.2,"obj":{"quoted":325,"unquoted":"test"}}"#]
        );
    }

    #[tokio::test]
    async fn template_literals() {
        let cases: &[(&str, &[&str])] = &[
            ("[`Template quotes`]", &[r#"["Template quotes"]"#]),
            (
                "[`Template quotes inside of template quotes can be escaped using \\``]",
                &["[\"Template quotes inside of template quotes can be escaped using `\"]"],
            ),
            ("{ key: ` \\` ` }", &["{\"key\":\" ` \"}"]),
            (
                "{ 'key': `this is a\nmultline JavaScript string` }",
                &[r#"{"key":"this is a\nmultline JavaScript string"}"#],
            ),
            ("{ k: `line\nhere` }", &[r#"{"k":"line\nhere"}"#]),
            // Substitutions are expressions, which are not supported.
            ("{ k: `a${1}b` }", &[]),
        ];
        for (input, want) in cases {
            assert_eq!(collect_values(input).await, *want, "input: {input}");
        }
    }

    #[tokio::test]
    async fn expressions_are_rejected() {
        let cases = [
            r#"{"num": 3+3 }"#,
            r#"{expr: null || "fallback string" }"#,
            "{ sum: 1 + 2 }",
            "{ n: 1_000 }",
            "{ v: Infinity }",
        ];
        for input in cases {
            assert_eq!(
                collect_values(input).await,
                Vec::<String>::new(),
                "input: {input}"
            );
        }
    }

    #[tokio::test]
    async fn single_quoted_array_from_markup() {
        let input = r#"StackExchange.user.userCardMessages.nextPrivInfo = [
                        '<h4 class="popup-title">Create new tags</h4>',
                        '<div class="popup-white">',
                            '<p>Add new tags to the site</p>',
                        '</div>'
                    ].join('');"#;
        assert_eq!(
            collect_values(input).await,
            [r#"["<h4 class=\"popup-title\">Create new tags</h4>","<div class=\"popup-white\">","<p>Add new tags to the site</p>","</div>"]"#]
        );
    }

    // --- Delivery contract ---

    #[tokio::test]
    async fn every_delivered_value_round_trips() {
        let input = r#"{{{{{ "test": "a" }} }}}}}}{ {}text[1, 2,] in {a: 'b'}between{}"#;
        for value in collect_values(input).await {
            assert_eq!(collect_values(&value).await, [value.clone()]);
        }
    }

    #[tokio::test]
    async fn callback_can_stop_early() {
        let stream = BufReader::new(Cursor::new(b"{}{}{}{}{}".to_vec()));
        let mut scanner = JsonScanner::new(stream);
        let mut calls = 0;
        scanner
            .scan(|_| {
                calls += 1;
                if calls == 2 {
                    return Err(ExtractError::Stop);
                }
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn callback_errors_propagate() {
        let stream = BufReader::new(Cursor::new(b"{}".to_vec()));
        let mut scanner = JsonScanner::new(stream);
        let result = scanner.scan(|_| Err(ExtractError::callback(std::fmt::Error))).await;
        assert!(matches!(result, Err(ExtractError::Callback(_))));
    }

    #[tokio::test]
    async fn next_as_skips_unrelated_values() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Person {
            name: String,
            age: u32,
        }

        let data = r#"[1,2,3] junk {"other": true} {name: 'Alice', age: 30} tail"#;
        let stream = BufReader::new(Cursor::new(data.as_bytes().to_vec()));
        let mut scanner = JsonScanner::new(stream);
        let person: Option<Person> = scanner.next_as().await.unwrap();
        assert_eq!(
            person,
            Some(Person {
                name: "Alice".into(),
                age: 30
            })
        );
    }

    #[tokio::test]
    async fn into_stream_yields_all_values() {
        let stream = BufReader::new(Cursor::new(b"{} mid [] end".to_vec()));
        let values = JsonScanner::new(stream).into_stream();
        tokio::pin!(values);
        let mut collected = Vec::new();
        while let Some(value) = values.next().await {
            collected.push(String::from_utf8(value.unwrap().to_vec()).unwrap());
        }
        assert_eq!(collected, ["{}", "[]"]);
    }

    #[tokio::test]
    async fn oversized_candidates_are_skipped() {
        let big = format!(r#"{{"blob": "{}"}}"#, "x".repeat(256));
        let input = format!("{big} {{}}");
        let stream = BufReader::new(Cursor::new(input.into_bytes()));
        let mut scanner = JsonScanner::with_config(
            stream,
            ScannerConfig {
                max_value_bytes: Some(64),
                ..ScannerConfig::default()
            },
        );
        let mut values = Vec::new();
        scanner
            .scan(|b| {
                values.push(String::from_utf8(b.to_vec()).unwrap());
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(values, ["{}"]);
    }

    #[tokio::test]
    async fn invalid_utf8_between_values_is_skipped() {
        let mut data = br#"{"name": "Alice"}"#.to_vec();
        data.push(0xFF);
        data.extend_from_slice(b"{}");
        assert_eq!(
            collect_values_bytes(&data).await,
            [r#"{"name":"Alice"}"#, "{}"]
        );
    }

    // --- Chunked sources ---

    #[tokio::test]
    async fn extracts_from_delayed_chunked_stream() {
        let page = r#"Certainly! Here's the data you asked for:

{
  "status": "success",
  "data": { "id": 123, "name": "John Doe" }
}

Let me know if you need anything else."#;

        let (tx, rx) = mpsc::channel::<Bytes>(10);
        let reader = ChannelReader::new(rx);
        let mut scanner = JsonScanner::new(reader);

        let parts: Vec<Bytes> = page
            .as_bytes()
            .chunks(30)
            .map(Bytes::copy_from_slice)
            .collect();
        tokio::spawn(async move {
            for part in parts {
                tx.send(part).await.unwrap();
                sleep(Duration::from_millis(10)).await;
            }
        });

        let value = scanner.next_value().await.unwrap().unwrap();
        assert_eq!(
            value,
            &br#"{"status":"success","data":{"id":123,"name":"John Doe"}}"#[..]
        );
        assert!(scanner.next_value().await.unwrap().is_none());
    }
}
