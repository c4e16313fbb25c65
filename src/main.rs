//! Command-line front end: extracts every JSON and JavaScript object
//! literal from a file, URL or standard input and prints one value per
//! line.

use clap::Parser;
use tokio::io::AsyncRead;
use tracing_subscriber::EnvFilter;

use jsonsift::{
    extract_objects, DataConnector, ExtractError, HttpConnector, JsonScanner, ObjectFilter,
    StreamReader,
};

#[derive(Parser)]
#[command(name = "jsonsift", version)]
#[command(about = "Extract JSON and JavaScript object literals from a file, URL or stdin")]
struct Cli {
    /// File path, http(s):// URL, or '-' for standard input
    source: String,

    /// Print only objects that contain all of these keys
    keys: Vec<String>,

    /// Stop after printing this many values
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let reader = open_source(&cli.source).await?;

    let limit = cli.limit;
    let mut printed = 0usize;
    let callback = move |bytes: &[u8]| {
        println!("{}", String::from_utf8_lossy(bytes));
        printed += 1;
        if Some(printed) == limit {
            return Err(ExtractError::Stop);
        }
        Ok(())
    };

    if cli.keys.is_empty() {
        // Without a key filter we print arrays too, which extract_objects
        // never reports on their own.
        JsonScanner::new(reader).scan(callback).await?;
    } else {
        extract_objects(reader, vec![ObjectFilter::new(cli.keys.clone(), callback)]).await?;
    }

    Ok(())
}

async fn open_source(
    arg: &str,
) -> Result<Box<dyn AsyncRead + Unpin>, Box<dyn std::error::Error>> {
    if arg == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }
    if arg.starts_with("http://") || arg.starts_with("https://") {
        let connector = HttpConnector::new(arg)?;
        let stream = connector.stream().await?;
        return Ok(Box::new(StreamReader::new(stream)));
    }
    Ok(Box::new(tokio::fs::File::open(arg).await?))
}
