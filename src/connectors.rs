use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, Url};

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// A remote source of bytes to scan, either fetched whole or streamed chunk
/// by chunk (feed the chunks through
/// [`StreamReader`](crate::StreamReader) to scan incrementally).
#[async_trait]
pub trait DataConnector {
    async fn fetch(&self) -> Result<Bytes, ConnectorError>;
    async fn stream(&self) -> Result<BoxStream<'static, Result<Bytes, ConnectorError>>, ConnectorError>;
}

pub struct HttpConnector {
    client: Client,
    url: Url,
}

impl HttpConnector {
    pub fn new(url: &str) -> Result<Self, ConnectorError> {
        Ok(Self {
            client: Client::new(),
            url: Url::parse(url).map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?,
        })
    }
}

#[async_trait]
impl DataConnector for HttpConnector {
    async fn fetch(&self) -> Result<Bytes, ConnectorError> {
        let response = self.client.get(self.url.as_ref()).send().await?;
        Ok(response.error_for_status()?.bytes().await?)
    }

    async fn stream(&self) -> Result<BoxStream<'static, Result<Bytes, ConnectorError>>, ConnectorError> {
        let response = self.client.get(self.url.as_ref()).send().await?;
        Ok(response
            .error_for_status()?
            .bytes_stream()
            .map(|chunk| chunk.map_err(Into::into))
            .boxed())
    }
}
