use crate::domain::ports::TextRecognizer;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
}

/// Recognition engine reached over HTTP.
///
/// Posts the raw image bytes to `endpoint?lang=<language>` and expects a JSON
/// body of the form `{"text": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// No timeout is applied unless one is given here.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextRecognizer for HttpRecognizer {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        tracing::debug!("Posting {} bytes to OCR endpoint {}", image.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("lang", language)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("OCR response status: {}", status);

        if !status.is_success() {
            return Err(ScanError::RecognitionFailed {
                reason: format!("engine returned HTTP {}", status),
            });
        }

        let body = response.text().await?;
        let parsed: OcrResponse = serde_json::from_str(&body)?;
        Ok(parsed.text)
    }
}
