use crate::core::extraction::CandidateExtractor;
use crate::domain::model::{ImagePayload, RecognitionResult};
use crate::domain::ports::TextRecognizer;
use crate::utils::error::{Result, ScanError};
use chrono::Utc;
use std::sync::Arc;

pub const DEFAULT_LANGUAGE: &str = "eng";

/// Hands image payloads to the recognition engine and derives candidates.
#[derive(Clone)]
pub struct RecognitionInvoker {
    recognizer: Arc<dyn TextRecognizer>,
    language: String,
    extractor: CandidateExtractor,
}

impl RecognitionInvoker {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            language: DEFAULT_LANGUAGE.to_string(),
            extractor: CandidateExtractor::default(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_extractor(mut self, extractor: CandidateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Takes the payload by value; it is dropped when the call returns.
    pub async fn recognize(&self, payload: ImagePayload) -> Result<RecognitionResult> {
        tracing::debug!(
            "Submitting {} byte image ({:?}) for recognition, language {}",
            payload.len(),
            payload.source(),
            self.language
        );

        let text = self
            .recognizer
            .recognize(payload.bytes(), &self.language)
            .await
            .map_err(|e| match e {
                ScanError::RecognitionFailed { .. } => e,
                other => ScanError::RecognitionFailed {
                    reason: other.to_string(),
                },
            })?;
        drop(payload);

        let candidates = self.extractor.extract(&text);
        tracing::info!(
            "🔎 Recognized {} chars, {} candidate(s)",
            text.chars().count(),
            candidates.len()
        );

        Ok(RecognitionResult {
            text,
            candidates,
            recognized_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedRecognizer(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl TextRecognizer for FixedRecognizer {
        async fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
            assert!(!image.is_empty());
            assert_eq!(language, "eng");
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(reason) => Err(ScanError::IoError(std::io::Error::other(reason))),
            }
        }
    }

    #[tokio::test]
    async fn test_recognize_derives_candidates() {
        let invoker = RecognitionInvoker::new(Arc::new(FixedRecognizer(Ok(
            "HP-M404-003 CISCO-2960-005",
        ))));
        let result = invoker
            .recognize(ImagePayload::from_capture(vec![1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(result.candidates, vec!["HP-M404-003", "CISCO-2960-005"]);
        assert_eq!(result.primary_candidate(), Some("HP-M404-003"));
    }

    #[tokio::test]
    async fn test_empty_text_is_no_match_not_error() {
        let invoker = RecognitionInvoker::new(Arc::new(FixedRecognizer(Ok("abc"))));
        let result = invoker
            .recognize(ImagePayload::from_upload("label.png", vec![9]))
            .await
            .unwrap();

        assert!(result.is_no_match());
        assert_eq!(result.primary_candidate(), None);
    }

    #[tokio::test]
    async fn test_engine_failure_becomes_recognition_error() {
        let invoker = RecognitionInvoker::new(Arc::new(FixedRecognizer(Err("worker crashed"))));
        let err = invoker
            .recognize(ImagePayload::from_capture(vec![1]))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::RecognitionFailed { .. }));
        assert!(err.to_string().contains("worker crashed"));
    }
}
