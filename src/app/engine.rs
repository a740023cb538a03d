use crate::app::scan_terminal::ScanTerminal;
use crate::core::recognition::RecognitionInvoker;
use crate::core::session::{PendingRecognition, ScanState};
use crate::utils::error::{Result, ScanError};
use crate::utils::monitor::SystemMonitor;

/// Outcome of one headless scan run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub final_state: ScanState,
    pub accepted: Option<String>,
}

/// Drives a `ScanTerminal` through a full scan without user interaction.
pub struct ScanEngine {
    terminal: ScanTerminal,
    invoker: RecognitionInvoker,
    monitor: SystemMonitor,
    auto_accept: bool,
}

impl ScanEngine {
    pub fn new(terminal: ScanTerminal, invoker: RecognitionInvoker) -> Self {
        Self::new_with_monitoring(terminal, invoker, false)
    }

    pub fn new_with_monitoring(
        terminal: ScanTerminal,
        invoker: RecognitionInvoker,
        enable_monitoring: bool,
    ) -> Self {
        Self {
            terminal,
            invoker,
            monitor: SystemMonitor::new(enable_monitoring),
            auto_accept: true,
        }
    }

    /// When off, a found candidate is left in the dialog instead of being
    /// written to the search field.
    pub fn with_auto_accept(mut self, auto_accept: bool) -> Self {
        self.auto_accept = auto_accept;
        self
    }

    pub fn terminal(&self) -> &ScanTerminal {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut ScanTerminal {
        &mut self.terminal
    }

    /// Camera path: start, capture, recognize.
    ///
    /// Session-local failures end up in `ScanReport::final_state`; only
    /// errors outside the session (e.g. invalid transitions) are returned.
    pub async fn scan_with_camera(&mut self) -> Result<ScanReport> {
        tracing::info!("🚀 Starting camera scan");
        self.terminal.open_dialog();
        self.monitor.log_stats("Dialog opened");

        if let Err(e) = self.terminal.start_camera().await {
            return self.session_failure(e);
        }
        self.monitor.log_stats("Camera started");

        let pending = match self.terminal.capture() {
            Ok(pending) => pending,
            Err(e) => return self.session_failure(e),
        };
        self.monitor.log_stats("Frame captured");

        self.finish(pending).await
    }

    /// Upload path: validate the file, recognize.
    pub async fn scan_upload(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<ScanReport> {
        tracing::info!("🚀 Starting upload scan for {}", file_name);
        self.terminal.open_dialog();

        let pending = match self.terminal.upload_image(file_name, bytes) {
            Ok(pending) => pending,
            Err(e) => return self.session_failure(e),
        };
        self.monitor.log_stats("Upload accepted");

        self.finish(pending).await
    }

    async fn finish(&mut self, pending: PendingRecognition) -> Result<ScanReport> {
        tracing::info!("🔍 Recognizing text...");
        let outcome = pending.run(&self.invoker).await;
        self.terminal.apply_recognition(outcome);
        self.monitor.log_stats("Recognition finished");

        let final_state = self.terminal.state().clone();
        let accepted = match &final_state {
            ScanState::ResultFound { .. } if self.auto_accept => {
                Some(self.terminal.use_candidate()?)
            }
            _ => None,
        };

        self.monitor.log_final_stats();
        Ok(ScanReport {
            final_state,
            accepted,
        })
    }

    fn session_failure(&mut self, e: ScanError) -> Result<ScanReport> {
        if !self.terminal.state().is_failed() {
            return Err(e);
        }
        tracing::warn!(
            "❌ Scan failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::warn!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        self.monitor.log_final_stats();
        Ok(ScanReport {
            final_state: self.terminal.state().clone(),
            accepted: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::inventory::InventoryCatalog;
    use crate::domain::model::VideoConstraints;
    use crate::domain::ports::{CameraDevice, TextRecognizer, VideoStream};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoCamera;

    #[async_trait]
    impl CameraDevice for NoCamera {
        async fn request_video_stream(
            &self,
            _constraints: &VideoConstraints,
        ) -> Result<Box<dyn VideoStream>> {
            Err(ScanError::CameraAccess {
                reason: "no video input device".to_string(),
            })
        }
    }

    struct Echo(&'static str);

    #[async_trait]
    impl TextRecognizer for Echo {
        async fn recognize(&self, _image: &[u8], _language: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn engine(text: &'static str) -> ScanEngine {
        let terminal = ScanTerminal::new(Arc::new(NoCamera), InventoryCatalog::fixtures());
        ScanEngine::new(terminal, RecognitionInvoker::new(Arc::new(Echo(text))))
    }

    #[tokio::test]
    async fn test_missing_camera_is_reported_in_state() {
        let mut engine = engine("unused");
        let report = engine.scan_with_camera().await.unwrap();

        assert!(report.final_state.is_failed());
        assert_eq!(report.accepted, None);
        assert!(engine.terminal().is_dialog_open());
    }

    #[tokio::test]
    async fn test_upload_scan_accepts_primary_candidate() {
        let mut engine = engine("Asset tag: APC-1500-021");
        let report = engine.scan_upload("ups.png", vec![1, 2, 3]).await.unwrap();

        assert_eq!(report.accepted.as_deref(), Some("APC-1500-021"));
        assert_eq!(engine.terminal().search_query(), "APC-1500-021");
        assert!(!engine.terminal().is_dialog_open());
    }

    #[tokio::test]
    async fn test_upload_without_auto_accept_keeps_dialog() {
        let mut engine = engine("POLY-CF-018").with_auto_accept(false);
        let report = engine.scan_upload("phone.jpg", vec![7]).await.unwrap();

        assert!(matches!(report.final_state, ScanState::ResultFound { .. }));
        assert_eq!(report.accepted, None);
        assert_eq!(
            engine.terminal().session().unwrap().primary_candidate(),
            Some("POLY-CF-018")
        );
    }
}
