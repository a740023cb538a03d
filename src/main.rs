use anyhow::Context;
use clap::Parser;
use serial_scan::app::inventory::InventoryCatalog;
use serial_scan::core::capture::FrameCapture;
use serial_scan::core::session::{ScanState, NO_MATCH_MESSAGE};
use serial_scan::core::Storage;
use serial_scan::utils::error::ErrorSeverity;
use serial_scan::utils::{logger, validation::Validate};
use serial_scan::{
    CliConfig, HttpRecognizer, LocalStorage, RecognitionInvoker, ScanConfig, ScanEngine,
    ScanTerminal, StillImageCamera,
};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting serial-scan");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 載入 TOML 配置並套用命令列覆蓋
    let mut config = match &cli.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => ScanConfig::default(),
    };
    if let Some(endpoint) = &cli.ocr_endpoint {
        config.recognition.endpoint = Some(endpoint.clone());
    }
    if let Some(path) = &cli.inventory {
        config.inventory.csv_path = Some(path.clone());
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(".".to_string());

    let catalog = match &config.inventory.csv_path {
        Some(path) => {
            let data = storage
                .read_file(path)
                .await
                .with_context(|| format!("failed to read inventory '{}'", path))?;
            InventoryCatalog::from_csv(&data)?
        }
        None => InventoryCatalog::fixtures(),
    };
    tracing::info!("📦 Inventory loaded: {} items", catalog.len());

    let endpoint = config.recognition_endpoint()?.clone();
    let recognizer = match config.recognition_timeout() {
        Some(timeout) => HttpRecognizer::with_timeout(endpoint, timeout)?,
        None => HttpRecognizer::new(endpoint),
    };
    let ocr_endpoint = recognizer.endpoint().to_string();
    let invoker = RecognitionInvoker::new(Arc::new(recognizer))
        .with_language(config.recognition.language.clone())
        .with_extractor(config.candidate_extractor()?);
    tracing::info!(
        "🔤 OCR endpoint: {} (language: {})",
        ocr_endpoint,
        invoker.language()
    );

    let camera_source = cli.camera_image.clone().unwrap_or_default();
    let mut terminal = ScanTerminal::new(Arc::new(StillImageCamera::new(camera_source)), catalog)
        .with_constraints(config.video_constraints())
        .with_frame_capture(FrameCapture::new(
            config.fallback_resolution(),
            config.capture.jpeg_quality,
        ))
        .with_upload_policy(config.upload_policy());
    terminal.select_category(cli.category.clone());

    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let mut engine =
        ScanEngine::new_with_monitoring(terminal, invoker, monitor_enabled).with_auto_accept(!cli.no_accept);

    let result = match &cli.image {
        Some(path) => {
            let file_name = Path::new(path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(path.as_str())
                .to_string();
            let bytes = storage
                .read_file(path)
                .await
                .with_context(|| format!("failed to read image '{}'", path))?;
            engine.scan_upload(&file_name, bytes).await
        }
        None => engine.scan_with_camera().await,
    };

    match result {
        Ok(report) => {
            print_report(&engine, &report.final_state, report.accepted.as_deref());
        }
        Err(e) => {
            tracing::error!(
                "❌ Scan failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_report(engine: &ScanEngine, state: &ScanState, accepted: Option<&str>) {
    match state {
        ScanState::ResultFound { candidates, .. } => {
            println!("✅ Serial number candidates:");
            for (i, candidate) in candidates.iter().enumerate() {
                let marker = if i == 0 { "*" } else { " " };
                println!("  {} {}", marker, candidate);
            }
        }
        ScanState::NoMatch { text } => {
            println!("⚠️ {}", NO_MATCH_MESSAGE);
            if !text.trim().is_empty() {
                println!("  Recognized text: {}", text.trim());
            }
        }
        ScanState::Failed(failure) => {
            eprintln!("❌ {}", failure.message);
        }
        other => {
            println!("Scan ended in state {}", other.name());
        }
    }

    let terminal = engine.terminal();
    if let Some(serial) = accepted {
        match terminal.catalog().find_by_serial(serial) {
            Some(item) => println!("🎯 Exact match: #{} {} @ {}", item.id, item.name, item.location),
            None => println!("⚠️ No item carries serial number '{}'", serial),
        }
        println!();
        println!(
            "📋 Inventory matching '{}' (category: {}):",
            serial,
            terminal.selected_category()
        );
        let items = terminal.filtered_items();
        if items.is_empty() {
            println!("  (no items)");
        }
        for item in items {
            println!(
                "  #{:<3} {:<28} {:<16} {:<14} {:<18} qty {:<3} {:?}",
                item.id,
                item.name,
                item.serial_number,
                item.category,
                item.location,
                item.quantity,
                item.status
            );
        }
    }
}
