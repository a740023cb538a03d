use httpmock::prelude::*;
use serial_scan::core::session::ScanState;
use serial_scan::core::Storage;
use serial_scan::{
    HttpRecognizer, InventoryCatalog, LocalStorage, RecognitionInvoker, ScanConfig, ScanEngine,
    ScanTerminal, StillImageCamera,
};
use std::sync::Arc;
use tempfile::TempDir;

fn write_label_png(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    image::RgbImage::from_pixel(64, 36, image::Rgb([240, 240, 240]))
        .save(&path)
        .unwrap();
    path
}

#[tokio::test]
async fn test_end_to_end_camera_scan_with_http_engine() {
    let temp_dir = TempDir::new().unwrap();
    let frame_path = write_label_png(&temp_dir, "frame.png");

    let server = MockServer::start();
    let ocr_mock = server.mock(|when, then| {
        when.method(POST).path("/ocr").query_param("lang", "eng");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "text": "Cisco Catalyst\nS/N CISCO-2960-005\nCISCO-2960-005"
            }));
    });

    let terminal = ScanTerminal::new(
        Arc::new(StillImageCamera::new(&frame_path)),
        InventoryCatalog::fixtures(),
    );
    let invoker = RecognitionInvoker::new(Arc::new(HttpRecognizer::new(server.url("/ocr"))));
    let mut engine = ScanEngine::new(terminal, invoker);

    let report = engine.scan_with_camera().await.unwrap();

    ocr_mock.assert();
    assert_eq!(
        report.final_state,
        ScanState::ResultFound {
            text: "Cisco Catalyst\nS/N CISCO-2960-005\nCISCO-2960-005".to_string(),
            candidates: vec!["CISCO-2960-005".to_string()],
        }
    );
    assert_eq!(report.accepted.as_deref(), Some("CISCO-2960-005"));

    let terminal = engine.terminal();
    assert!(!terminal.is_dialog_open());
    let items = terminal.filtered_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Cisco Catalyst 2960");
}

#[tokio::test]
async fn test_engine_outage_is_recoverable_failure() {
    let temp_dir = TempDir::new().unwrap();
    let frame_path = write_label_png(&temp_dir, "frame.png");

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/ocr");
        then.status(500);
    });

    let terminal = ScanTerminal::new(
        Arc::new(StillImageCamera::new(&frame_path)),
        InventoryCatalog::fixtures(),
    );
    let invoker = RecognitionInvoker::new(Arc::new(HttpRecognizer::new(server.url("/ocr"))));
    let mut engine = ScanEngine::new(terminal, invoker);

    let report = engine.scan_with_camera().await.unwrap();
    match &report.final_state {
        ScanState::Failed(failure) => {
            assert!(failure.message.contains("clearer image"));
        }
        other => panic!("expected failure, got {:?}", other),
    }

    let session = engine.terminal().session().unwrap();
    assert!(!session.processing());
    assert!(!session.camera_active());
    assert_eq!(engine.terminal().search_query(), "");

    // "Scan Again" brings the camera back
    engine.terminal_mut().scan_again().await.unwrap();
    assert!(engine.terminal().session().unwrap().camera_active());
    engine.terminal_mut().close_dialog();
}

#[tokio::test]
async fn test_upload_scan_from_local_storage() {
    let temp_dir = TempDir::new().unwrap();
    write_label_png(&temp_dir, "label.png");

    let server = MockServer::start();
    let ocr_mock = server.mock(|when, then| {
        when.method(POST).path("/ocr");
        then.status(200)
            .json_body(serde_json::json!({"text": "HP-M404-003 CISCO-2960-005"}));
    });

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let bytes = storage.read_file("label.png").await.unwrap();

    let terminal = ScanTerminal::new(
        Arc::new(StillImageCamera::new(temp_dir.path().join("unused.png"))),
        InventoryCatalog::fixtures(),
    );
    let invoker = RecognitionInvoker::new(Arc::new(HttpRecognizer::new(server.url("/ocr"))));
    let mut engine = ScanEngine::new(terminal, invoker).with_auto_accept(false);

    let report = engine.scan_upload("label.png", bytes).await.unwrap();

    ocr_mock.assert();
    let session = engine.terminal().session().unwrap();
    assert_eq!(session.candidates(), ["HP-M404-003", "CISCO-2960-005"]);
    assert_eq!(session.primary_candidate(), Some("HP-M404-003"));
    assert_eq!(report.accepted, None);

    let accepted = engine.terminal_mut().use_candidate().unwrap();
    assert_eq!(accepted, "HP-M404-003");
    assert_eq!(engine.terminal().filtered_items()[0].location, "Admin Office");
}

#[tokio::test]
async fn test_oversized_upload_never_reaches_engine() {
    let server = MockServer::start();
    let ocr_mock = server.mock(|when, then| {
        when.method(POST).path("/ocr");
        then.status(200).json_body(serde_json::json!({"text": "unused"}));
    });

    let config = ScanConfig::from_toml_str(
        r#"
[upload]
max_size_mb = 1
"#,
    )
    .unwrap();

    let terminal = ScanTerminal::new(
        Arc::new(StillImageCamera::new("/nonexistent.png")),
        InventoryCatalog::fixtures(),
    )
    .with_upload_policy(config.upload_policy());
    let invoker = RecognitionInvoker::new(Arc::new(HttpRecognizer::new(server.url("/ocr"))));
    let mut engine = ScanEngine::new(terminal, invoker);

    let report = engine
        .scan_upload("huge.jpg", vec![0u8; 1024 * 1024 + 1])
        .await
        .unwrap();

    ocr_mock.assert_hits(0);
    assert!(report.final_state.is_failed());
}

#[tokio::test]
async fn test_inventory_csv_drives_search() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("inventory.csv");
    std::fs::write(
        &csv_path,
        "id,name,serial_number,category,location,quantity,status\n\
         1,Lab Microscope,MIC-4400-101,Lab,Bio Lab 2,4,Good\n\
         2,Fume Hood,FUME-0020-007,Lab,Chem Lab 1,1,Maintenance\n",
    )
    .unwrap();

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let data = storage.read_file("inventory.csv").await.unwrap();
    let catalog = InventoryCatalog::from_csv(&data).unwrap();

    let mut terminal = ScanTerminal::new(
        Arc::new(StillImageCamera::new("/nonexistent.png")),
        catalog,
    );
    terminal.set_search_query("fume-0020");
    let items = terminal.filtered_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].location, "Chem Lab 1");

    terminal.select_category("Printer");
    assert!(terminal.filtered_items().is_empty());
}
