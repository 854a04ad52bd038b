//! Edit session with a scripted editor
//!
//! The "editor" is a small shell script run through `sh`, so the tests only
//! need a POSIX shell with fractional `sleep`.

#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use pastila::output::SharedBuffer;
use pastila::{
    EditSession, EditorConfig, InsertRow, Output, Paste, PasteService, PastilaError,
    ServiceConfig,
};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use wiremock::matchers::{body_string_contains, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_ID: &str = "X-ClickHouse-Query-Id";
const ORIGINAL_HASH: &str = "620234bcb081dcff3cfdf3c3c2806062";
const ORIGINAL_URL: &str = "https://pastila.nl/?c055a950/620234bcb081dcff3cfdf3c3c2806062";

fn service_for(server: &MockServer) -> PasteService {
    PasteService::new(&ServiceConfig {
        service_url: "http://mylocal.pastila.nl/".to_string(),
        clickhouse_url: format!("{}/?user=default", server.uri()),
        ..Default::default()
    })
    .unwrap()
}

fn editor_script(dir: &Path, body: &str) -> EditorConfig {
    let script = dir.join("editor.sh");
    std::fs::write(&script, body).unwrap();

    EditorConfig {
        program: "sh".to_string(),
        args: vec![script.to_string_lossy().into_owned()],
        poll_interval: Duration::from_millis(10),
        quick_exit_threshold: Duration::ZERO,
    }
}

async fn original_paste(server: &MockServer, service: &PasteService) -> Paste {
    Mock::given(method("POST"))
        .and(query_param("param_hashHex", ORIGINAL_HASH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(QUERY_ID, "q-select")
                .set_body_string("{\"is_encrypted\":false,\"content\":\"original\"}\n"),
        )
        .mount(server)
        .await;

    service.read(ORIGINAL_URL).await.unwrap()
}

async fn inserted_rows(server: &MockServer) -> Vec<InsertRow> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| !r.body.is_empty())
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_single_rewrite_is_saved_and_chained() {
    let server = MockServer::start().await;
    let service = service_for(&server);
    let original = original_paste(&server, &service).await;

    Mock::given(method("POST"))
        .and(body_string_contains("rewritten content"))
        .respond_with(ResponseTemplate::new(200).insert_header(QUERY_ID, "q-save"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let editor = editor_script(
        dir.path(),
        "sleep 0.3\nprintf 'rewritten content' > \"$1\"\nsleep 1\n",
    );

    let target = SharedBuffer::new();
    let output = Output::new(target.clone());
    let session = EditSession::new(service, output.clone(), editor);

    let edited = session.run(original.clone()).await.unwrap();

    assert_eq!(edited.content(), b"rewritten content");
    assert_eq!(edited.request_id, "q-save");
    assert_eq!(edited.previous, Some(original.link()));
    assert!(!output.is_buffering());

    let rows = inserted_rows(&server).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].prev_hash_hex, ORIGINAL_HASH);
    assert_eq!(rows[0].prev_fingerprint_hex, "c055a950");

    // The new URL was held back while editing and replayed afterwards
    assert!(target.contents().contains(&edited.url()));
}

#[tokio::test]
async fn test_untouched_file_returns_original() {
    let server = MockServer::start().await;
    let service = service_for(&server);
    let original = original_paste(&server, &service).await;

    let dir = TempDir::new().unwrap();
    let editor = editor_script(dir.path(), "sleep 0.2\n");

    let session = EditSession::new(service, Output::new(SharedBuffer::new()), editor);
    let edited = session.run(original.clone()).await.unwrap();

    assert_eq!(edited.url(), original.url());
    assert_eq!(edited.content(), b"original");
    assert!(inserted_rows(&server).await.is_empty());
}

#[tokio::test]
async fn test_failed_save_does_not_end_session() {
    let server = MockServer::start().await;
    let service = service_for(&server);
    let original = original_paste(&server, &service).await;

    Mock::given(method("POST"))
        .and(body_string_contains("hash_hex"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header(QUERY_ID, "q-fail")
                .set_body_string("Code: 241. DB::Exception: Memory limit exceeded"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let editor = editor_script(
        dir.path(),
        "sleep 0.2\nprintf 'first try' > \"$1\"\nsleep 0.5\nprintf 'second attempt' > \"$1\"\nsleep 0.5\n",
    );

    let target = SharedBuffer::new();
    let session = EditSession::new(service, Output::new(target.clone()), editor);
    let edited = session.run(original.clone()).await.unwrap();

    assert_eq!(edited.url(), original.url());
    assert_eq!(inserted_rows(&server).await.len(), 2);
    assert!(target.contents().contains("unexpected status code: 500"));
}

#[tokio::test]
async fn test_quick_exit_waits_for_key_press() {
    let server = MockServer::start().await;
    let service = service_for(&server);
    let original = original_paste(&server, &service).await;

    Mock::given(method("POST"))
        .and(body_string_contains("quick edit"))
        .respond_with(ResponseTemplate::new(200).insert_header(QUERY_ID, "q-quick"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let recorded = dir.path().join("edited-path");
    let mut editor = editor_script(
        dir.path(),
        &format!(
            "printf '%s' \"$1\" > '{}'\nprintf 'quick edit' > \"$1\"\n",
            recorded.display()
        ),
    );
    editor.quick_exit_threshold = Duration::from_secs(30);

    let target = SharedBuffer::new();
    let output = Output::new(target.clone());
    let (mut keyboard, key_press) = tokio::io::duplex(8);
    let session = EditSession::new(service, output.clone(), editor).with_key_press(key_press);

    let original_url = original.url();
    let running = tokio::spawn(async move { session.run(original).await });

    // Editor is gone, the save lands, and the session still holds on
    let mut saved = false;
    for _ in 0..300 {
        if !inserted_rows(&server).await.is_empty() && target.contents().contains("too quickly") {
            saved = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(saved);
    assert!(!running.is_finished());
    assert!(output.is_buffering());
    assert!(!target.contents().contains("http://mylocal.pastila.nl/"));

    keyboard.write_all(b"\n").await.unwrap();
    let edited = running.await.unwrap().unwrap();

    assert_ne!(edited.url(), original_url);
    assert_eq!(edited.content(), b"quick edit");
    assert!(!output.is_buffering());

    let contents = target.contents();
    let prompt_at = contents.find("too quickly").unwrap();
    let url_at = contents.find(&edited.url()).unwrap();
    assert!(prompt_at < url_at);

    // Temporary file is removed on teardown
    let edited_path = std::fs::read_to_string(&recorded).unwrap();
    assert!(!Path::new(&edited_path).exists());
}

#[tokio::test]
async fn test_missing_editor_is_fatal() {
    let server = MockServer::start().await;
    let service = service_for(&server);
    let original = original_paste(&server, &service).await;

    let editor = EditorConfig {
        program: "/nonexistent/pastila-editor".to_string(),
        ..EditorConfig::default()
    };
    let session = EditSession::new(service, Output::new(SharedBuffer::new()), editor);

    let err = session.run(original).await.unwrap_err();
    assert!(matches!(err, PastilaError::Editor { .. }));
}
