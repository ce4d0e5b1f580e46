//! End-to-end download flow against a mock file-hosting service.
//!
//! The mock plays both the export endpoint and the link origin, so every
//! confirmation shape can be exercised without leaving localhost.

mod support;

use gget_core::download::progress::NoProgress;
use gget_core::{
    DownloadEngine, DownloadRequest, FailureKind, FetchError, RequestStage, ServiceEndpoints,
    SessionConfig,
};
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILE_ID: &str = "FILE123abc";

fn engine_for(server: &MockServer) -> DownloadEngine {
    let base = Url::parse(&server.uri()).expect("mock uri is a valid URL");
    DownloadEngine::with_endpoints(SessionConfig::default(), ServiceEndpoints::single_host(base))
        .expect("engine should build")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_probe(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("id", FILE_ID))
        .and(query_param("export", "download"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_direct_payload_uses_content_disposition_name() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let payload = b"small file served without confirmation".to_vec();
    mount_probe(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Content-Disposition", r#"attachment; filename="report.pdf""#)
            .set_body_raw(payload.clone(), "application/pdf"),
    )
    .await;

    let request = DownloadRequest::new(format!("https://drive.google.com/file/d/{FILE_ID}/view"))
        .with_output(temp_dir.path());
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("direct download should succeed");

    assert_eq!(outcome.path, temp_dir.path().join("report.pdf"));
    assert_eq!(outcome.target.strategy, "direct");
    assert_eq!(outcome.target.file_id, FILE_ID);
    assert_eq!(outcome.bytes_written, payload.len() as u64);
    assert_eq!(outcome.content_length, Some(payload.len() as u64));
    assert_eq!(std::fs::read(&outcome.path).unwrap(), payload);
    assert!(!temp_dir.path().join("report.pdf.part").exists());
}

#[tokio::test]
async fn test_form_confirmation_submits_hidden_inputs() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let page = format!(
        r#"<html><body>
<p class="uc-warning-subcaption">Google Drive can't scan this file for viruses.</p>
<form id="download-form" action="{uri}/download" method="get">
  <input type="submit" id="uc-download-link" value="Download anyway">
  <input type="hidden" name="id" value="{FILE_ID}">
  <input type="hidden" name="export" value="download">
  <input type="hidden" name="confirm" value="t">
  <input type="hidden" name="uuid" value="0f1e2d3c">
</form>
<a href="/uc?export=download&amp;confirm=WRONG&amp;id={FILE_ID}">fallback</a>
</body></html>"#,
        uri = server.uri()
    );
    mount_probe(&server, html(page)).await;

    Mock::given(method("GET"))
        .and(path("/download"))
        .and(query_param("id", FILE_ID))
        .and(query_param("confirm", "t"))
        .and(query_param("uuid", "0f1e2d3c"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"large payload".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path());
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("form confirmation should succeed");

    assert_eq!(outcome.target.strategy, "download-form");
    // "download" is an endpoint segment, not a name.
    assert_eq!(outcome.path, temp_dir.path().join(format!("gdrive_{FILE_ID}")));
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"large payload");
}

#[tokio::test]
async fn test_anchor_confirmation_resolves_relative_link() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let page = format!(
        r#"<html><body><a id="uc-download-link" href="/uc?export=download&amp;confirm=AbCd&amp;id={FILE_ID}">Download anyway</a></body></html>"#
    );
    mount_probe(&server, html(page)).await;

    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("confirm", "AbCd"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", r#"attachment; filename="video.mp4""#)
                .set_body_bytes(b"video bytes".to_vec()),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let destination = temp_dir.path().join("renamed.mp4");
    let request = DownloadRequest::new(FILE_ID).with_output(&destination);
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("anchor confirmation should succeed");

    assert_eq!(outcome.target.strategy, "anchor");
    assert_eq!(outcome.target.suggested_filename.as_deref(), Some("video.mp4"));
    assert_eq!(outcome.path, destination);
    assert_eq!(std::fs::read(&destination).unwrap(), b"video bytes");
}

#[tokio::test]
async fn test_inline_script_link_is_decoded() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let escaped_uri = server.uri().replace('/', "\\/");
    let page = format!(
        r#"<html><script>var _DRIVE_ivd = {{"downloadUrl":"{escaped_uri}\/payload?id={FILE_ID}&confirm=z9"}};</script></html>"#
    );
    mount_probe(&server, html(page)).await;

    Mock::given(method("GET"))
        .and(path("/payload"))
        .and(query_param("id", FILE_ID))
        .and(query_param("confirm", "z9"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"script payload".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path());
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("inline script link should succeed");

    assert_eq!(outcome.target.strategy, "inline-script");
    assert_eq!(outcome.path, temp_dir.path().join("payload"));
}

#[tokio::test]
async fn test_error_caption_is_negotiation_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let page = r#"<html><body><div class="uc-main"><p class="uc-error-caption">Sorry, you can't view or download this file at this time.</p><p class="uc-error-subcaption">Quota exceeded</p></div></body></html>"#;
    mount_probe(&server, html(page.to_string())).await;

    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path());
    let err = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect_err("service error should fail");

    assert_eq!(err.kind(), FailureKind::Negotiation);
    assert!(err.to_string().contains("Quota exceeded"), "got: {err}");
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_cookie_token_fallback_when_page_has_no_link() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_probe(
        &server,
        html("<html><body>Virus scan warning</body></html>".to_string())
            .insert_header("Set-Cookie", "download_warning_13058876669334088843=TOKEN42; Path=/"),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("confirm", "TOKEN42"))
        .and(query_param("id", FILE_ID))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"token payload".to_vec()))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path());
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("cookie token fallback should succeed");

    assert_eq!(outcome.target.strategy, "cookie-token");
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"token payload");
}

#[tokio::test]
async fn test_page_without_link_or_cookie_lists_tried_strategies() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_probe(&server, html("<html><body>nothing here</body></html>".to_string())).await;

    let err = engine_for(&server)
        .run_with_progress(&DownloadRequest::new(FILE_ID), &mut NoProgress)
        .await
        .expect_err("page without link should fail");

    assert_eq!(err.kind(), FailureKind::Negotiation);
    let message = err.to_string();
    assert!(message.contains("download-form"), "got: {message}");
    assert!(message.contains("anchor"), "got: {message}");
}

#[tokio::test]
async fn test_fetch_status_error_is_transport_at_fetch_stage() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let page = format!(
        r#"<form id="download-form" action="{uri}/gone"><input type="hidden" name="id" value="{FILE_ID}"></form>"#,
        uri = server.uri()
    );
    mount_probe(&server, html(page)).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path());
    let err = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect_err("404 on fetch should fail");

    assert!(
        matches!(
            err,
            FetchError::Transport {
                stage: RequestStage::Fetch,
                ..
            }
        ),
        "got: {err:?}"
    );
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_probe_status_error_is_transport_at_probe_stage() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_probe(&server, ResponseTemplate::new(500)).await;

    let err = engine_for(&server)
        .run_with_progress(&DownloadRequest::new(FILE_ID), &mut NoProgress)
        .await
        .expect_err("500 on probe should fail");

    assert!(
        matches!(
            err,
            FetchError::Transport {
                stage: RequestStage::Probe,
                ..
            }
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_unrecognized_input_sends_no_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = engine_for(&server)
        .run_with_progress(
            &DownloadRequest::new("https://example.com/some/page"),
            &mut NoProgress,
        )
        .await
        .expect_err("unrecognized input should fail");

    assert_eq!(err.kind(), FailureKind::Input);
}

#[tokio::test]
async fn test_configured_cookie_is_sent_on_probe() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("id", FILE_ID))
        .and(wiremock::matchers::header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"with cookie".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let engine = DownloadEngine::with_endpoints(
        SessionConfig::default().with_cookie("session", "abc"),
        ServiceEndpoints::single_host(base),
    )
    .unwrap();
    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path().join("out.bin"));
    let outcome = engine
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("download with cookie should succeed");
    assert_eq!(std::fs::read(outcome.path).unwrap(), b"with cookie");
}

#[tokio::test]
async fn test_cookie_token_read_from_redirected_probe_host() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let port = Url::parse(&server.uri()).unwrap().port().unwrap();
    // The export endpoint hands off to another host, which sets the token.
    mount_probe(
        &server,
        ResponseTemplate::new(302)
            .insert_header("Location", format!("http://localhost:{port}/landing")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(
            html("<html><body>Virus scan warning</body></html>".to_string())
                .insert_header("Set-Cookie", "download_warning_1=TOK; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("confirm", "TOK"))
        .and(query_param("id", FILE_ID))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"redirected payload".to_vec()))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let request = DownloadRequest::new(FILE_ID).with_output(temp_dir.path());
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("token from the redirected host should be used");

    assert_eq!(outcome.target.strategy, "cookie-token");
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"redirected payload");
}

#[tokio::test]
async fn test_output_with_trailing_separator_creates_directory() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_probe(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Content-Disposition", r#"attachment; filename="notes.txt""#)
            .set_body_raw(b"notes".to_vec(), "text/plain"),
    )
    .await;

    let output = format!("{}/newdir/", temp_dir.path().display());
    let request = DownloadRequest::new(FILE_ID).with_output(output);
    let outcome = engine_for(&server)
        .run_with_progress(&request, &mut NoProgress)
        .await
        .expect("download into a new directory should succeed");

    assert_eq!(outcome.path, temp_dir.path().join("newdir").join("notes.txt"));
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"notes");
}
