//! `HttpGateway` against a one-shot local HTTP responder.

use livecanvas_workspace::{
    open_page, CodeEditRequest, GatewayError, GenerationService, HttpGateway, PersistenceGateway,
    StaticSessionStore,
};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Serve one request with `status` and `body`; the task yields the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });
    (format!("http://{}/api/", addr), task)
}

fn gateway(base_url: String) -> HttpGateway {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpGateway::with_client(client, base_url, Arc::new(StaticSessionStore::new("tok-123")))
}

#[tokio::test]
async fn test_open_page_sends_bearer_token() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"componentSource":"<h1>{data.title}</h1>","dataContext":"{\"title\":\"Hi\"}","componentId":"c-1","slideId":"s-1"}"#,
    )
    .await;
    let gateway = gateway(url);

    let page = open_page(&gateway, "p-42").await.unwrap();
    assert_eq!(page.id, "p-42");
    assert_eq!(page.source, "<h1>{data.title}</h1>");
    assert_eq!(page.data, json!({ "title": "Hi" }));
    assert_eq!(page.component_id.as_deref(), Some("c-1"));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/pages/p-42 HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer tok-123"));
}

#[tokio::test]
async fn test_save_code_goes_in_query() {
    let (url, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
    gateway(url).save_code("c-1", "<p>a</p>").await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PATCH /api/components/c-1/code?modified_code="));
    assert!(request.contains("%3Cp%3Ea%3C%2Fp%3E"));
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let (url, server) = serve_once("500 Internal Server Error", r#"{"detail":"db down"}"#).await;
    let err = gateway(url)
        .save_data("c-1", &json!({ "title": "x" }))
        .await
        .unwrap_err();

    match err {
        GatewayError::Status { status, path, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(path, "/components/c-1/data");
            assert!(body.contains("db down"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(server.await.unwrap().contains("prop_data_type="));
}

#[tokio::test]
async fn test_code_generation_body() {
    let (url, server) =
        serve_once("200 OK", r#"{"modified_code":"<h2/>","summary":"Swapped heading"}"#).await;
    let reply = gateway(url)
        .edit_code(CodeEditRequest {
            component_id: "c-1".into(),
            current_source: "<h1/>".into(),
            natural_language_request: "use h2".into(),
            attachment: None,
            preserve_functionality: true,
        })
        .await
        .unwrap();
    assert_eq!(reply.modified_source, "<h2/>");
    assert_eq!(reply.summary, "Swapped heading");

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /api/components/c-1/code HTTP/1.1"));
    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(body).unwrap(),
        json!({ "user_request": "use h2", "preserve_functionality": true })
    );
}
