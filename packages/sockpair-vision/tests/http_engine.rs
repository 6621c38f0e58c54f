//! HttpAnalysisEngine against a one-shot local HTTP listener

use std::time::Duration;

use sockpair_vision::{AnalysisEngine, AnalysisError, HttpAnalysisEngine, ImageData};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answers a single request with `status` and `body`; the handle yields the
/// raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/analyze-socks", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    (url, handle)
}

fn photo() -> ImageData {
    ImageData::from_bytes("image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0])
}

#[tokio::test]
async fn test_posts_data_uri_and_decodes_pairs() {
    let (url, server) = serve_once(
        "200 OK",
        r##"{"pairs":[{"title":"Black dress","confidence":"high","reasons":["black"],"tradeoffs":[],"box1":{"ymin":0,"xmin":0,"ymax":500,"xmax":400},"box2":{"ymin":0,"xmin":600,"ymax":500,"xmax":1000},"highlightColor":"#FF5733"}],"notes":["good light"]}"##,
    )
    .await;

    let engine = HttpAnalysisEngine::new(url, Duration::from_secs(5)).unwrap();
    let result = engine.analyze(&photo()).await.unwrap();
    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.pairs[0].highlight_color, "#FF5733");
    assert_eq!(result.notes, vec!["good light".to_string()]);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/analyze-socks"));
    assert!(request.contains(r#""base64Image":"data:image/jpeg;base64,/9j/4A==""#));
}

#[tokio::test]
async fn test_service_error_message_is_surfaced() {
    let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"Failed to analyze image"}"#).await;

    let engine = HttpAnalysisEngine::new(url, Duration::from_secs(5)).unwrap();
    let err = engine.analyze(&photo()).await.unwrap_err();
    assert_eq!(err, AnalysisError::Service("Failed to analyze image".into()));
    assert_eq!(err.to_string(), "Failed to analyze image");
    server.await.unwrap();
}

#[tokio::test]
async fn test_error_without_body_falls_back_to_status() {
    let (url, server) = serve_once("413 Payload Too Large", "").await;

    let engine = HttpAnalysisEngine::new(url, Duration::from_secs(5)).unwrap();
    let err = engine.analyze(&photo()).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 413");
    server.await.unwrap();
}
