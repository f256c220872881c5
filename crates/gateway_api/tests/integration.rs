use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use chat_model::{ChatTurn, Role};
use gateway_api::{GatewayApiClient, GatewayApiConfig, GatewayApiError, GENERIC_FAILURE_MESSAGE};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

#[derive(Clone)]
struct ResponseChunk {
    delay_ms: u64,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct ScriptedResponse {
    status: u16,
    content_type: &'static str,
    chunks: Vec<ResponseChunk>,
}

#[derive(Debug, Clone)]
struct RecordedRequest {
    request_line: String,
    body: Vec<u8>,
}

impl RecordedRequest {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

struct ScriptedServer {
    base_url: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);
            let requests = Arc::clone(&requests);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    let requests = Arc::clone(&requests);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count, requests).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            requests,
            handle,
        }
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn client(&self) -> GatewayApiClient {
        GatewayApiClient::new(GatewayApiConfig::new(&self.base_url)).expect("client")
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn response_json(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse {
        status,
        content_type: "application/json",
        chunks: vec![ResponseChunk {
            delay_ms: 0,
            bytes: body.as_bytes().to_vec(),
        }],
    }
}

fn response_text_chunks(chunks: Vec<Vec<u8>>) -> ScriptedResponse {
    ScriptedResponse {
        status: 200,
        content_type: "text/plain; charset=utf-8",
        chunks: chunks
            .into_iter()
            .map(|bytes| ResponseChunk { delay_ms: 5, bytes })
            .collect(),
    }
}

fn hello() -> Vec<ChatTurn> {
    vec![ChatTurn::user("Hello")]
}

#[tokio::test]
async fn complete_posts_conversation_and_returns_content() {
    let server = ScriptedServer::new(vec![response_json(200, r#"{"content":"Hi there!"}"#)]).await;

    let reply = server.client().complete(&hello()).await.expect("reply");

    assert_eq!(reply, "Hi there!");
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("POST /api/agent "));
    assert_eq!(
        requests[0].json(),
        json!({
            "messages": [{"role": "user", "content": "Hello"}],
            "provider": "groq",
            "temperature": 0.14,
            "maxTokens": 2048
        })
    );
    server.shutdown();
}

#[tokio::test]
async fn error_status_surfaces_upstream_message_without_retry() {
    let server = ScriptedServer::new(vec![
        response_json(500, r#"{"error":{"message":"rate limited"}}"#),
        response_json(200, r#"{"content":"should not be reached"}"#),
    ])
    .await;

    let error = server
        .client()
        .complete(&hello())
        .await
        .expect_err("500 should fail");

    match error {
        GatewayApiError::Status(status, message) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn error_status_without_json_uses_generic_message() {
    let server = ScriptedServer::new(vec![ScriptedResponse {
        status: 502,
        content_type: "text/html",
        chunks: vec![ResponseChunk {
            delay_ms: 0,
            bytes: b"<html>bad gateway</html>".to_vec(),
        }],
    }])
    .await;

    let error = server
        .client()
        .complete(&hello())
        .await
        .expect_err("502 should fail");

    assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
    server.shutdown();
}

#[tokio::test]
async fn success_body_without_content_is_a_decode_error() {
    let server = ScriptedServer::new(vec![response_json(200, r#"{"reply":"wrong"}"#)]).await;

    let error = server
        .client()
        .complete(&hello())
        .await
        .expect_err("missing content should fail");

    assert!(matches!(error, GatewayApiError::Serde(_)));
    server.shutdown();
}

#[tokio::test]
async fn stream_reassembles_multibyte_text_split_across_chunks() {
    let text = "Héllo 🚀 world";
    let bytes = text.as_bytes();
    // Split inside both the two-byte and the four-byte sequences.
    let chunks = vec![
        bytes[..2].to_vec(),
        bytes[2..9].to_vec(),
        bytes[9..].to_vec(),
    ];
    let server = ScriptedServer::new(vec![response_text_chunks(chunks)]).await;

    let mut seen = Vec::new();
    let reply = server
        .client()
        .stream_with_handler(&hello(), |chunk| seen.push(chunk.to_owned()))
        .await
        .expect("stream");

    assert_eq!(reply, text);
    assert_eq!(seen.concat(), text);
    assert!(seen.iter().all(|chunk| !chunk.is_empty()));
    assert!(server.requests()[0]
        .request_line
        .starts_with("POST /api/agent/stream "));
    server.shutdown();
}

#[tokio::test]
async fn stream_error_status_is_terminal() {
    let server = ScriptedServer::new(vec![response_json(
        503,
        r#"{"error":{"message":"upstream unavailable"}}"#,
    )])
    .await;

    let mut called = false;
    let error = server
        .client()
        .stream_with_handler(&hello(), |_| called = true)
        .await
        .expect_err("503 should fail");

    assert_eq!(error.user_message(), "upstream unavailable");
    assert!(!called);
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn list_models_queries_provider() {
    let server = ScriptedServer::new(vec![response_json(
        200,
        r#"["compound-beta","llama3-8b"]"#,
    )])
    .await;

    let models = server
        .client()
        .list_models("groq")
        .await
        .expect("models");

    assert_eq!(models, vec!["compound-beta", "llama3-8b"]);
    assert!(server.requests()[0]
        .request_line
        .starts_with("GET /api/models?provider=groq "));
    server.shutdown();
}

#[tokio::test]
async fn list_models_bad_request_surfaces_message() {
    let server = ScriptedServer::new(vec![response_json(
        400,
        r#"{"error":{"message":"Provider parameter is required"}}"#,
    )])
    .await;

    let error = server
        .client()
        .list_models("")
        .await
        .expect_err("400 should fail");

    assert_eq!(error.user_message(), "Provider parameter is required");
    server.shutdown();
}

#[tokio::test]
async fn empty_conversation_never_reaches_the_network() {
    let server = ScriptedServer::new(Vec::new()).await;

    let error = server
        .client()
        .complete(&[])
        .await
        .expect_err("empty conversation should fail");

    assert!(matches!(error, GatewayApiError::EmptyConversation));
    assert_eq!(server.request_count(), 0);
    server.shutdown();
}

#[tokio::test]
async fn base_url_with_api_suffix_hits_same_route() {
    let server = ScriptedServer::new(vec![response_json(200, r#"{"content":"ok"}"#)]).await;
    let client = GatewayApiClient::new(GatewayApiConfig::new(format!("{}/api/", server.base_url)))
        .expect("client");

    let reply = client
        .complete(&[ChatTurn::new(Role::System, "be brief"), ChatTurn::user("hi")])
        .await
        .expect("reply");

    assert_eq!(reply, "ok");
    assert!(server.requests()[0]
        .request_line
        .starts_with("POST /api/agent "));
    server.shutdown();
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Ok(recorded) = read_request(&mut socket).await else {
        return;
    };
    requests.lock().expect("requests lock").push(recorded);

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| response_json(500, r#"{"error":{"message":"unexpected request"}}"#));

    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        response.status,
        status_reason(response.status),
        response.content_type,
    );
    if socket.write_all(headers.as_bytes()).await.is_err() {
        return;
    }

    for chunk in response.chunks {
        if chunk.delay_ms > 0 {
            sleep(Duration::from_millis(chunk.delay_ms)).await;
        }
        let prefix = format!("{:X}\r\n", chunk.bytes.len());
        if socket.write_all(prefix.as_bytes()).await.is_err() {
            return;
        }
        if socket.write_all(&chunk.bytes).await.is_err() {
            return;
        }
        if socket.write_all(b"\r\n").await.is_err() {
            return;
        }
        let _ = socket.flush().await;
    }

    let _ = socket.write_all(b"0\r\n\r\n").await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<RecordedRequest> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 2048];

    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        request.extend_from_slice(&buffer[..n]);
        if let Some(position) = request.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&request[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = request[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buffer[..n]);
    }

    Ok(RecordedRequest {
        request_line: head.lines().next().unwrap_or_default().to_owned(),
        body,
    })
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
