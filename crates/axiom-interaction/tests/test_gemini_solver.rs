//! Exercises `GeminiSolver` against a local one-shot HTTP responder.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axiom_core::error::AxiomError;
use axiom_core::solver::MathSolver;
use axiom_interaction::GeminiSolver;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

struct FakeGemini {
    base_url: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(String, Value)>>>,
}

/// Serves every connection with the same status and body.
async fn serve(status: u16, body: String) -> FakeGemini {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let last_request = Arc::new(Mutex::new(None));

    let hits_task = Arc::clone(&hits);
    let last_task = Arc::clone(&last_request);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            hits_task.fetch_add(1, Ordering::SeqCst);
            let (head, request_body) = read_request(&mut socket).await;
            let parsed: Value = serde_json::from_slice(&request_body).unwrap_or(Value::Null);
            *last_task.lock().await = Some((head, parsed));

            let response = format!(
                "HTTP/1.1 {status} TEST\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    FakeGemini {
        base_url: format!("http://{addr}/v1beta/models"),
        hits,
        last_request,
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> (String, Vec<u8>) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = find_header_end(&buffer) {
            let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let body_start = header_end + 4;
            while buffer.len() < body_start + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..n]);
            }
            return (head, buffer[body_start..].to_vec());
        }
    }
    (String::from_utf8_lossy(&buffer).to_string(), Vec::new())
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn solver_for(base_url: &str) -> GeminiSolver {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    GeminiSolver::new("test-key", "gemini-test")
        .with_client(client)
        .with_base_url(base_url)
}

fn candidate_with_text(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn quadratic_payload() -> String {
    json!({
        "domain": "Algebra",
        "problem": "Solve x^2 - 5x + 6 = 0",
        "assumptions": ["x is a real number"],
        "steps": [
            { "title": "Factor", "explanation": "Find numbers multiplying to 6 and adding to -5", "formula": "(x-2)(x-3)=0" },
            { "title": "Solve", "explanation": "Set each factor to zero" }
        ],
        "alternativeMethods": ["Quadratic formula"],
        "finalAnswer": "x = 2 or x = 3",
        "latexAnswer": "x = 2 \\quad \\text{or} \\quad x = 3"
    })
    .to_string()
}

#[tokio::test]
async fn test_successful_solve_parses_response() {
    let server = serve(200, candidate_with_text(&quadratic_payload())).await;
    let solver = solver_for(&server.base_url).with_thinking_budget(16_000);

    let response = solver.solve("Solve x^2 - 5x + 6 = 0").await.unwrap();

    assert_eq!(response.domain, "Algebra");
    assert_eq!(response.steps.len(), 2);
    assert_eq!(response.final_answer, "x = 2 or x = 3");
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);

    let (head, body) = server.last_request.lock().await.clone().unwrap();
    assert!(head.starts_with("POST /v1beta/models/gemini-test:generateContent"));
    assert!(head.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Solve x^2 - 5x + 6 = 0");
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn test_missing_final_answer_fails_without_retry() {
    let payload = json!({
        "domain": "Algebra",
        "problem": "p",
        "steps": [{ "title": "t", "explanation": "e" }],
        "latexAnswer": "x"
    })
    .to_string();
    let server = serve(200, candidate_with_text(&payload)).await;
    let solver = solver_for(&server.base_url);

    let err = solver.solve("p").await.unwrap_err();

    assert_eq!(err, AxiomError::schema("finalAnswer", "is missing"));
    assert_eq!(server.hits.load(Ordering::SeqCst), 1, "no retry expected");
}

#[tokio::test]
async fn test_http_error_is_reported_once() {
    let body = json!({
        "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
    })
    .to_string();
    let server = serve(503, body).await;
    let solver = solver_for(&server.base_url);

    let err = solver.solve("1 + 1").await.unwrap_err();

    assert_eq!(
        err,
        AxiomError::api("Gemini API error (503): UNAVAILABLE: The model is overloaded.")
    );
    assert_eq!(server.hits.load(Ordering::SeqCst), 1, "no retry expected");
}

#[tokio::test]
async fn test_empty_candidates_is_no_response() {
    let server = serve(200, json!({ "candidates": [] }).to_string()).await;
    let solver = solver_for(&server.base_url);

    let err = solver.solve("1 + 1").await.unwrap_err();
    assert_eq!(err, AxiomError::api("No response from engine."));
}

#[tokio::test]
async fn test_connection_refused_is_api_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let solver = solver_for(&format!("http://{addr}/v1beta/models"));

    let err = solver.solve("1 + 1").await.unwrap_err();
    assert!(matches!(err, AxiomError::Api(ref message) if message.starts_with("Gemini API request failed")));
    assert!(!err.to_string().contains("test-key"));
}
