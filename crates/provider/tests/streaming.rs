//! End-to-end streaming tests against a local SSE fixture.
//!
//! The fixture is a raw TCP listener rather than a mock-HTTP crate because
//! the interrupt test needs to hold the stream open mid-body and release
//! further lines only after the signal has been raised.

use ferrochat_core::interrupt::InterruptSignal;
use ferrochat_core::message::Message;
use ferrochat_core::notify::{Notification, NotificationBus};
use ferrochat_core::provider::Provider;
use ferrochat_core::error::ProviderError;
use ferrochat_provider::OpenAiProvider;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const RESPONSE_HEADER: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";

async fn read_request(socket: &mut TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
}

/// Serve exactly one request, streaming the given body lines.
async fn serve_lines(lines: &'static [&'static str]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(RESPONSE_HEADER).await.unwrap();
        for line in lines {
            socket.write_all(line.as_bytes()).await.unwrap();
            socket.write_all(b"\n\n").await.unwrap();
        }
        socket.flush().await.unwrap();
    });
    addr
}

fn provider_for(addr: SocketAddr) -> OpenAiProvider {
    OpenAiProvider::new(format!("http://{addr}"), "test-key", "test-model")
}

#[tokio::test]
async fn streams_a_text_response_end_to_end() {
    let addr = serve_lines(&[
        r#"data: {"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#,
        r#"data: {"choices":[{"delta":{"content":"Hello, "},"finish_reason":null}]}"#,
        r#"data: {"choices":[{"delta":{"content":"world"},"finish_reason":null}]}"#,
        r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        "data: [DONE]",
    ])
    .await;

    let provider = provider_for(addr);
    let signal = InterruptSignal::new();
    let bus = NotificationBus::new(64);
    let mut rx = bus.subscribe();

    let message = provider
        .get_message(&[Message::user("hi")], None, &signal, &bus)
        .await
        .unwrap();
    assert_eq!(message.content.as_deref(), Some("Hello, world"));
    assert!(message.tool_calls.is_empty());

    // Increments were published live, in arrival order.
    match rx.try_recv().unwrap() {
        Notification::TextResponse { message } => assert_eq!(message, "Hello, "),
        other => panic!("Unexpected notification: {other:?}"),
    }
    match rx.try_recv().unwrap() {
        Notification::TextResponse { message } => assert_eq!(message, "world"),
        other => panic!("Unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn reconstructs_tool_invocations_from_the_stream() {
    let addr = serve_lines(&[
        r#"data: {"choices":[{"delta":{"role":"assistant","tool_calls":[{"index":0,"id":"1","function":{"name":"calc","arguments":""}}]},"finish_reason":null}]}"#,
        r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"a\":2,"}}]},"finish_reason":null}]}"#,
        r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"b\":2,\"op\":\"add\"}"}}]},"finish_reason":null}]}"#,
        r#"data: {"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
        "data: [DONE]",
    ])
    .await;

    let provider = provider_for(addr);
    let signal = InterruptSignal::new();
    let bus = NotificationBus::new(64);

    let message = provider
        .get_message(&[Message::user("add 2+2")], None, &signal, &bus)
        .await
        .unwrap();
    assert!(message.content.is_none());
    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].id, "1");
    assert_eq!(message.tool_calls[0].name, "calc");
    assert_eq!(message.tool_calls[0].arguments, "{\"a\":2,\"b\":2,\"op\":\"add\"}");
}

#[tokio::test]
async fn junk_lines_mid_stream_are_skipped() {
    let addr = serve_lines(&[
        ": keep-alive",
        "event: ping",
        r#"data: {"unexpected":"shape"}"#,
        "data: {broken json",
        r#"data: {"choices":[{"delta":{"content":"ok"},"finish_reason":null}]}"#,
        "data: [DONE]",
    ])
    .await;

    let provider = provider_for(addr);
    let signal = InterruptSignal::new();
    let bus = NotificationBus::new(64);

    let message = provider
        .get_message(&[Message::user("hi")], None, &signal, &bus)
        .await
        .unwrap();
    assert_eq!(message.content.as_deref(), Some("ok"));
}

#[tokio::test]
async fn interrupt_between_lines_stops_processing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gate = Arc::new(tokio::sync::Notify::new());
    let server_gate = Arc::clone(&gate);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(RESPONSE_HEADER).await.unwrap();
        socket
            .write_all(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n")
            .await
            .unwrap();
        socket
            .write_all(b"data: {\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n")
            .await
            .unwrap();
        socket.flush().await.unwrap();

        // Hold the stream open until the test has raised the signal, then
        // send a line that must never be folded.
        server_gate.notified().await;
        socket
            .write_all(b"data: {\"choices\":[{\"delta\":{\"content\":\"IGNORED\"},\"finish_reason\":null}]}\n\n")
            .await
            .unwrap();
        socket.write_all(b"data: [DONE]\n\n").await.unwrap();
        socket.flush().await.unwrap();
    });

    let provider = provider_for(addr);
    let signal = InterruptSignal::new();
    let bus = NotificationBus::new(64);
    let mut rx = bus.subscribe();

    let transcript = [Message::user("hi")];
    let driver = provider.get_message(&transcript, None, &signal, &bus);

    let controller = async {
        // Both increments have been processed once their notifications land.
        for expected in ["Hel", "lo"] {
            match rx.recv().await.unwrap() {
                Notification::TextResponse { message } => assert_eq!(message, expected),
                other => panic!("Unexpected notification: {other:?}"),
            }
        }
        signal.raise();
        gate.notify_one();
    };

    let (result, ()) = tokio::join!(driver, controller);
    let message = result.unwrap();

    let content = message.content.as_deref().unwrap();
    assert!(content.contains("Streaming interrupted"));
    assert!(content.contains("Hello"));
    assert!(!content.contains("IGNORED"));
}

#[tokio::test]
async fn transport_failure_carries_status_and_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(
                b"HTTP/1.1 429 Too Many Requests\r\nContent-Type: application/json\r\nContent-Length: 26\r\nConnection: close\r\n\r\n{\"error\":\"rate_limited\"}\n\n",
            )
            .await
            .unwrap();
        socket.flush().await.unwrap();
    });

    let provider = provider_for(addr);
    let signal = InterruptSignal::new();
    let bus = NotificationBus::new(64);

    let err = provider
        .get_message(&[Message::user("hi")], None, &signal, &bus)
        .await
        .unwrap_err();
    match err {
        ProviderError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate_limited"));
        }
        other => panic!("Unexpected error: {other}"),
    }
}
