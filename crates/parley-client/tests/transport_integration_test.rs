//! WebSocket transport against a loopback relay.
//!
//! The relay echoes text frames prefixed with the sender's path and closes
//! with 1008 when the token query parameter is `bad`. A second relay refuses
//! every handshake with a fixed HTTP status.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parley_client::{
    ConnectionId, TransportEvent, TransportEventKind,
    transport::{Transport, TransportError},
};
use tokio::{net::TcpListener, time::timeout};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

async fn start_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut uri = String::new();
                let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    uri = req.uri().to_string();
                    Ok(resp)
                };
                let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
                    return;
                };

                if uri.ends_with("token=bad") {
                    let _ = ws
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Policy,
                            reason: "invalid token".into(),
                        })))
                        .await;
                    return;
                }

                while let Some(Ok(msg)) = ws.next().await {
                    match msg {
                        Message::Text(text) => {
                            let reply = format!("{}: {}", uri, text.as_str());
                            if ws.send(Message::text(reply)).await.is_err() {
                                return;
                            }
                        },
                        Message::Close(_) => return,
                        _ => {},
                    }
                }
            });
        }
    });

    format!("ws://{addr}")
}

async fn start_refusing_relay(status: StatusCode) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let callback = |_: &Request, _: Response| -> Result<Response, ErrorResponse> {
                    let mut refusal = ErrorResponse::new(None);
                    *refusal.status_mut() = status;
                    Err(refusal)
                };
                let _ = accept_hdr_async(stream, callback).await;
            });
        }
    });

    format!("ws://{addr}")
}

async fn next(transport: &mut Transport) -> TransportEvent {
    timeout(Duration::from_secs(5), transport.next_event())
        .await
        .expect("timed out waiting for transport event")
        .expect("event channel closed")
}

#[tokio::test]
async fn dial_transmit_and_receive() {
    let base = start_relay().await;
    let mut transport = Transport::new();
    let id = ConnectionId::new(1);

    transport.dial(id, &format!("{base}/ws/lobby/alice?token=T1"));
    assert_eq!(next(&mut transport).await, TransportEvent::opened(id));

    transport.transmit(id, "hello".to_string()).unwrap();
    transport.transmit(id, "world".to_string()).unwrap();

    assert_eq!(
        next(&mut transport).await,
        TransportEvent::frame(id, "/ws/lobby/alice?token=T1: hello")
    );
    assert_eq!(
        next(&mut transport).await,
        TransportEvent::frame(id, "/ws/lobby/alice?token=T1: world")
    );

    transport.hang_up(id);
    assert_eq!(transport.link_count(), 0);
    assert_eq!(transport.transmit(id, "late".to_string()), Err(TransportError::Unknown(id)));
}

#[tokio::test]
async fn rejected_token_reports_policy_close() {
    let base = start_relay().await;
    let mut transport = Transport::new();
    let id = ConnectionId::new(7);

    transport.dial(id, &format!("{base}/ws/lobby/alice?token=bad"));
    assert_eq!(next(&mut transport).await, TransportEvent::opened(id));

    let event = next(&mut transport).await;
    match event.kind {
        TransportEventKind::Closed(Some(reason)) => {
            assert_eq!(reason.code, 1008);
            assert_eq!(reason.reason, "invalid token");
            assert!(!reason.is_clean());
        },
        other => panic!("expected policy close, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_relay_fails() {
    // Bind and drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut transport = Transport::new();
    let id = ConnectionId::new(3);
    transport.dial(id, &format!("ws://{addr}/ws/lobby/alice"));

    let event = next(&mut transport).await;
    assert_eq!(event.id, id);
    assert!(matches!(event.kind, TransportEventKind::Failed(_)));
    assert_eq!(transport.link_count(), 0);
}

#[tokio::test]
async fn remote_close_releases_link() {
    let base = start_relay().await;
    let mut transport = Transport::new();

    for raw in 1..=5 {
        let id = ConnectionId::new(raw);
        transport.dial(id, &format!("{base}/ws/lobby/alice?token=bad"));
        assert_eq!(next(&mut transport).await, TransportEvent::opened(id));

        let event = next(&mut transport).await;
        assert!(matches!(event.kind, TransportEventKind::Closed(Some(_))));
    }

    assert_eq!(transport.link_count(), 0);
    assert_eq!(
        transport.transmit(ConnectionId::new(5), "late".to_string()),
        Err(TransportError::Unknown(ConnectionId::new(5)))
    );
}

#[tokio::test]
async fn forbidden_handshake_is_policy_close() {
    let base = start_refusing_relay(StatusCode::FORBIDDEN).await;
    let mut transport = Transport::new();
    let id = ConnectionId::new(1);

    transport.dial(id, &format!("{base}/ws/lobby/alice?token=expired"));

    let event = next(&mut transport).await;
    assert_eq!(event.id, id);
    match event.kind {
        TransportEventKind::Closed(Some(reason)) => {
            assert_eq!(reason.code, 1008);
            assert!(reason.reason.contains("403"));
        },
        other => panic!("expected policy close, got {other:?}"),
    }
    assert_eq!(transport.link_count(), 0);
}

#[tokio::test]
async fn failing_handshake_is_failure() {
    let base = start_refusing_relay(StatusCode::INTERNAL_SERVER_ERROR).await;
    let mut transport = Transport::new();
    let id = ConnectionId::new(1);

    transport.dial(id, &format!("{base}/ws/lobby/alice?token=T1"));

    let event = next(&mut transport).await;
    match event.kind {
        TransportEventKind::Failed(detail) => assert!(detail.contains("500")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(transport.link_count(), 0);
}

#[tokio::test]
async fn hang_up_is_idempotent() {
    let base = start_relay().await;
    let mut transport = Transport::new();
    let id = ConnectionId::new(1);

    transport.dial(id, &format!("{base}/ws/lobby/alice?token=T1"));
    assert_eq!(next(&mut transport).await, TransportEvent::opened(id));

    transport.hang_up(id);
    transport.hang_up(id);
    transport.hang_up(ConnectionId::new(99));
    assert_eq!(transport.link_count(), 0);
}

#[tokio::test]
async fn events_carry_their_connection_id() {
    let base = start_relay().await;
    let mut transport = Transport::new();
    let first = ConnectionId::new(1);
    let second = ConnectionId::new(2);

    transport.dial(first, &format!("{base}/ws/a/alice?token=T1"));
    assert_eq!(next(&mut transport).await, TransportEvent::opened(first));
    transport.dial(second, &format!("{base}/ws/b/alice?token=T1"));
    assert_eq!(next(&mut transport).await, TransportEvent::opened(second));

    transport.transmit(second, "hi".to_string()).unwrap();
    let event = next(&mut transport).await;
    assert_eq!(event, TransportEvent::frame(second, "/ws/b/alice?token=T1: hi"));

    transport.stop();
}
