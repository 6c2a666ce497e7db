use super::envelope::OutboundMessage;
use super::*;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;

async fn bind_collector() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

fn session(url: &str, delay_ms: u64) -> (TransportSession, broadcast::Receiver<MotioncastEvent>) {
    let events = EventBus::new(100);
    let receiver = events.subscribe();
    let session = TransportSession::new(url.to_string(), Duration::from_millis(delay_ms), events);
    (session, receiver)
}

async fn next_event_matching<F>(
    receiver: &mut broadcast::Receiver<MotioncastEvent>,
    matches: F,
) -> MotioncastEvent
where
    F: Fn(&MotioncastEvent) -> bool,
{
    loop {
        let event = timeout(Duration::from_secs(3), receiver.recv())
            .await
            .expect("Timed out waiting for event")
            .expect("Event bus closed");
        if matches(&event) {
            return event;
        }
    }
}

async fn wait_connected(session: &TransportSession) {
    for _ in 0..150 {
        if session.is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Transport never reached Connected");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_reports_state_transitions() {
    let (listener, url) = bind_collector().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // hold the connection open
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(ws);
    });

    let (session, mut events) = session(&url, 1000);
    session.connect();

    next_event_matching(&mut events, |e| {
        matches!(
            e,
            MotioncastEvent::ConnectionStateChanged {
                state: ConnectionState::Connecting,
                ..
            }
        )
    })
    .await;
    next_event_matching(&mut events, |e| {
        matches!(
            e,
            MotioncastEvent::ConnectionStateChanged {
                state: ConnectionState::Connected,
                ..
            }
        )
    })
    .await;

    assert!(session.is_connected());
    assert_eq!(session.status_detail(), "Connected");
    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_delivers_serialized_envelope() {
    let (listener, url) = bind_collector().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        match ws.next().await {
            Some(Ok(Message::Text(text))) => text,
            other => panic!("Expected text frame, got {:?}", other),
        }
    });

    let (session, mut events) = session(&url, 1000);
    session.connect();
    wait_connected(&session).await;

    session.send(&OutboundMessage::ping());

    next_event_matching(&mut events, |e| {
        matches!(e, MotioncastEvent::MessageSent { summary } if summary == "ping")
    })
    .await;

    let received = timeout(Duration::from_secs(3), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, r#"{"type":"message","message":"ping"}"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_while_disconnected_drops_with_notice() {
    let (session, mut events) = session("ws://127.0.0.1:9/ws", 1000);

    session.send(&OutboundMessage::ping());

    let event = next_event_matching(&mut events, |e| {
        matches!(e, MotioncastEvent::SendDropped { .. })
    })
    .await;
    match event {
        MotioncastEvent::SendDropped { reason } => assert_eq!(reason, "not connected"),
        _ => unreachable!(),
    }
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_inbound_frames_surface_verbatim() {
    let (listener, url) = bind_collector().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("pong".to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
    });

    let (session, mut events) = session(&url, 1000);
    session.connect();

    let event = next_event_matching(&mut events, |e| {
        matches!(e, MotioncastEvent::MessageReceived { .. })
    })
    .await;
    match event {
        MotioncastEvent::MessageReceived { text } => assert_eq!(text, "pong"),
        _ => unreachable!(),
    }
    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unexpected_close_reconnects_while_intent_connected() {
    let (listener, url) = bind_collector().await;
    let server = tokio::spawn(async move {
        // first connection is dropped immediately: an unexpected close
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        drop(ws);

        // the one scheduled reconnect attempt lands here
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
    });

    let (session, _events) = session(&url, 200);
    session.set_intent(true);
    session.connect();

    wait_connected(&session).await;
    // ride through the drop and the 200 ms reconnect delay
    tokio::time::sleep(Duration::from_millis(600)).await;
    wait_connected(&session).await;

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_reconnect_while_intent_idle() {
    let (listener, url) = bind_collector().await;

    let (session, _events) = session(&url, 100);
    session.connect();

    let (stream, _) = listener.accept().await.unwrap();
    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    wait_connected(&session).await;
    drop(ws);

    // a deliberate stop leaves intent idle: no reconnect may be scheduled
    let second = timeout(Duration::from_millis(700), listener.accept()).await;
    assert!(second.is_err(), "Reconnect attempted despite idle intent");
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_failure_without_intent_stops() {
    // nothing listens on this port; connects fail immediately
    let (session, mut events) = session("ws://127.0.0.1:9/ws", 100);
    session.connect();

    next_event_matching(&mut events, |e| {
        matches!(
            e,
            MotioncastEvent::ConnectionStateChanged {
                state: ConnectionState::Errored,
                ..
            }
        )
    })
    .await;

    // intent idle: the session task ends after the failure
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(session.state(), ConnectionState::Disconnected);
}
