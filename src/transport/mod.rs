pub mod envelope;

#[cfg(test)]
mod tests;

use crate::error::TransportError;
use crate::events::{EventBus, MotioncastEvent};
use envelope::OutboundMessage;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Connection lifecycle states, owned exclusively by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

struct TransportShared {
    url: String,
    reconnect_delay: Duration,
    state: RwLock<(ConnectionState, String)>,
    /// Owner's desire to be connected, tracked separately from the live
    /// state; gates reconnect scheduling only.
    intent: AtomicBool,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    session: Mutex<Option<JoinHandle<()>>>,
    events: EventBus,
}

/// Owns the socket to the collector: connect, auto-reconnect after an
/// unexpected close, fire-and-forget send.
#[derive(Clone)]
pub struct TransportSession {
    shared: Arc<TransportShared>,
}

impl TransportSession {
    pub fn new(url: String, reconnect_delay: Duration, events: EventBus) -> Self {
        Self {
            shared: Arc::new(TransportShared {
                url,
                reconnect_delay,
                state: RwLock::new((ConnectionState::Disconnected, "Disconnected".to_string())),
                intent: AtomicBool::new(false),
                outbound: Mutex::new(None),
                session: Mutex::new(None),
                events,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.read().0
    }

    pub fn status_detail(&self) -> String {
        self.shared.state.read().1.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Record whether the owner wants connectivity. While the intent is off,
    /// a close ends the session task without scheduling a reconnect.
    pub fn set_intent(&self, connected: bool) {
        self.shared.intent.store(connected, Ordering::SeqCst);
    }

    pub fn intent(&self) -> bool {
        self.shared.intent.load(Ordering::SeqCst)
    }

    /// Open the socket if no session task is live. Safe to call repeatedly.
    pub fn connect(&self) {
        let mut session = self.shared.session.lock();
        if let Some(handle) = session.as_ref() {
            if !handle.is_finished() {
                debug!("Transport session already running");
                return;
            }
        }
        let shared = Arc::clone(&self.shared);
        *session = Some(tokio::spawn(session_loop(shared)));
    }

    /// Serialize and transmit if connected; otherwise drop the message with a
    /// local notice. Never returns an error to the caller.
    pub fn send(&self, message: &OutboundMessage) {
        if !self.is_connected() {
            warn!("Collector not connected; dropping {}", message.summary());
            let _ = self.shared.events.publish(MotioncastEvent::SendDropped {
                reason: "not connected".to_string(),
            });
            return;
        }

        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize outbound message: {}", e);
                return;
            }
        };

        let delivered = self
            .shared
            .outbound
            .lock()
            .as_ref()
            .map_or(false, |sender| sender.send(text).is_ok());

        if delivered {
            let _ = self.shared.events.publish(MotioncastEvent::MessageSent {
                summary: message.summary(),
            });
        } else {
            // the writer went away between the state check and the push
            let _ = self.shared.events.publish(MotioncastEvent::SendDropped {
                reason: "not connected".to_string(),
            });
        }
    }
}

fn set_state(shared: &TransportShared, state: ConnectionState, detail: &str) {
    *shared.state.write() = (state, detail.to_string());
    let _ = shared
        .events
        .publish(MotioncastEvent::ConnectionStateChanged {
            state,
            detail: detail.to_string(),
        });
}

/// One connection attempt per iteration. After an unexpected close with the
/// intent still on, exactly one reconnect is scheduled after the fixed delay;
/// with the intent off the task ends and a later `connect()` starts fresh.
async fn session_loop(shared: Arc<TransportShared>) {
    loop {
        set_state(&shared, ConnectionState::Connecting, "Connecting…");

        match connect_async(shared.url.as_str()).await {
            Ok((stream, _response)) => {
                info!("WebSocket open: {}", shared.url);
                set_state(&shared, ConnectionState::Connected, "Connected");

                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                *shared.outbound.lock() = Some(outbound_tx);

                pump(&shared, stream, outbound_rx).await;

                *shared.outbound.lock() = None;
                set_state(&shared, ConnectionState::Disconnected, "Disconnected");
            }
            Err(e) => {
                let error = TransportError::Connect {
                    details: e.to_string(),
                };
                warn!("{}", error);
                set_state(&shared, ConnectionState::Errored, &error.to_string());
                set_state(&shared, ConnectionState::Disconnected, "Disconnected");
            }
        }

        if !shared.intent.load(Ordering::SeqCst) {
            debug!("Connection intent is idle; not reconnecting");
            break;
        }
        tokio::time::sleep(shared.reconnect_delay).await;
    }
}

/// Pump frames both ways until the socket closes or errors.
async fn pump(
    shared: &TransportShared,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = shared.events.publish(MotioncastEvent::MessageReceived { text });
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("WebSocket closed");
                    break;
                }
                Some(Ok(_)) => {
                    // binary/ping/pong frames are not part of the protocol
                }
                Some(Err(e)) => {
                    let error = TransportError::Socket {
                        details: e.to_string(),
                    };
                    error!("{}", error);
                    set_state(shared, ConnectionState::Errored, &error.to_string());
                    // the close path always follows the error path
                    break;
                }
            },
            text = outbound.recv() => match text {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        let error = TransportError::Socket {
                            details: e.to_string(),
                        };
                        error!("{}", error);
                        set_state(shared, ConnectionState::Errored, &error.to_string());
                        break;
                    }
                }
                None => break,
            },
        }
    }
}
