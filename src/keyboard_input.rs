use crate::controller::SessionKind;
use crate::events::{EventBus, MotioncastEvent};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Terminal control surface: maps key presses to toggle/ping/shutdown
/// intents on the event bus.
pub struct KeyboardControl {
    event_bus: EventBus,
    cancellation_token: CancellationToken,
}

impl KeyboardControl {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input.
    ///
    /// Keys: `s` toggles streaming, `g` toggles gesture recording, `p` sends
    /// a manual ping, `q` or Esc quits.
    pub fn start(&self) {
        info!("Keyboard control active: [s]tream, [g]esture, [p]ing, [q]uit");

        let event_bus = self.event_bus.clone();
        let cancellation_token = self.cancellation_token.clone();

        // Blocking task: crossterm polling must not stall the runtime
        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard control stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if key_event.kind != KeyEventKind::Press {
                                continue;
                            }
                            match key_event.code {
                                KeyCode::Char('s') => {
                                    let _ = event_bus.publish(MotioncastEvent::ToggleRequested {
                                        kind: SessionKind::Stream,
                                    });
                                }
                                KeyCode::Char('g') => {
                                    let _ = event_bus.publish(MotioncastEvent::ToggleRequested {
                                        kind: SessionKind::Record,
                                    });
                                }
                                KeyCode::Char('p') => {
                                    let _ = event_bus.publish(MotioncastEvent::PingRequested);
                                }
                                KeyCode::Char('q') | KeyCode::Esc => {
                                    let _ =
                                        event_bus.publish(MotioncastEvent::ShutdownRequested {
                                            reason: "User requested via keyboard".to_string(),
                                        });
                                    break;
                                }
                                _ => {
                                    debug!("Key pressed: {:?}", key_event.code);
                                }
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard control task exited");
        });
    }

    /// Stop the keyboard control and restore the terminal.
    pub async fn stop(&self) {
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }
}
