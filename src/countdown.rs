use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One step of the pre-recording countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownTick {
    /// Seconds left before the recording window opens.
    Remaining(u32),
    /// The distinguished final "go" tick.
    Go,
}

/// N+1-tick countdown gating gesture recording.
///
/// All pending ticks live in one cancellable task, so cancellation clears
/// them wholesale before any state transition.
#[derive(Default)]
pub struct Countdown {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            task: None,
        }
    }

    /// Schedule `duration_seconds + 1` ticks at one-second spacing, the first
    /// immediately: `Remaining(duration..1)` followed by `Go`. One second
    /// after the final tick, `on_complete` fires exactly once.
    pub fn start<T, C>(&mut self, duration_seconds: u32, on_tick: T, on_complete: C)
    where
        T: Fn(CountdownTick) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.cancel();
        debug!("Countdown started: {} seconds", duration_seconds);

        let token = CancellationToken::new();
        self.token = token.clone();
        self.task = Some(tokio::spawn(async move {
            for index in 0..=duration_seconds {
                if index > 0 {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = sleep(Duration::from_secs(1)) => {}
                    }
                }
                let tick = if index < duration_seconds {
                    CountdownTick::Remaining(duration_seconds - index)
                } else {
                    CountdownTick::Go
                };
                on_tick(tick);
            }

            tokio::select! {
                _ = token.cancelled() => return,
                _ = sleep(Duration::from_secs(1)) => {}
            }
            on_complete();
        }));
    }

    /// Revoke all pending ticks and the completion callback; safe to call
    /// when nothing is scheduled.
    pub fn cancel(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Countdown cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (
        Arc<Mutex<Vec<CountdownTick>>>,
        impl Fn(CountdownTick) + Send + 'static,
    ) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        (ticks, move |tick| sink.lock().unwrap().push(tick))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_n_plus_one_ticks_then_completes_once() {
        let (ticks, on_tick) = recorder();
        let completions = Arc::new(AtomicU32::new(0));
        let completed = Arc::clone(&completions);

        let mut countdown = Countdown::new();
        countdown.start(3, on_tick, move || {
            completed.fetch_add(1, Ordering::SeqCst);
        });

        // ticks land at t = 0, 1, 2, 3 seconds
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            *ticks.lock().unwrap(),
            vec![CountdownTick::Remaining(3), CountdownTick::Remaining(2)]
        );
        assert_eq!(completions.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(
            *ticks.lock().unwrap(),
            vec![
                CountdownTick::Remaining(3),
                CountdownTick::Remaining(2),
                CountdownTick::Remaining(1),
                CountdownTick::Go,
            ]
        );
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!countdown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_revokes_pending_ticks_and_completion() {
        let (ticks, on_tick) = recorder();
        let completions = Arc::new(AtomicU32::new(0));
        let completed = Arc::clone(&completions);

        let mut countdown = Countdown::new();
        countdown.start(3, on_tick, move || {
            completed.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(ticks.lock().unwrap().len(), 2);

        countdown.cancel();
        assert!(!countdown.is_active());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.lock().unwrap().len(), 2);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_countdown() {
        let (ticks, on_tick) = recorder();
        let (_, first_tick) = recorder();

        let mut countdown = Countdown::new();
        countdown.start(5, first_tick, || {});
        countdown.start(2, on_tick, || {});

        sleep(Duration::from_secs(10)).await;
        assert_eq!(
            *ticks.lock().unwrap(),
            vec![
                CountdownTick::Remaining(2),
                CountdownTick::Remaining(1),
                CountdownTick::Go,
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_when_idle_is_safe() {
        let mut countdown = Countdown::new();
        countdown.cancel();
        assert!(!countdown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_fires_go_then_completes() {
        let (ticks, on_tick) = recorder();
        let completions = Arc::new(AtomicU32::new(0));
        let completed = Arc::clone(&completions);

        let mut countdown = Countdown::new();
        countdown.start(0, on_tick, move || {
            completed.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(3)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![CountdownTick::Go]);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }
}
