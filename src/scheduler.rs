use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Periodic timer driving snapshot emission at a fixed cadence.
///
/// At most one timer is alive at a time; re-arming first disarms the
/// previous one.
#[derive(Default)]
pub struct CadenceScheduler {
    timer: Option<JoinHandle<()>>,
}

impl CadenceScheduler {
    pub fn new() -> Self {
        Self { timer: None }
    }

    /// Start invoking `tick` every `interval`, first invocation one interval
    /// from now.
    pub fn arm<F>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.disarm();
        debug!("Cadence scheduler armed at {:?}", interval);
        self.timer = Some(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                tick();
            }
        }));
    }

    /// Cancel the timer; safe when not armed.
    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("Cadence scheduler disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }
}

impl Drop for CadenceScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_cadence() {
        let count = Arc::new(AtomicU32::new(0));
        let mut scheduler = CadenceScheduler::new();

        let counter = Arc::clone(&count);
        scheduler.arm(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_armed());

        sleep(Duration::from_millis(1005)).await;
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let mut scheduler = CadenceScheduler::new();

        let counter = Arc::clone(&count);
        scheduler.arm(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(250)).await;
        scheduler.disarm();
        assert!(!scheduler.is_armed());

        let seen = count.load(Ordering::SeqCst);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let mut scheduler = CadenceScheduler::new();

        let counter = Arc::clone(&first);
        scheduler.arm(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(250)).await;
        let first_seen = first.load(Ordering::SeqCst);

        let counter = Arc::clone(&second);
        scheduler.arm(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(500)).await;
        assert_eq!(first.load(Ordering::SeqCst), first_seen);
        assert!(second.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn test_disarm_when_idle_is_safe() {
        let mut scheduler = CadenceScheduler::new();
        scheduler.disarm();
        assert!(!scheduler.is_armed());
    }
}
