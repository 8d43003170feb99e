//! One-second countdown ticker.
//!
//! The ticker runs as a spawned task that pushes [`Tick`]s into a bounded
//! channel of capacity one, so at most one tick is ever pending. Each start
//! or cancel bumps a generation counter; a tick stamped with an older
//! generation is stale and must be dropped by the receiver.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

/// Seconds below which the clock is shown as urgent.
pub const URGENT_THRESHOLD_SECS: u32 = 120;

/// One elapsed period, stamped with the generation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Create the channel a [`Countdown`] delivers into.
pub fn tick_channel() -> (mpsc::Sender<Tick>, mpsc::Receiver<Tick>) {
    mpsc::channel(1)
}

pub struct Countdown {
    tx: mpsc::Sender<Tick>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
    period: Duration,
}

impl Countdown {
    pub fn new(tx: mpsc::Sender<Tick>) -> Self {
        Self::with_period(tx, Duration::from_secs(1))
    }

    pub fn with_period(tx: mpsc::Sender<Tick>, period: Duration) -> Self {
        Self {
            tx,
            handle: None,
            generation: 0,
            period,
        }
    }

    /// Start ticking. Any previous ticker is cancelled first.
    pub fn start(&mut self) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).await.is_err() {
                    break;
                }
            }
        }));
        debug!(generation, "countdown started");
    }

    /// Stop ticking. A tick already sitting in the channel becomes stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.generation += 1;
            debug!(generation = self.generation, "countdown cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether `tick` came from the ticker that is currently running.
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.is_running() && tick.generation == self.generation
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Render seconds as `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn is_urgent(seconds: u32) -> bool {
    seconds < URGENT_THRESHOLD_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(1620), "27:00");
        assert_eq!(format_clock(1560), "26:00");
        assert_eq!(format_clock(119), "01:59");
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn urgency_threshold() {
        assert!(!is_urgent(120));
        assert!(is_urgent(119));
        assert!(is_urgent(0));
    }

    #[tokio::test]
    async fn ticks_once_per_period() {
        tokio::time::pause();
        let (tx, mut rx) = tick_channel();
        let mut countdown = Countdown::new(tx);
        let begin = Instant::now();
        countdown.start();

        for n in 1..=3u64 {
            let tick = rx.recv().await.unwrap();
            assert!(countdown.is_current(&tick));
            // The paused clock rounds deadlines up to the next millisecond.
            let elapsed = begin.elapsed();
            assert!(elapsed >= Duration::from_secs(n), "tick {n} early: {elapsed:?}");
            assert!(
                elapsed < Duration::from_secs(n) + Duration::from_millis(10),
                "tick {n} late: {elapsed:?}"
            );
        }
    }

    #[tokio::test]
    async fn cancelled_countdown_delivers_nothing() {
        tokio::time::pause();
        let (tx, mut rx) = tick_channel();
        let mut countdown = Countdown::new(tx);
        countdown.start();
        rx.recv().await.unwrap();

        countdown.cancel();
        assert!(!countdown.is_running());
        let late = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(late.is_err(), "no tick after cancel");
    }

    #[tokio::test]
    async fn restart_makes_old_ticks_stale() {
        tokio::time::pause();
        let (tx, mut rx) = tick_channel();
        let mut countdown = Countdown::new(tx);
        countdown.start();
        let old = rx.recv().await.unwrap();

        countdown.start();
        assert!(!countdown.is_current(&old));

        let fresh = rx.recv().await.unwrap();
        assert!(countdown.is_current(&fresh));
        assert!(fresh.generation > old.generation);
    }

    #[test]
    fn tick_without_running_timer_is_stale() {
        let (tx, _rx) = tick_channel();
        let countdown = Countdown::new(tx);
        assert!(!countdown.is_current(&Tick { generation: 0 }));
    }
}
