//! Owned, cancellable playback tick source.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::PlaybackEffect;

/// Holds at most one repeating interval.
///
/// Arming replaces any previous interval and cancelling drops it, so there
/// is never more than one tick source alive.
#[derive(Debug, Default)]
pub struct PlaybackTimer {
    interval: Option<Interval>,
}

impl PlaybackTimer {
    /// Unarmed timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, first tick one period from now.
    ///
    /// Must be called inside a tokio runtime.
    pub fn arm(&mut self, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Drop the interval. Pending ticks never fire.
    pub fn cancel(&mut self) {
        self.interval = None;
    }

    /// Whether an interval is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Apply the timer effects of a transition; other effects are ignored.
    pub fn apply(&mut self, effects: &[PlaybackEffect]) {
        for effect in effects {
            match effect {
                PlaybackEffect::ScheduleTick(period) => self.arm(*period),
                PlaybackEffect::CancelTick => self.cancel(),
                PlaybackEffect::SelectYear(_) | PlaybackEffect::Recompute => {}
            }
        }
    }

    /// Wait for the next tick. Never completes while unarmed.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_after_each_period() {
        let mut timer = PlaybackTimer::new();
        timer.arm(Duration::from_millis(1200));
        assert!(timer.is_armed());

        let start = Instant::now();
        timer.tick().await;
        assert_eq!(start.elapsed().as_millis(), 1200);
        timer.tick().await;
        assert_eq!(start.elapsed().as_millis(), 2400);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut timer = PlaybackTimer::new();
        timer.apply(&[PlaybackEffect::ScheduleTick(Duration::from_millis(100))]);
        timer.apply(&[PlaybackEffect::CancelTick]);
        assert!(!timer.is_armed());

        let fired = tokio::time::timeout(Duration::from_secs(10), timer.tick()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_interval() {
        let mut timer = PlaybackTimer::new();
        timer.arm(Duration::from_millis(100));
        timer.arm(Duration::from_millis(500));

        let start = Instant::now();
        timer.tick().await;
        assert_eq!(start.elapsed().as_millis(), 500);
    }
}
