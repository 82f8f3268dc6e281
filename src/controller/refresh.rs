use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(120);

/// The periodic refresh timer. At most one interval exists at a time.
#[derive(Debug)]
pub struct AutoRefresh {
    period: Duration,
    timer: Option<Interval>,
}

impl Default for AutoRefresh {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_PERIOD)
    }
}

impl AutoRefresh {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            timer: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Arms the timer; the first tick fires one period from now.
    /// Returns false when it was already running.
    pub fn start(&mut self) -> bool {
        if self.timer.is_some() {
            return false;
        }
        let mut timer = interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
        tracing::debug!(period_secs = self.period.as_secs(), "auto refresh started");
        true
    }

    /// Drops the timer. No tick is delivered afterwards.
    pub fn stop(&mut self) -> bool {
        let was_active = self.timer.take().is_some();
        if was_active {
            tracing::debug!("auto refresh stopped");
        }
        was_active
    }

    /// Flips the timer and returns whether it is now active.
    pub fn toggle(&mut self) -> bool {
        if self.is_active() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    /// Resolves on the next tick; never resolves while stopped.
    pub async fn tick(&mut self) -> Instant {
        match self.timer.as_mut() {
            Some(timer) => timer.tick().await,
            None => std::future::pending().await,
        }
    }
}
