use std::time::{Duration, Instant};

use log::warn;

use crate::{
    error::StartupError,
    transport::{OutboundMessage, Publisher},
    types::{GpsToLocalEstimate, PoseMessage},
};

/// Latest committed body position in the local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalPoseSample {
    pub utime: i64,
    pub pos: [f64; 3],
}

impl From<&GpsToLocalEstimate> for GlobalPoseSample {
    fn from(estimate: &GpsToLocalEstimate) -> Self {
        Self {
            utime: estimate.utime,
            pos: estimate.local,
        }
    }
}

impl GlobalPoseSample {
    /// Global pose record, always with identity orientation
    pub fn to_pose(&self) -> PoseMessage {
        PoseMessage {
            utime: self.utime,
            pos: self.pos,
            orientation: PoseMessage::IDENTITY_ORIENTATION,
        }
    }
}

/// Fixed-rate timer republishing the latest [`GlobalPoseSample`].
///
/// Deadlines are kept on a fixed grid from the start instant, so a late tick
/// does not shift the following ones. Ticks missed entirely are skipped.
#[derive(Debug)]
pub struct PoseRebroadcaster {
    rate_hz: f64,
    period: Duration,
    next_tick: Instant,
}

impl PoseRebroadcaster {
    /// Timer whose first deadline is one period after `start`
    pub fn new(rate_hz: f64, start: Instant) -> Result<Self, StartupError> {
        let period = Duration::try_from_secs_f64(rate_hz.recip())
            .ok()
            .filter(|period| !period.is_zero())
            .ok_or(StartupError::InvalidRate(rate_hz))?;
        let mut timer = Self {
            rate_hz,
            period,
            next_tick: start,
        };
        timer.restart(start)?;
        Ok(timer)
    }

    /// Moves the grid so the next deadline is one period after `start`
    pub fn restart(&mut self, start: Instant) -> Result<(), StartupError> {
        self.next_tick = start
            .checked_add(self.period)
            .ok_or(StartupError::InvalidRate(self.rate_hz))?;
        Ok(())
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn time_until_tick(&self, now: Instant) -> Duration {
        self.next_tick.saturating_duration_since(now)
    }

    /// Returns `true` and arms the next deadline when a tick is due at `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }
        while self.next_tick <= now {
            self.next_tick += self.period;
        }
        true
    }

    /// Publishes `latest` on the global pose channel. No-op without a sample.
    pub fn tick(&self, latest: Option<&GlobalPoseSample>, publisher: &mut impl Publisher) {
        let Some(sample) = latest else {
            return;
        };
        if let Err(e) = publisher.publish(&OutboundMessage::GlobalToLocal(sample.to_pose())) {
            warn!("Failed to publish global pose at {}: {}", sample.utime, e);
        }
    }
}
