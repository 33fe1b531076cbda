use std::time::{Duration, Instant};

/// Compensates for the audio device starting later than the first video frame.
pub const DEFAULT_PLAYBACK_OFFSET: Duration = Duration::from_millis(120);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Video position for a given wall clock time since playback started.
/// Clamped at zero while still inside the offset window.
pub fn playback_position(wall: Duration, offset: Duration) -> Duration {
    wall.saturating_sub(offset)
}
