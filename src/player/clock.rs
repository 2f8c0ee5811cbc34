use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Master clock for A/V sync, driven by the audio output.
///
/// Advances as the output consumes samples. Files without an audio stream
/// still produce silence at the nominal rate, so the clock keeps moving.
#[derive(Clone)]
pub struct PlaybackClock {
    position_us: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    /// Set on seek; the output discards whatever it still has queued
    flush: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl PlaybackClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position_us: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            flush: Arc::new(AtomicBool::new(false)),
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        }
    }

    pub fn position(&self) -> f64 {
        self.position_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Jump to `seconds` and request a flush of queued samples.
    pub fn set_position(&self, seconds: f64) {
        let us = (seconds.max(0.0) * 1_000_000.0) as u64;
        self.position_us.store(us, Ordering::Relaxed);
        self.flush.store(true, Ordering::Relaxed);
    }

    pub fn take_flush(&self) -> bool {
        self.flush.swap(false, Ordering::Relaxed)
    }

    /// Account for `samples` interleaved samples handed to the output.
    pub fn advance(&self, samples: u64) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        let per_second = self.sample_rate as f64 * self.channels as f64;
        let delta_us = (samples as f64 * 1_000_000.0 / per_second) as u64;
        self.position_us.fetch_add(delta_us, Ordering::Relaxed);
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_only_while_running() {
        let clock = PlaybackClock::new(1000, 2);
        clock.advance(2000);
        assert_eq!(clock.position(), 0.0);

        clock.start();
        clock.advance(2000);
        assert!((clock.position() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_position_requests_flush() {
        let clock = PlaybackClock::new(48_000, 2);
        clock.set_position(12.5);
        assert!((clock.position() - 12.5).abs() < 1e-6);
        assert!(clock.take_flush());
        assert!(!clock.take_flush());
    }

    #[test]
    fn test_negative_position_clamps_to_zero() {
        let clock = PlaybackClock::new(48_000, 2);
        clock.set_position(-4.0);
        assert_eq!(clock.position(), 0.0);
    }
}
