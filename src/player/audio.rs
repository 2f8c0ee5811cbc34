use rodio::Source;
use std::sync::Arc;
use std::time::Duration;

use super::clock::PlaybackClock;
use super::ring::SampleRing;

/// Samples are reported to the clock in batches of this size.
const CLOCK_BATCH: u64 = 256;

/// Endless rodio source fed from the decoder's sample ring.
///
/// Every sample handed to the output advances the clock, silence included,
/// so that streams without audio (or with a starved ring) keep time.
pub struct RingSource {
    ring: Arc<SampleRing>,
    clock: PlaybackClock,
    pending: u64,
}

impl RingSource {
    pub fn new(ring: Arc<SampleRing>, clock: PlaybackClock) -> Self {
        Self {
            ring,
            clock,
            pending: 0,
        }
    }
}

impl Iterator for RingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.clock.take_flush() {
            self.ring.clear();
            self.pending = 0;
            return Some(0.0);
        }

        if !self.clock.is_running() {
            return Some(0.0);
        }

        let sample = self.ring.pop().unwrap_or(0.0);
        self.pending += 1;
        if self.pending == CLOCK_BATCH {
            self.clock.advance(CLOCK_BATCH);
            self.pending = 0;
        }
        Some(sample)
    }
}

impl Source for RingSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.clock.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
