use crossbeam_channel::Receiver;
use std::collections::VecDeque;

use super::decoder::DecodedFrame;

/// Frames later than this behind the clock are dropped (seconds)
const LATE_TOLERANCE: f64 = 0.02;
/// Frames up to this far ahead of the clock are already shown (seconds)
const EARLY_TOLERANCE: f64 = 0.02;
/// After a seek, keyframe-aligned frames this far before the target are accepted
const SEEK_TOLERANCE: f64 = 0.5;

/// Buffers decoded frames and picks the one matching the playback clock.
pub struct FrameQueue {
    receiver: Receiver<DecodedFrame>,
    pending: VecDeque<DecodedFrame>,
    shown: Option<DecodedFrame>,
    capacity: usize,
    /// Frames from any other seek generation are stale
    generation: u64,
    /// Set whenever `shown` changes; cleared by `take_fresh`
    fresh: bool,
}

impl FrameQueue {
    pub fn new(receiver: Receiver<DecodedFrame>, capacity: usize) -> Self {
        Self {
            receiver,
            pending: VecDeque::with_capacity(capacity),
            shown: None,
            capacity,
            generation: 0,
            fresh: false,
        }
    }

    fn fill(&mut self) {
        while self.pending.len() < self.capacity {
            match self.receiver.try_recv() {
                Ok(frame) if frame.generation == self.generation => {
                    self.pending.push_back(frame)
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    }

    fn show_front(&mut self) {
        if let Some(frame) = self.pending.pop_front() {
            self.shown = Some(frame);
            self.fresh = true;
        }
    }

    /// Advance to the frame due at `clock` seconds.
    pub fn advance_to(&mut self, clock: f64) {
        self.fill();

        while self
            .pending
            .front()
            .is_some_and(|frame| frame.pts < clock - LATE_TOLERANCE)
        {
            self.pending.pop_front();
        }

        if self
            .pending
            .front()
            .is_some_and(|frame| frame.pts <= clock + EARLY_TOLERANCE)
        {
            self.show_front();
        }
    }

    /// Accept the first frame near `target` after a seek.
    /// Returns its timestamp once one has arrived.
    pub fn settle_seek(&mut self, target: f64) -> Option<f64> {
        self.fill();

        while self
            .pending
            .front()
            .is_some_and(|frame| frame.pts < target - SEEK_TOLERANCE)
        {
            self.pending.pop_front();
        }

        if self.pending.is_empty() {
            return None;
        }
        self.show_front();
        self.shown.as_ref().map(|frame| frame.pts)
    }

    /// The frame on screen, if it changed since the last call.
    pub fn take_fresh(&mut self) -> Option<&DecodedFrame> {
        if std::mem::take(&mut self.fresh) {
            self.shown.as_ref()
        } else {
            None
        }
    }

    /// Drop everything buffered, including frames still in the channel.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.shown = None;
        self.fresh = false;
        while self.receiver.try_recv().is_ok() {}
    }

    /// Start a new seek generation: drop everything buffered and ignore
    /// frames of older generations still on their way.
    pub fn restart(&mut self, generation: u64) {
        self.generation = generation;
        self.clear();
    }

    /// No frame buffered, in flight or on screen waiting.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.receiver.is_empty()
    }
}
