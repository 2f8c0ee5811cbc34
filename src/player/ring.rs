use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Shared sample ring between the decoder thread and the audio output.
/// Writers never block: once full, the oldest samples are overwritten.
pub struct SampleRing {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        })
    }

    /// Append decoded samples, evicting the oldest ones when over capacity.
    pub fn extend(&self, incoming: &[f32]) {
        let mut samples = self.samples.lock();
        let overflow = (samples.len() + incoming.len()).saturating_sub(self.capacity);
        let evict = overflow.min(samples.len());
        samples.drain(..evict);
        // Input larger than the ring keeps only its tail
        let skip = incoming.len().saturating_sub(self.capacity);
        samples.extend(&incoming[skip..]);
    }

    pub fn pop(&self) -> Option<f32> {
        self.samples.lock().pop_front()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }
}
