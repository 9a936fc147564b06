use std::collections::VecDeque;

use crate::Bitrate;

/// Default number of samples kept for the downgrade decision.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// Fixed size window of the most recent throughput samples.
///
/// Only used by the decrease path. Unlike the bandwidth estimate this is a plain arithmetic
/// mean over the last `capacity` samples, oldest evicted first.
#[derive(Debug, Clone)]
pub(crate) struct DowngradeWindow {
    samples: VecDeque<Bitrate>,
    capacity: usize,
}

impl DowngradeWindow {
    /// The caller guarantees a non-zero capacity.
    pub fn new(capacity: usize) -> Self {
        DowngradeWindow {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Bitrate) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mean of the current contents, `None` if no sample was pushed since the last clear.
    pub fn average(&self) -> Option<Bitrate> {
        if self.samples.is_empty() {
            return None;
        }

        let total: f64 = self.samples.iter().map(Bitrate::as_f64).sum();
        Some((total / self.samples.len() as f64).into())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}
