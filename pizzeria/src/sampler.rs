use serde_derive::{Deserialize, Serialize};

use crate::{store::OrderStore, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipSample {
    pub wip: usize,
    pub timestamp: Millis,
}

#[derive(Debug, Default)]
pub struct WipSampler {
    samples: Vec<WipSample>,
}

impl WipSampler {
    /// Records how many orders are in progress. Nothing is recorded
    /// before the first order shows up.
    pub fn sample(&mut self, store: &OrderStore, now: Millis) -> Option<WipSample> {
        if store.is_empty() {
            return None;
        }
        let sample = WipSample {
            wip: store.wip(),
            timestamp: now,
        };
        self.samples.push(sample);
        Some(sample)
    }

    pub fn samples(&self) -> &[WipSample] {
        &self.samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
