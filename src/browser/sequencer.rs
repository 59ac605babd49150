//! Request generation counter
//!
//! Every request whose result may arrive after the browser has moved on
//! is tagged with the generation current at issue time. A result is only
//! applied if its generation is still current when it resolves.

/// Monotonic generation counter owned by a single state object.
#[derive(Debug, Default)]
pub struct Sequencer {
    current: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self { current: 0 }
    }

    /// Advance and return the new generation. Starts at 1; 0 means "never issued".
    pub fn next(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation != 0 && generation == self.current
    }
}
