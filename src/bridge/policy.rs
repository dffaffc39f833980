//! Tiling policy: decides whether an inbound message warrants a
//! tiling-direction toggle.

use super::event::Event;

/// Outcome of evaluating one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Send the toggle command.
    Toggle { tiling_size: f64 },
    /// Nothing to do.
    Ignore(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IgnoreReason {
    /// Payload is not a decodable event.
    Malformed,
    /// Event carries no tiling size.
    NoTilingSize,
    /// Window is larger than the threshold.
    AboveThreshold(f64),
}

/// Toggles the tiling direction once a window's share of its slot drops to
/// the threshold or below.
#[derive(Debug, Clone, Copy)]
pub struct TilingPolicy {
    threshold: f64,
}

impl TilingPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Inclusive, exact comparison.
    pub fn should_toggle(&self, tiling_size: f64) -> bool {
        tiling_size <= self.threshold
    }

    /// Decode `payload` and decide. Never fails: undecodable input is
    /// reported as [`IgnoreReason::Malformed`].
    pub fn evaluate(&self, payload: &[u8]) -> Decision {
        let event = match Event::decode(payload) {
            Ok(event) => event,
            Err(_) => return Decision::Ignore(IgnoreReason::Malformed),
        };

        match event.tiling_size() {
            None => Decision::Ignore(IgnoreReason::NoTilingSize),
            Some(size) if self.should_toggle(size) => Decision::Toggle { tiling_size: size },
            Some(size) => Decision::Ignore(IgnoreReason::AboveThreshold(size)),
        }
    }
}

impl Default for TilingPolicy {
    fn default() -> Self {
        Self::new(0.5)
    }
}
