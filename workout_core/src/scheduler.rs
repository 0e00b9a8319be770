//! Cancellable one-second tick sources.
//!
//! A tick source hands out a fresh `TickId` each time it is armed. The
//! session timer only honors ticks carrying the currently active id, so a
//! tick armed before a cancel can never reach the next item.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generation number of an armed tick source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickId(pub u64);

/// Repeating tick capability driven by the session timer
pub trait TickSource {
    /// Arm the source; any previous generation is replaced
    fn start(&mut self) -> TickId;

    /// Disarm the source; ticks from the cancelled generation are stale
    fn cancel(&mut self);

    /// Currently armed generation, if any
    fn active(&self) -> Option<TickId>;
}

/// Entry in a `ManualTicks` log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    Started(TickId),
    Cancelled(TickId),
}

/// Tick source whose ticks are delivered by hand.
///
/// Keeps a log of every start and cancel so ordering can be checked.
#[derive(Debug, Default)]
pub struct ManualTicks {
    next: u64,
    active: Option<TickId>,
    log: Vec<TickEvent>,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &[TickEvent] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl TickSource for ManualTicks {
    fn start(&mut self) -> TickId {
        // exactly one generation may be armed
        self.cancel();
        self.next += 1;
        let id = TickId(self.next);
        self.active = Some(id);
        self.log.push(TickEvent::Started(id));
        id
    }

    fn cancel(&mut self) {
        if let Some(id) = self.active.take() {
            self.log.push(TickEvent::Cancelled(id));
        }
    }

    fn active(&self) -> Option<TickId> {
        self.active
    }
}

/// Tick source paced by a blocking sleep
#[derive(Debug)]
pub struct IntervalTicks {
    interval: Duration,
    next: u64,
    active: Option<TickId>,
}

impl IntervalTicks {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: 0,
            active: None,
        }
    }

    /// One second per tick
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep one interval and return the tick to deliver, if still armed
    pub fn wait(&self) -> Option<TickId> {
        let id = self.active?;
        std::thread::sleep(self.interval);
        Some(id)
    }
}

impl TickSource for IntervalTicks {
    fn start(&mut self) -> TickId {
        self.next += 1;
        let id = TickId(self.next);
        self.active = Some(id);
        id
    }

    fn cancel(&mut self) {
        self.active = None;
    }

    fn active(&self) -> Option<TickId> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_restart_cancels_previous() {
        let mut ticks = ManualTicks::new();
        let first = ticks.start();
        let second = ticks.start();

        assert_ne!(first, second);
        assert_eq!(ticks.active(), Some(second));
        assert_eq!(
            ticks.log(),
            &[
                TickEvent::Started(first),
                TickEvent::Cancelled(first),
                TickEvent::Started(second)
            ]
        );
    }

    #[test]
    fn test_cancel_when_idle_is_silent() {
        let mut ticks = ManualTicks::new();
        ticks.cancel();
        assert!(ticks.log().is_empty());
        assert_eq!(ticks.active(), None);
    }

    #[test]
    fn test_interval_wait() {
        let mut ticks = IntervalTicks::new(Duration::from_millis(1));
        assert_eq!(ticks.wait(), None);

        let id = ticks.start();
        assert_eq!(ticks.wait(), Some(id));

        ticks.cancel();
        assert_eq!(ticks.wait(), None);
    }
}
