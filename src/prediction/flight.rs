//! Single-flight guard for prediction submissions.
//!
//! Overlapping responses would race to prepend to the history log, so at most
//! one submission may be outstanding. A second attempt is rejected, not
//! queued. The guard releases the slot when dropped, including on error paths.
//!
//! [`App::submit`](crate::app::App::submit) takes `&self`, so this slot is the
//! only thing enforcing a single request on that path.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. `None` if a submission is already in progress.
    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flight: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Holds the single-flight slot until dropped.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.in_flight.store(false, Ordering::Release);
    }
}
