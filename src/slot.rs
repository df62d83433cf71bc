//! Shared ownership between a loader and the audio thread.
//!
//! A [`Wavetable`](crate::store::Wavetable) carries no synchronization of
//! its own. The slot owns one behind a single coarse mutex: the loader
//! holds the lock across an entire build, the audio thread holds it while
//! it pulls the frames for one processing block. A build runs to
//! completion under the lock with no allocation or I/O after the initial
//! capacity check, so hold time is bounded and a half-rebuilt pyramid is
//! never observable. There is no mid-build cancellation; a failed load
//! leaves the previous table playing and the loader may simply retry.

use spin::{Mutex, MutexGuard};

use crate::error::BuildError;
use crate::header::WtHeader;
use crate::store::Wavetable;

/// One oscillator slot's wavetable behind the loader/audio lock.
#[derive(Debug, Default)]
pub struct WavetableSlot {
    table: Mutex<Wavetable>,
}

impl WavetableSlot {
    /// Create a slot holding an empty, never-built table.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Wavetable::new()),
        }
    }

    /// Replace the table from a decoded header and payload. Loader side;
    /// holds the lock for the whole build.
    pub fn load(
        &self,
        header: &WtHeader,
        payload: &[u8],
        one_shot: bool,
    ) -> Result<(), BuildError> {
        self.table.lock().ingest(header, payload, one_shot)
    }

    /// Duplicate another slot's table, clipboard-style. Loader side; a
    /// process has at most one loader thread, so taking both locks here
    /// cannot deadlock.
    pub fn copy_from(&self, other: &WavetableSlot) -> Result<(), BuildError> {
        let source = other.table.lock();
        self.table.lock().copy_from(&source)
    }

    /// Acquire the table, typically once per processing block on the
    /// audio thread. Any frame view taken from the guard dies with it;
    /// caching one across blocks would be the dangling-view bug this
    /// crate exists to prevent.
    pub fn lock(&self) -> MutexGuard<'_, Wavetable> {
        self.table.lock()
    }
}
