//! Run bracketing
//!
//! A `RunBracket` exists from the moment the run row is inserted until the
//! run ends. Dropping it, on any exit path, stamps `finished_at` and then
//! releases the run lock.

use crate::core::cleanup::Cleanup;
use crate::core::lock::RunGuard;
use crate::store::Store;

pub struct RunBracket<'a> {
    store: &'a Store,
    run_id: i64,
    // Dropped after `Drop::drop` has run, so the lock outlives the stamp
    _guard: RunGuard,
}

impl<'a> RunBracket<'a> {
    pub fn new(store: &'a Store, run_id: i64, guard: RunGuard) -> Self {
        Self {
            store,
            run_id,
            _guard: guard,
        }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }
}

impl Cleanup for RunBracket<'_> {
    fn cleanup(&self) {
        match self.store.finish_run(self.run_id) {
            Ok(true) => log::debug!("Run {} finished", self.run_id),
            Ok(false) => log::debug!("Run {} was already finished", self.run_id),
            Err(e) => log::error!("Failed to finish run {}: {}", self.run_id, e),
        }
    }
}

impl Drop for RunBracket<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
