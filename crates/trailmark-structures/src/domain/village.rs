//! Village search timer state.

use std::time::Duration;

use serde::Serialize;

/// Landmark key of the village.
pub const VILLAGE: &str = "VILLAGE";

/// Progress of the timed village search.
///
/// The search is pending from run start until the village is found or the
/// timeout elapses. `failed` is one-shot: it is only cleared by a new run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VillageSearchState {
    elapsed: Duration,
    timeout: Option<Duration>,
    pending: bool,
    failed: bool,
}

impl VillageSearchState {
    /// Starts a search; an untracked village never has a pending search.
    #[must_use]
    pub fn new(tracked: bool) -> Self {
        Self {
            pending: tracked,
            ..Self::default()
        }
    }

    /// Time elapsed at the last evaluation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Timeout threshold used at the last evaluation.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the search is still running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether the search timed out.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn observe(&mut self, elapsed: Duration, timeout: Duration) {
        self.elapsed = elapsed;
        self.timeout = Some(timeout);
    }

    pub(crate) fn resolve(&mut self) {
        self.pending = false;
    }

    pub(crate) fn fail(&mut self) {
        self.pending = false;
        self.failed = true;
    }
}
