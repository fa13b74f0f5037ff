//! Fail-safe heartbeat supervision.
//!
//! While a grant is live the authority expects a heartbeat renewal within
//! the negotiated interval. A [`HeartbeatSupervisor`] is a cancellable,
//! single-shot deferred action bound to one node: armed when a heartbeat
//! request goes out, cancelled when the response arrives in time, and
//! running the node's fail-safe action if neither happens before the
//! interval elapses. Expiry is a designed lifecycle outcome, not an error.
//!
//! # Cancellation protocol
//!
//! The timer task races against node commands that cancel or replace the
//! supervisor, so cancellation must be observable as either "fired" or
//! "cancelled, will never fire" with nothing in between. Two mechanisms
//! close the race:
//!
//! - Each supervisor carries a **generation token** issued by the owning
//!   node's monotonic counter. The expiry action runs under the node lock
//!   and must first confirm that the node's installed supervisor still
//!   carries its token; a mismatch means the firing is stale and is ignored.
//! - The node removes the supervisor from its state *before* the handle is
//!   dropped, and dropping aborts the timer task. A supervisor that is no
//!   longer installed can never pass the token check, even if its timer
//!   elapsed concurrently with the cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A single-shot deferred fail-safe bound to one node.
#[derive(Debug)]
pub struct HeartbeatSupervisor {
    generation: u64,
    interval: Duration,
    armed_at: Instant,
    handle: JoinHandle<()>,
}

impl HeartbeatSupervisor {
    /// Arm a supervisor: after `interval`, `on_expiry` runs on a timer task.
    ///
    /// `on_expiry` is responsible for the token check described in the
    /// module docs; the supervisor itself only provides the delay and the
    /// abort handle.
    pub(crate) fn arm<F>(generation: u64, interval: Duration, on_expiry: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            on_expiry.await;
        });
        Self {
            generation,
            interval,
            armed_at: Instant::now(),
            handle,
        }
    }

    /// The single-use token this supervisor was armed with.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The interval the supervisor was armed for.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time elapsed since arming.
    #[must_use]
    pub fn armed_for(&self) -> Duration {
        self.armed_at.elapsed()
    }
}

impl Drop for HeartbeatSupervisor {
    fn drop(&mut self) {
        // Dropping is cancellation: abort the timer task instead of leaving
        // it sleeping toward a stale fire. Aborting an already-finished
        // task is a no-op.
        self.handle.abort();
    }
}
