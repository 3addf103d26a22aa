//! A fair multi-reader, single-writer lock.
//!
//! The Inverted Index has a read-mostly access pattern under search load but
//! endures bursts of writes during ingestion and crawl-time merges. A
//! reader-preferring lock would starve those merges indefinitely under
//! concurrent query traffic, so this lock grants strict FIFO fairness: every
//! waiter (reader or writer) draws a monotonically increasing ticket when it
//! starts waiting, and no later-ticketed writer is allowed to run ahead of an
//! earlier-ticketed reader still waiting its turn, or vice versa. Without the
//! ticket, a simple "waiting writer count" can let a *second* writer that
//! arrives while a first writer already holds the lock jump the queue ahead
//! of a reader that has been waiting since before either writer arrived.
//!
//! The lock is intentionally non-reentrant and its unlock calls are paired by
//! convention with the matching `read_lock`/`write_lock` call — acquiring the
//! same kind of guard twice on one thread, or releasing the wrong kind, is a
//! programmer error. In debug builds this panics immediately rather than
//! deadlocking or corrupting the waiter count silently.

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    /// Number of readers currently holding the lock.
    active_readers: u32,
    /// Whether a writer currently holds the lock.
    writer_active: bool,
    /// Ticket to hand out to the next waiter (reader or writer), in a single
    /// shared sequence so readers and writers are totally ordered by arrival.
    next_ticket: u64,
    /// Tickets of readers currently waiting (not yet admitted).
    waiting_readers: BTreeSet<u64>,
    /// Tickets of writers currently waiting (not yet admitted).
    waiting_writers: BTreeSet<u64>,
}

impl GateState {
    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }
}

/// A fair reader/writer gate guarding a shared resource.
///
/// `RwGate` has no knowledge of what it guards; callers acquire a guard,
/// access the protected data through their own reference, and release the
/// guard. This split (rather than a `RwLock<T>`-style wrapper) mirrors the
/// source design's separation of the lock from the Inverted Index it
/// protects, generalized into a reusable primitive (see `SharedIndex` in
/// `index.rs`, the sole production user).
#[derive(Debug, Default)]
pub struct RwGate {
    state: Mutex<GateState>,
    /// Signaled when anything changes that a waiting reader should recheck
    /// (a reader or writer releases, or a writer's wait ticket is removed).
    readers_ok: Condvar,
    /// Signaled when anything changes that a waiting writer should recheck.
    writer_ok: Condvar,
}

/// A guard returned by `read_lock`/`write_lock`. Dropping it is equivalent to
/// calling the matching unlock method; both are provided so call sites can
/// choose the explicit style spec.md §4.1 describes.
pub struct ReadGuard<'a>(&'a RwGate);
pub struct WriteGuard<'a>(&'a RwGate);

impl RwGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a read lock, blocking while a writer holds the lock or any
    /// writer with an earlier ticket is still waiting.
    pub fn read_lock(&self) -> ReadGuard<'_> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let ticket = state.take_ticket();
        state.waiting_readers.insert(ticket);

        while state.writer_active || earlier_writer_waiting(&state, ticket) {
            state = self
                .readers_ok
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }

        state.waiting_readers.remove(&ticket);
        state.active_readers += 1;
        ReadGuard(self)
    }

    /// Release a read lock acquired via `read_lock`. Calling this without a
    /// matching outstanding read lock is a programmer error and panics in
    /// debug builds.
    pub fn read_unlock(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug_assert!(
            state.active_readers > 0,
            "read_unlock called with no active readers"
        );
        state.active_readers = state.active_readers.saturating_sub(1);
        if state.active_readers == 0 {
            self.writer_ok.notify_all();
        }
    }

    /// Acquire the exclusive write lock, blocking until no readers or writer
    /// hold the lock and no earlier-ticketed reader or writer is still
    /// waiting ahead of this call.
    pub fn write_lock(&self) -> WriteGuard<'_> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let ticket = state.take_ticket();
        state.waiting_writers.insert(ticket);

        while state.writer_active
            || state.active_readers > 0
            || earlier_reader_waiting(&state, ticket)
            || earlier_writer_waiting(&state, ticket)
        {
            state = self
                .writer_ok
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }

        state.waiting_writers.remove(&ticket);
        state.writer_active = true;
        WriteGuard(self)
    }

    /// Release the write lock acquired via `write_lock`. Calling this
    /// without holding the write lock is a programmer error and panics in
    /// debug builds.
    pub fn write_unlock(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug_assert!(state.writer_active, "write_unlock called without a writer");
        state.writer_active = false;
        // Either a reader or a writer could be next in ticket order; wake
        // both sets of waiters and let each recheck its own condition.
        self.readers_ok.notify_all();
        self.writer_ok.notify_all();
    }
}

/// Whether some waiting writer holds a ticket earlier than `ticket`.
fn earlier_writer_waiting(state: &GateState, ticket: u64) -> bool {
    state.waiting_writers.iter().next().is_some_and(|&w| w < ticket)
}

/// Whether some waiting reader holds a ticket earlier than `ticket`.
fn earlier_reader_waiting(state: &GateState, ticket: u64) -> bool {
    state.waiting_readers.iter().next().is_some_and(|&r| r < ticket)
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.0.read_unlock();
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.0.write_unlock();
    }
}
