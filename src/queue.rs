//! A fixed-size worker pool draining a FIFO task queue, with a pending-task
//! barrier that supports recursive fan-out (tasks enqueuing further tasks).
//!
//! This is the concurrency backbone the Index Builder and Web Crawler share:
//! both submit units of work (one file, one page) as independent closures and
//! rely on `finish()` to observe a barrier over the full transitive closure
//! of work, including tasks enqueued from inside already-running tasks.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

struct Shared {
    jobs: Mutex<VecDeque<Message>>,
    has_work: Condvar,
    pending: Mutex<usize>,
    idle: Condvar,
}

/// A pool of worker threads draining a shared FIFO queue.
///
/// `execute` enqueues and returns immediately. `finish` blocks the calling
/// thread until the pending-task count returns to zero — including work
/// enqueued by currently running tasks — which is what lets a caller do
/// `queue.execute(seed_task); queue.finish();` and observe the whole
/// transitive crawl or build complete.
pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkQueue {
    /// Create a pool of `threads` worker threads. `threads` is clamped to at
    /// least 1.
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            jobs: Mutex::new(VecDeque::new()),
            has_work: Condvar::new(),
            pending: Mutex::new(0),
            idle: Condvar::new(),
        });

        let workers = (0..threads)
            .map(|id| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("work-queue-{id}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { shared, workers }
    }

    /// Enqueue a task. Returns immediately; increments the pending count.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.shared.pending.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.shared
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Message::Run(Box::new(job)));
        self.shared.has_work.notify_one();
    }

    /// Block the caller until the pending-task count reaches zero. The queue
    /// remains usable afterward — more work may be submitted.
    pub fn finish(&self) {
        let mut pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
        while *pending > 0 {
            pending = self.shared.idle.wait(pending).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Signal all workers to exit once the queue has drained, without
    /// waiting for them. `join` waits for actual termination.
    pub fn shutdown(&self) {
        let mut jobs = self.shared.jobs.lock().unwrap_or_else(|e| e.into_inner());
        for _ in 0..self.workers.len() {
            jobs.push_back(Message::Shutdown);
        }
        self.shared.has_work.notify_all();
    }

    /// Wait for all worker threads to terminate after `shutdown`.
    pub fn join(mut self) {
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: &Arc<Shared>) {
    loop {
        let message = {
            let mut jobs = shared.jobs.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if let Some(message) = jobs.pop_front() {
                    break message;
                }
                jobs = shared.has_work.wait(jobs).unwrap_or_else(|e| e.into_inner());
            }
        };

        match message {
            Message::Shutdown => return,
            Message::Run(job) => {
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    tracing::error!(?panic, "work queue task panicked");
                }
                let mut pending = shared.pending.lock().unwrap_or_else(|e| e.into_inner());
                *pending -= 1;
                if *pending == 0 {
                    shared.idle.notify_all();
                }
            }
        }
    }
}
