//! Execution contexts for completion handlers.
//!
//! A completion handler is wrapped in a [`Job`] and handed to whatever [`Dispatch`] the
//! caller chose. Any `Fn(Job)` closure works, so every async runtime is supported:
//!
//! - Tokio: `move |job| { handle.spawn(job); }`
//! - Smol: `|job| { smol::spawn(job).detach(); }`
//! - Async-std: `|job| { async_std::task::spawn(job); }`
//!
//! [`Inline`] runs the job on the thread that finished the task.

use std::future::Future;
use std::task::Context;

use futures::future::BoxFuture;
use futures::task::noop_waker_ref;

/// A unit of deferred work handed to a [`Dispatch`].
pub type Job = BoxFuture<'static, ()>;

/// Somewhere a [`Job`] can be sent to run.
///
/// Implementations must run every job they accept exactly once.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, job: Job);
}

impl<F> Dispatch for F
where
    F: Fn(Job) + Send + Sync,
{
    fn dispatch(&self, job: Job) {
        self(job)
    }
}

/// Runs jobs to completion on the calling thread.
///
/// A job that completes on its first poll (every plain completion handler does) runs
/// without touching an executor, so `Inline` is safe to use from inside one. A job that
/// has to wait blocks the calling thread until it is done.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Dispatch for Inline {
    fn dispatch(&self, mut job: Job) {
        let mut cx = Context::from_waker(noop_waker_ref());
        if job.as_mut().poll(&mut cx).is_pending() {
            futures::executor::block_on(job)
        }
    }
}
