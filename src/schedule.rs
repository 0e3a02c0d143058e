//! The narrow interface an external work queue uses to drive tasks.
//!
//! A queue decides *when* a task runs by polling these flags, then calls
//! [`Schedulable::start`] exactly once on a thread of its choosing. Tasks declare their
//! dependencies as `Arc<dyn Schedulable>` so the queue can inspect them without knowing
//! their input or output types.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::types::TaskId;

/// Type-erased view of a task, as seen by a work queue.
pub trait Schedulable: Send + Sync {
    fn id(&self) -> TaskId;

    /// Whether the queue may call [`Schedulable::start`] now.
    fn is_ready(&self) -> bool;

    fn is_executing(&self) -> bool;

    fn is_finished(&self) -> bool;

    fn is_cancelled(&self) -> bool;

    /// Submit the task. Called once by the queue.
    fn start(&self);

    fn cancel(&self);

    /// Resolves once the task is finished.
    fn finished(&self) -> BoxFuture<'static, ()>;

    /// Tasks this one must wait for.
    fn dependencies(&self) -> Vec<Arc<dyn Schedulable>>;
}
