//! Minimal work queue driving tasks through the [`Schedulable`] interface.
//!
//! The queue never runs task bodies itself: it polls readiness, hands ready tasks to a
//! caller-supplied spawner, and waits on their finish notifications. There is no thread
//! pool, priority or fairness policy here; that belongs to the runtime behind the spawner.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, trace};

use crate::error::{QueueError, QueueResult};
use crate::schedule::Schedulable;

// Guard to ensure run_lock is released even on early return or panic
struct RunGuard<'a> {
    lock: &'a AtomicBool,
}

impl<'a> Drop for RunGuard<'a> {
    fn drop(&mut self) {
        self.lock.store(false, Ordering::SeqCst);
    }
}

/// Submit tasks as they become ready.
///
/// # Workflow
///
/// 1. Create a queue with [`TaskQueue::new`]
/// 2. Enqueue tasks with [`TaskQueue::add`]
/// 3. Either call [`TaskQueue::pump`] whenever you like, or await [`TaskQueue::run`] to
///    keep submitting until every task has finished
///
/// # Examples
///
/// ```
/// use taskline::{Task, TaskQueue};
///
/// # futures::executor::block_on(async {
/// let load: Task<(), i32> = Task::new();
/// load.on_start(|task| task.finish(20));
///
/// let add: Task<i32, i32> = Task::new();
/// add.link_input(load.clone());
/// add.on_start(|task| {
///     let n = task.take_input().into_value().unwrap_or_default();
///     task.finish(n + 1);
/// });
///
/// let queue = TaskQueue::new();
/// queue.add(add.clone());
/// queue.add(load);
///
/// queue
///     .run(|job| {
///         std::thread::spawn(move || futures::executor::block_on(job));
///     })
///     .await
///     .unwrap();
/// assert_eq!(add.outcome().value(), Some(&21));
/// # });
/// ```
pub struct TaskQueue {
    pending: Mutex<Vec<Arc<dyn Schedulable>>>,
    in_flight: Mutex<Vec<Arc<dyn Schedulable>>>,
    run_lock: AtomicBool, // Ensures only one run() at a time
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            in_flight: Mutex::new(Vec::new()),
            run_lock: AtomicBool::new(false),
        }
    }

    /// Enqueue a task. It is submitted once it reports ready.
    pub fn add<T>(&self, task: T)
    where
        T: Schedulable + 'static,
    {
        self.add_shared(Arc::new(task));
    }

    pub fn add_shared(&self, task: Arc<dyn Schedulable>) {
        #[cfg(feature = "tracing")]
        debug!(task_id = task.id().0, "enqueuing task");

        self.pending.lock().push(task);
    }

    /// Tasks not yet submitted plus submitted tasks not yet seen finished.
    pub fn len(&self) -> usize {
        let in_flight = self
            .in_flight
            .lock()
            .iter()
            .filter(|task| !task.is_finished())
            .count();
        self.pending.lock().len() + in_flight
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submit every ready task through `spawner` and return how many were submitted.
    ///
    /// Tasks that are not ready stay queued for the next pump. Submitted tasks that have
    /// finished by the time this returns are released.
    pub fn pump<S>(&self, spawner: &S) -> usize
    where
        S: Fn(BoxFuture<'static, ()>),
    {
        let ready: Vec<Arc<dyn Schedulable>> = {
            let mut pending = self.pending.lock();
            let (ready, waiting) = mem::take(&mut *pending)
                .into_iter()
                .partition(|task| task.is_ready());
            *pending = waiting;
            ready
        };

        let submitted = ready.len();
        for task in ready {
            #[cfg(feature = "tracing")]
            trace!(task_id = task.id().0, "submitting task");

            self.in_flight.lock().push(Arc::clone(&task));
            spawner(async move { task.start() }.boxed());
        }

        self.release_finished();
        submitted
    }

    // Drop submitted tasks that have finished
    fn release_finished(&self) {
        self.in_flight.lock().retain(|task| !task.is_finished());
    }

    /// Cancel every task the queue still knows about.
    pub fn cancel_all(&self) {
        self.release_finished();
        let tasks: Vec<Arc<dyn Schedulable>> = self
            .pending
            .lock()
            .iter()
            .chain(self.in_flight.lock().iter())
            .cloned()
            .collect();

        #[cfg(feature = "tracing")]
        debug!(task_count = tasks.len(), "cancelling all tasks");

        for task in tasks {
            task.cancel();
        }
    }

    /// Keep submitting ready tasks until every enqueued task has finished.
    ///
    /// `spawner` runs each submission on the async runtime of your choice:
    ///
    /// - Tokio: `|fut| { tokio::spawn(fut); }`
    /// - Smol: `|fut| { smol::spawn(fut).detach(); }`
    /// - Async-std: `|fut| { async_std::task::spawn(fut); }`
    ///
    /// A task whose body never finishes keeps this future pending.
    ///
    /// # Errors
    ///
    /// - [`QueueError::ConcurrentRun`] if another `run()` on this queue is in progress.
    /// - [`QueueError::Stalled`] if tasks remain but none is ready and none is executing,
    ///   for example because they are paused.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, spawner)))]
    pub async fn run<S>(&self, spawner: S) -> QueueResult<()>
    where
        S: Fn(BoxFuture<'static, ()>),
    {
        if self
            .run_lock
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            #[cfg(feature = "tracing")]
            error!("queue is already running - concurrent runs not supported");

            return Err(QueueError::ConcurrentRun);
        }

        let _run_guard = RunGuard {
            lock: &self.run_lock,
        };

        #[cfg(feature = "tracing")]
        info!("starting queue run");

        loop {
            let submitted = self.pump(&spawner);

            let waiting: Vec<BoxFuture<'static, ()>> = {
                let mut in_flight = self.in_flight.lock();
                in_flight.retain(|task| !task.is_finished());
                in_flight.iter().map(|task| task.finished()).collect()
            };

            if waiting.is_empty() {
                let pending = self.pending.lock().len();
                if pending == 0 {
                    break;
                }
                if submitted == 0 {
                    #[cfg(feature = "tracing")]
                    error!(pending, "queue stalled");

                    return Err(QueueError::Stalled { pending });
                }
                // Everything submitted finished synchronously; look again
                continue;
            }

            future::select_all(waiting).await;
        }

        #[cfg(feature = "tracing")]
        info!("queue run completed");

        Ok(())
    }
}
