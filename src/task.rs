//! The task lifecycle state machine.
//!
//! A [`Task<In, Out>`] is a single unit of work with a typed input and output. It is
//! configured while [`State::Initial`], handed to a work queue, started once, and finished
//! once by its body, possibly from another thread and long after `start()` returned.
//!
//! # Lifecycle
//!
//! ```text
//! Initial ──start()──▶ Executing ──finish()──▶ Finished
//!    │                                            ▲
//!    └──────────── start() when cancelled ────────┘
//! ```
//!
//! On entering `Executing` the task:
//! 1. resolves a linked input provider, if any
//! 2. evaluates its preconditions once
//! 3. runs the body, which must eventually call one of the `finish*` methods
//!
//! A panic in any of these closures finishes the task with [`OpError::Panicked`] instead
//! of unwinding into the caller of `start()`.
//!
//! Cancellation is cooperative. [`Task::cancel`] sets a sticky flag and calls the
//! cancellation handler if the task is executing; the body is still responsible for
//! finishing.
//!
//! # Once-only actions
//!
//! `cancel`, `finish` and `on_complete` are each guarded by the task's [`OnceGuard`]:
//! racing callers are all accepted without error, but exactly one of them has an effect.

use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::{debug, error, trace, warn};

use crate::dispatch::Dispatch;
use crate::error::OpError;
use crate::once::{Action, OnceGuard};
use crate::outcome::Outcome;
use crate::precondition::{Instruction, Preconditions};
use crate::schedule::Schedulable;
use crate::types::{State, TaskId};
use crate::value::Value;

type Body<In, Out> = Box<dyn FnOnce(Task<In, Out>) + Send>;
type CancelHandler<In, Out> = Box<dyn FnOnce(&Task<In, Out>) + Send>;
type CompletionHandler<In, Out> = Box<dyn FnOnce(Task<In, Out>) + Send>;
type InputResolver<In> = Box<dyn FnOnce() -> Value<In> + Send>;

/// Source of a task's input, resolved when the task starts executing.
///
/// Implemented by every [`Task`] whose output can be cloned, which is how tasks are
/// chained, and by any `Fn() -> Value<T>` closure.
pub trait InputProvider<T>: Send + 'static {
    /// Read the value to use as input.
    fn provide(&self) -> Value<T>;

    /// Task the consumer should wait for before it starts, if any.
    fn dependency(&self) -> Option<Arc<dyn Schedulable>> {
        None
    }
}

impl<In, Out> InputProvider<Out> for Task<In, Out>
where
    In: Send + 'static,
    Out: Clone + Send + 'static,
{
    fn provide(&self) -> Value<Out> {
        self.output()
    }

    fn dependency(&self) -> Option<Arc<dyn Schedulable>> {
        Some(Arc::new(self.clone()))
    }
}

impl<T, F> InputProvider<T> for F
where
    F: Fn() -> Value<T> + Send + 'static,
{
    fn provide(&self) -> Value<T> {
        self()
    }
}

/// Everything behind the task's lock. Closures are owned here and dropped on the
/// terminal transition, which breaks cycles between a task and closures capturing it.
struct Slots<In, Out> {
    input: Value<In>,
    output: Value<Out>,
    body: Option<Body<In, Out>>,
    on_cancel: Option<CancelHandler<In, Out>>,
    completion: Option<(Arc<dyn Dispatch>, CompletionHandler<In, Out>)>,
    preconditions: Preconditions<Task<In, Out>>,
    resolver: Option<InputResolver<In>>,
    dependencies: Vec<Arc<dyn Schedulable>>,
    waiters: Vec<oneshot::Sender<()>>,
}

struct Shared<In, Out> {
    id: TaskId,
    name: Option<String>,
    state: AtomicU8,
    cancelled: AtomicBool,
    paused: AtomicBool,
    guard: OnceGuard,
    slots: Mutex<Slots<In, Out>>,
}

/// A single unit of asynchronous work with typed input and output.
///
/// `Task` is a cheap, clonable handle; every clone refers to the same task. The caller
/// and the queue share it until it finishes.
///
/// State transitions happen under the task's lock, so readers of [`Task::state`] never
/// observe a regression, and the output is written exactly once.
///
/// # Examples
///
/// ```
/// use taskline::{Inline, OpError, Task};
///
/// let parse: Task<String, i32> = Task::named("parse");
/// parse.set_input("42".to_string());
/// parse.on_start(|task| {
///     let parsed = task
///         .take_input()
///         .into_value()
///         .and_then(|text| text.parse::<i32>().map_err(OpError::failed));
///     task.finish_with(parsed);
/// });
/// parse.on_complete(Inline, |task| println!("{:?} done", task.name()));
///
/// parse.start();
/// assert!(parse.is_finished());
/// assert_eq!(parse.outcome().value(), Some(&42));
/// ```
pub struct Task<In, Out> {
    shared: Arc<Shared<In, Out>>,
}

impl<In, Out> Clone for Task<In, Out> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<In, Out> Default for Task<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out> Task<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a task with a name used in `Debug` output and log fields.
    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<String>) -> Self {
        let id = TaskId::next();

        #[cfg(feature = "tracing")]
        trace!(task_id = id.0, name = ?name, "created task");

        Self {
            shared: Arc::new(Shared {
                id,
                name,
                state: AtomicU8::new(State::Initial as u8),
                cancelled: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                guard: OnceGuard::new(),
                slots: Mutex::new(Slots {
                    input: Value::none(),
                    output: Value::none(),
                    body: None,
                    on_cancel: None,
                    completion: None,
                    preconditions: Preconditions::new(),
                    resolver: None,
                    dependencies: Vec::new(),
                    waiters: Vec::new(),
                }),
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }

    pub fn state(&self) -> State {
        State::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn is_executing(&self) -> bool {
        self.state() == State::Executing
    }

    pub fn is_finished(&self) -> bool {
        self.state() == State::Finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    /// Whether a queue may start this task now.
    ///
    /// While `Initial`, a task is ready when it is cancelled (so it can finish straight
    /// away) or when it is not paused and all of its dependencies have finished. Once
    /// started it is always ready.
    pub fn is_ready(&self) -> bool {
        if self.state() != State::Initial || self.is_cancelled() {
            return true;
        }
        if self.is_paused() {
            return false;
        }
        let slots = self.shared.slots.lock();
        slots.dependencies.iter().all(|dep| dep.is_finished())
    }

    pub fn dependencies(&self) -> Vec<Arc<dyn Schedulable>> {
        self.shared.slots.lock().dependencies.clone()
    }

    // ------------------------------------------------------------------------------
    // Configuration. Only effective while Initial; later calls are ignored.
    // ------------------------------------------------------------------------------

    pub fn set_input(&self, input: In) {
        self.configure("set_input", |slots| slots.input = Value::present(input));
    }

    /// Add an evaluator run once, in registration order, before the body.
    pub fn add_precondition<F>(&self, evaluator: F)
    where
        F: FnOnce(&Task<In, Out>) -> Instruction + Send + 'static,
    {
        self.configure("add_precondition", |slots| slots.preconditions.push(evaluator));
    }

    /// Set the handler called, at most once, when the task is cancelled while executing.
    pub fn on_cancel<F>(&self, handler: F)
    where
        F: FnOnce(&Task<In, Out>) + Send + 'static,
    {
        self.configure("on_cancel", |slots| slots.on_cancel = Some(Box::new(handler)));
    }

    /// Set the body. It receives a handle to the task and must eventually finish it.
    pub fn on_start<F>(&self, body: F)
    where
        F: FnOnce(Task<In, Out>) + Send + 'static,
    {
        self.configure("on_start", |slots| slots.body = Some(Box::new(body)));
    }

    /// Take this task's input from `provider` when it starts, and wait for the
    /// provider's task (if any) before becoming ready.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskline::Task;
    ///
    /// let fetch: Task<(), u32> = Task::new();
    /// fetch.on_start(|task| task.finish(7));
    ///
    /// let double: Task<u32, u32> = Task::new();
    /// double.link_input(fetch.clone());
    /// double.on_start(|task| {
    ///     let n = task.take_input().into_value().unwrap_or_default();
    ///     task.finish(n * 2);
    /// });
    ///
    /// assert!(!double.is_ready());
    /// fetch.start();
    /// assert!(double.is_ready());
    /// double.start();
    /// assert_eq!(double.outcome().value(), Some(&14));
    /// ```
    pub fn link_input<P>(&self, provider: P)
    where
        P: InputProvider<In>,
    {
        let dependency = provider.dependency();
        self.install_resolver(provider, dependency);
    }

    /// Like [`Task::link_input`] but without declaring a scheduling dependency.
    pub fn link_input_detached<P>(&self, provider: P)
    where
        P: InputProvider<In>,
    {
        self.install_resolver(provider, None);
    }

    fn install_resolver<P>(&self, provider: P, dependency: Option<Arc<dyn Schedulable>>)
    where
        P: InputProvider<In>,
    {
        #[cfg(feature = "tracing")]
        debug!(
            task_id = self.shared.id.0,
            dependency_id = ?dependency.as_ref().map(|dep| dep.id().0),
            "linking input"
        );

        self.configure("link_input", |slots| {
            slots.resolver = Some(Box::new(move || provider.provide()));
            slots.dependencies.extend(dependency);
        });
    }

    /// Declare that this task must not start before `dependency` finishes.
    pub fn add_dependency<D>(&self, dependency: &D)
    where
        D: Schedulable + Clone + 'static,
    {
        let dependency: Arc<dyn Schedulable> = Arc::new(dependency.clone());

        #[cfg(feature = "tracing")]
        debug!(
            task_id = self.shared.id.0,
            dependency_id = dependency.id().0,
            "adding dependency"
        );

        self.configure("add_dependency", |slots| slots.dependencies.push(dependency));
    }

    /// Hold the task back from queues. Only meaningful while `Initial`.
    pub fn pause(&self) {
        self.configure("pause", |_| self.shared.paused.store(true, Ordering::SeqCst));
    }

    pub fn resume(&self) {
        self.configure("resume", |_| self.shared.paused.store(false, Ordering::SeqCst));
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn configure<F>(&self, operation: &'static str, apply: F) -> bool
    where
        F: FnOnce(&mut Slots<In, Out>),
    {
        let mut slots = self.shared.slots.lock();
        let state = self.state();
        if state != State::Initial {
            #[cfg(feature = "tracing")]
            warn!(
                task_id = self.shared.id.0,
                %state,
                operation,
                "ignoring configuration of a task that has already started"
            );
            return false;
        }
        apply(&mut slots);
        true
    }

    // ------------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------------

    /// Deliver the finished task to `handler` on `dispatch`.
    ///
    /// Only the first registration counts. If the task has already finished, the handler
    /// is dispatched immediately; otherwise it is dispatched once when the task finishes.
    pub fn on_complete<D, F>(&self, dispatch: D, handler: F)
    where
        D: Dispatch + 'static,
        F: FnOnce(Task<In, Out>) + Send + 'static,
    {
        let registered = self
            .shared
            .guard
            .perform_once(Action::RegisterCompletion, || {
                let dispatch: Arc<dyn Dispatch> = Arc::new(dispatch);
                let handler: CompletionHandler<In, Out> = Box::new(handler);

                let immediate = {
                    let mut slots = self.shared.slots.lock();
                    if self.is_finished() {
                        Some((dispatch, handler))
                    } else {
                        slots.completion = Some((dispatch, handler));
                        None
                    }
                };

                if let Some((dispatch, handler)) = immediate {
                    self.deliver(dispatch, handler);
                }
            });

        if registered.is_none() {
            #[cfg(feature = "tracing")]
            warn!(
                task_id = self.shared.id.0,
                "ignoring second completion handler registration"
            );
        }
    }

    fn deliver(&self, dispatch: Arc<dyn Dispatch>, handler: CompletionHandler<In, Out>) {
        #[cfg(feature = "tracing")]
        trace!(task_id = self.shared.id.0, "dispatching completion handler");

        let task = self.clone();
        dispatch.dispatch(async move { handler(task) }.boxed());
    }

    /// Resolves once the task has finished, or once every handle to an unfinished task
    /// has been dropped.
    pub fn finished(&self) -> BoxFuture<'static, ()> {
        let receiver = {
            let mut slots = self.shared.slots.lock();
            if self.is_finished() {
                None
            } else {
                let (sender, receiver) = oneshot::channel();
                slots.waiters.push(sender);
                Some(receiver)
            }
        };

        async move {
            if let Some(receiver) = receiver {
                let _ = receiver.await;
            }
        }
        .boxed()
    }

    /// Wait for the task to finish and return its outcome.
    pub async fn join(&self) -> Outcome<Out>
    where
        Out: Clone,
    {
        self.finished().await;
        self.outcome()
    }

    // ------------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------------

    /// Submit the task. Called once by the queue that owns it.
    ///
    /// A task cancelled before it starts goes straight to `Finished` with a cancelled
    /// output; neither its preconditions nor its body run.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), fields(task_id = self.shared.id.0))
    )]
    pub fn start(&self) {
        let proceed = {
            let _slots = self.shared.slots.lock();
            let state = self.state();
            if state != State::Initial {
                #[cfg(feature = "tracing")]
                warn!(%state, "ignoring start of a task that has already started");
                return;
            }
            if self.is_cancelled() {
                false
            } else {
                self.advance(State::Executing);
                true
            }
        };

        if !proceed {
            #[cfg(feature = "tracing")]
            debug!("task cancelled before start, finishing without running");

            self.complete(Value::cancelled());
            return;
        }

        #[cfg(feature = "tracing")]
        debug!("task executing");

        self.execute();
    }

    fn execute(&self) {
        let resolver = self.shared.slots.lock().resolver.take();
        if let Some(resolve) = resolver {
            match catch_panic(resolve) {
                Ok(input) => self.shared.slots.lock().input = input,
                Err(message) => {
                    self.fail_with_panic("input provider", message);
                    return;
                }
            }
        }

        let mut preconditions = mem::take(&mut self.shared.slots.lock().preconditions);
        let instruction = match catch_panic(|| preconditions.evaluate(self)) {
            Ok(instruction) => instruction,
            Err(message) => {
                self.fail_with_panic("precondition", message);
                return;
            }
        };

        match instruction {
            Instruction::Continue => {}
            Instruction::Cancel => {
                #[cfg(feature = "tracing")]
                debug!(task_id = self.shared.id.0, "precondition cancelled task");

                self.shared.cancelled.store(true, Ordering::SeqCst);
                self.complete(Value::cancelled());
                return;
            }
            Instruction::Fail(error) => {
                #[cfg(feature = "tracing")]
                debug!(task_id = self.shared.id.0, %error, "precondition failed");

                self.complete(Value::failed(error));
                return;
            }
        }

        // Cancelled while preconditions ran
        if self.is_cancelled() {
            self.complete(Value::cancelled());
            return;
        }

        let body = self.shared.slots.lock().body.take();
        match body {
            Some(body) => {
                let task = self.clone();
                if let Err(message) = catch_panic(move || body(task)) {
                    self.fail_with_panic("body", message);
                }
            }
            None => {
                self.complete(Value::failed(OpError::Unimplemented));
            }
        }
    }

    /// Finish with [`OpError::Panicked`]. A no-op if the closure already finished the task.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn fail_with_panic(&self, stage: &'static str, message: String) {
        #[cfg(feature = "tracing")]
        error!(
            task_id = self.shared.id.0,
            stage,
            panic_message = %message,
            "task closure panicked"
        );

        self.complete(Value::failed(OpError::Panicked { message }));
    }

    /// Request cancellation.
    ///
    /// Sets the sticky cancelled flag and, if the task is executing, calls the
    /// cancellation handler on this thread. Only the first call has an effect. Cancelling
    /// a finished task changes nothing.
    pub fn cancel(&self) {
        let accepted = self.shared.guard.perform_once(Action::Cancel, || {
            let handler = {
                let mut slots = self.shared.slots.lock();
                match self.state() {
                    State::Finished => return,
                    State::Initial => {
                        self.shared.cancelled.store(true, Ordering::SeqCst);
                        None
                    }
                    State::Executing => {
                        self.shared.cancelled.store(true, Ordering::SeqCst);
                        slots.on_cancel.take()
                    }
                }
            };

            #[cfg(feature = "tracing")]
            debug!(
                task_id = self.shared.id.0,
                has_handler = handler.is_some(),
                "task cancelled"
            );

            if let Some(handler) = handler {
                handler(self);
            }
        });

        if accepted.is_none() {
            #[cfg(feature = "tracing")]
            trace!(task_id = self.shared.id.0, "ignoring repeated cancel");
        }
    }

    pub fn finish(&self, output: Out) {
        self.finish_value(Value::present(output));
    }

    pub fn finish_with_error(&self, error: OpError) {
        self.finish_value(Value::failed(error));
    }

    /// Finish with a cancelled output, typically from a cancellation handler.
    pub fn finish_cancelled(&self) {
        self.finish_value(Value::cancelled());
    }

    pub fn finish_with(&self, result: Result<Out, OpError>) {
        self.finish_value(result.into());
    }

    /// Store `output` and move to `Finished`.
    ///
    /// Only effective while executing, and only for the first caller; every other call
    /// is ignored.
    pub fn finish_value(&self, output: Value<Out>) {
        let state = self.state();
        if state != State::Executing {
            #[cfg(feature = "tracing")]
            warn!(
                task_id = self.shared.id.0,
                %state,
                "ignoring finish of a task that is not executing"
            );
            return;
        }

        if !self.complete(output) {
            #[cfg(feature = "tracing")]
            trace!(task_id = self.shared.id.0, "ignoring repeated finish");
        }
    }

    /// The terminal transition. Guarded so it runs at most once.
    fn complete(&self, output: Value<Out>) -> bool {
        self.shared
            .guard
            .perform_once(Action::Finish, || {
                let (completion, waiters, released) = {
                    let mut slots = self.shared.slots.lock();
                    slots.output = output;
                    self.advance(State::Finished);

                    let released = (
                        slots.body.take(),
                        slots.on_cancel.take(),
                        mem::take(&mut slots.preconditions),
                        slots.resolver.take(),
                        mem::take(&mut slots.dependencies),
                    );
                    (
                        slots.completion.take(),
                        mem::take(&mut slots.waiters),
                        released,
                    )
                };
                // Captured state is dropped outside the lock
                drop(released);

                #[cfg(feature = "tracing")]
                debug!(
                    task_id = self.shared.id.0,
                    cancelled = self.is_cancelled(),
                    waiters = waiters.len(),
                    "task finished"
                );

                for waiter in waiters {
                    let _ = waiter.send(());
                }

                if let Some((dispatch, handler)) = completion {
                    self.deliver(dispatch, handler);
                }
            })
            .is_some()
    }

    fn advance(&self, state: State) {
        self.shared.state.fetch_max(state as u8, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------------

    pub fn input(&self) -> Value<In>
    where
        In: Clone,
    {
        self.shared.slots.lock().input.clone()
    }

    /// Move the input out, leaving [`Value::none`] behind. Meant for the body.
    pub fn take_input(&self) -> Value<In> {
        mem::take(&mut self.shared.slots.lock().input)
    }

    /// The stored output; [`Value::none`] until the task finishes.
    pub fn output(&self) -> Value<Out>
    where
        Out: Clone,
    {
        self.shared.slots.lock().output.clone()
    }

    /// The output projected through the cancelled flag.
    pub fn outcome(&self) -> Outcome<Out>
    where
        Out: Clone,
    {
        Outcome::project(self.output(), self.is_cancelled())
    }
}

// Run a user closure, turning a panic into its message
fn catch_panic<R, F>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(&*payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<In, Out> fmt::Debug for Task<In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field(
                "state",
                &State::from_u8(self.shared.state.load(Ordering::SeqCst)),
            )
            .field("cancelled", &self.shared.cancelled.load(Ordering::SeqCst))
            .finish()
    }
}

impl<In, Out> Schedulable for Task<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    fn id(&self) -> TaskId {
        Task::id(self)
    }

    fn is_ready(&self) -> bool {
        Task::is_ready(self)
    }

    fn is_executing(&self) -> bool {
        Task::is_executing(self)
    }

    fn is_finished(&self) -> bool {
        Task::is_finished(self)
    }

    fn is_cancelled(&self) -> bool {
        Task::is_cancelled(self)
    }

    fn start(&self) {
        Task::start(self)
    }

    fn cancel(&self) {
        Task::cancel(self)
    }

    fn finished(&self) -> BoxFuture<'static, ()> {
        Task::finished(self)
    }

    fn dependencies(&self) -> Vec<Arc<dyn Schedulable>> {
        Task::dependencies(self)
    }
}
