//! Once-only Task Lifecycle
//!
//! A small, runtime-agnostic abstraction for a single unit of asynchronous work that plugs
//! into an external work queue. A [`Task<In, Out>`] carries a typed input and output, can
//! be chained to other tasks, gates its body behind preconditions, and guarantees that
//! cancellation, finishing and completion delivery each happen at most once, however many
//! threads race for them.
//!
//! # Features
//!
//! - **Strict lifecycle**: `Initial` → `Executing` → `Finished`, never backwards. See [`State`].
//! - **Exactly-once actions**: racing `cancel()`/`finish()`/`on_complete()` calls are all
//!   accepted, but only one of each has an effect. See [`OnceGuard`].
//! - **Typed values with reasons**: [`Value<T>`] tells "not finished" from "cancelled" from
//!   "failed", and [`Outcome<T>`] projects it for consumers, with cancellation winning.
//! - **Preconditions**: evaluators run once before the body; failures aggregate and take
//!   precedence over cancellation. See [`Preconditions`].
//! - **Chaining**: one task's output becomes another's input via [`Task::link_input`],
//!   optionally declaring a scheduling dependency.
//! - **Deferred delivery**: completion handlers run on a caller-chosen [`Dispatch`].
//! - **Runtime-agnostic**: the crate never spawns threads. Queues and dispatch contexts
//!   are whatever you plug in (Tokio, async-std, smol, a plain thread, ...).
//!
//! # Quick Start
//!
//! ```
//! use taskline::{Inline, Outcome, Task};
//!
//! let source: Task<(), u32> = Task::named("source");
//! source.on_start(|task| task.finish(20));
//!
//! let add_one: Task<u32, u32> = Task::named("add_one");
//! add_one.link_input(source.clone());
//! add_one.on_start(|task| {
//!     let n = task.take_input().into_value().unwrap_or_default();
//!     task.finish(n + 1);
//! });
//! add_one.on_complete(Inline, |task| {
//!     assert!(matches!(task.outcome(), Outcome::Succeeded(21)));
//! });
//!
//! // A queue would do this based on readiness
//! assert!(!add_one.is_ready());
//! source.start();
//! assert!(add_one.is_ready());
//! add_one.start();
//!
//! assert_eq!(add_one.outcome().value(), Some(&21));
//! ```
//!
//! # Asynchronous Bodies
//!
//! A body does not have to finish before it returns. It can hand its [`Task`] handle to
//! another thread or future and call a `finish*` method later:
//!
//! ```no_run
//! # use taskline::Task;
//! # async {
//! let fetch: Task<String, usize> = Task::new();
//! fetch.set_input("https://example.com".to_string());
//! fetch.on_start(|task| {
//!     tokio::spawn(async move {
//!         let url = task.take_input().into_value().unwrap_or_default();
//!         task.finish(url.len());
//!     });
//! });
//!
//! fetch.start();
//! let outcome = fetch.join().await;
//! # };
//! ```
//!
//! # Cancellation
//!
//! Cancellation is cooperative. [`Task::cancel`] sets a sticky flag and, if the task is
//! executing, calls the handler registered with [`Task::on_cancel`]. The body stays
//! responsible for finishing. A task cancelled before it starts finishes as cancelled
//! without running its preconditions or body.
//!
//! # Error Handling
//!
//! Failures never come back as synchronous errors. They end up in the task's output and
//! are observed through [`Task::outcome`] once the task has finished:
//!
//! - a precondition failure becomes `Outcome::Failed`, with [`OpError::Multiple`] when
//!   several failed
//! - a body, precondition or input provider that panics becomes
//!   `Outcome::Failed(OpError::Panicked { .. })`
//! - a task started without a body becomes `Outcome::Failed(OpError::Unimplemented)`
//!
//! Usage errors (configuring after start, a second completion handler, finishing a task
//! that is not executing) are ignored. With the `tracing` feature they are reported at
//! `WARN` level.
//!
//! # Optional Tracing Support
//!
//! Enable the `tracing` feature to get structured logs of every lifecycle transition.
//! When the feature is off, the logging code is compiled out.
//!
//! ```toml
//! [dependencies]
//! taskline = { version = "0.1", features = ["tracing"] }
//! tracing-subscriber = "0.3"
//! ```
//!
//! ## Log Levels
//!
//! - **INFO**: queue run start/completion
//! - **DEBUG**: start, finish, cancel, input linking, dependencies
//! - **TRACE**: precondition results, completion dispatch, queue submission
//! - **WARN**: ignored usage errors
//! - **ERROR**: panicking task closures, stalled or concurrent queue runs
//!
//! ```bash
//! RUST_LOG=taskline=debug cargo run
//! ```

mod dispatch;
mod error;
mod once;
mod outcome;
mod precondition;
mod queue;
mod schedule;
mod task;
mod types;
mod value;

// Public re-exports
pub use dispatch::{Dispatch, Inline, Job};
pub use error::{OpError, QueueError, QueueResult};
pub use once::{Action, OnceGuard};
pub use outcome::Outcome;
pub use precondition::{Instruction, Preconditions};
pub use queue::TaskQueue;
pub use schedule::Schedulable;
pub use task::{InputProvider, Task};
pub use types::{State, TaskId};
pub use value::{Reason, Value};
