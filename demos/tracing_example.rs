//! # Tracing Example
//!
//! This example demonstrates how to use the optional tracing feature to see every
//! lifecycle transition of a small group of tasks.
//!
//! ## Running This Example
//!
//! ```bash
//! # With default log level (info)
//! cargo run --example tracing_example --features tracing
//!
//! # With debug level (start, finish, cancel, input linking)
//! RUST_LOG=taskline=debug cargo run --example tracing_example --features tracing
//!
//! # With trace level (preconditions, completion dispatch, queue submission)
//! RUST_LOG=taskline=trace cargo run --example tracing_example --features tracing
//! ```
//!
//! ## Log Levels
//!
//! - **INFO**: Queue run start/completion
//! - **DEBUG**: Task start, finish, cancellation and input linking
//! - **TRACE**: Precondition results, completion dispatch, queue submission
//! - **WARN**: Ignored usage errors
//! - **ERROR**: Panicking task closures
//!

use taskline::{Inline, Instruction, OpError, Task, TaskQueue};

use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with environment filter
    // Use RUST_LOG environment variable to control log level
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskline=info")),
        )
        .init();

    println!("=== Task Lifecycle with Tracing ===\n");

    let a: Task<(), i32> = Task::named("a");
    a.on_start(|t| t.finish(2));

    let b: Task<i32, i32> = Task::named("b");
    b.link_input(a.clone());
    b.on_start(|t| {
        let n = t.take_input().into_value().unwrap_or_default();
        t.finish(n + 3);
    });

    // Rejected by its precondition
    let guarded: Task<i32, i32> = Task::named("guarded");
    guarded.link_input(b.clone());
    guarded.add_precondition(|t| match t.input().try_get() {
        Some(n) if *n > 4 => Instruction::Fail(OpError::msg("input too large")),
        _ => Instruction::Continue,
    });
    guarded.on_start(|t| t.finish(0));

    // Cancelled before it ever runs
    let skipped: Task<(), ()> = Task::named("skipped");
    skipped.on_start(|t| t.finish(()));
    skipped.cancel();

    b.on_complete(Inline, |t| println!("b finished: {:?}", t.outcome()));

    let queue = TaskQueue::new();
    queue.add(guarded.clone());
    queue.add(b.clone());
    queue.add(a.clone());
    queue.add(skipped.clone());

    queue
        .run(|job| {
            tokio::spawn(job);
        })
        .await
        .expect("queue run failed");

    println!("\nResults:");
    println!("  a       = {:?}", a.outcome());
    println!("  b       = {:?}", b.outcome());
    println!("  guarded = {:?}", guarded.outcome());
    println!("  skipped = {:?}", skipped.outcome());

    println!("\n✓ Tracing example completed!");
    println!("\nTry running with different log levels:");
    println!("  RUST_LOG=taskline=debug cargo run --example tracing_example --features tracing");
    println!("  RUST_LOG=taskline=trace cargo run --example tracing_example --features tracing");
}
