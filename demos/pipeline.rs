//! # Pipeline
//!
//! A three-stage pipeline where each stage finishes asynchronously on Tokio, with a
//! watchdog that cancels the slow stage.
//!
//! ## What You'll Learn
//! - Chaining tasks with `link_input`
//! - Finishing a task from a spawned future
//! - Cooperative cancellation through `on_cancel`
//! - Awaiting a task with `join`
//!
//! ```text
//! fetch ──▶ parse ──▶ slow_report
//!                         ▲
//!              watchdog ──┘ cancel after 50ms
//! ```
//!
//! ## Running This Example
//! ```bash
//! cargo run --example pipeline
//! ```

use std::time::Duration;

use taskline::{OpError, Outcome, Task, TaskQueue};
use tokio::sync::Notify;

#[tokio::main]
async fn main() {
    let fetch: Task<(), String> = Task::named("fetch");
    fetch.on_start(|t| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            t.finish("3,1,4,1,5,9,2,6".to_string());
        });
    });

    let parse: Task<String, Vec<u32>> = Task::named("parse");
    parse.link_input(fetch.clone());
    parse.on_start(|t| {
        let parsed = t.take_input().into_value().and_then(|text| {
            text.split(',')
                .map(|part| part.trim().parse::<u32>().map_err(OpError::failed))
                .collect::<Result<Vec<_>, _>>()
        });
        t.finish_with(parsed);
    });

    // Waits far longer than the watchdog allows
    let stop = std::sync::Arc::new(Notify::new());
    let report: Task<Vec<u32>, u32> = Task::named("slow_report");
    report.link_input(parse.clone());
    let cancelled = std::sync::Arc::clone(&stop);
    report.on_cancel(move |_| cancelled.notify_one());
    report.on_start(move |t| {
        tokio::spawn(async move {
            let numbers = t.take_input().into_value().unwrap_or_default();
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(10)) => {
                    t.finish(numbers.iter().sum());
                }
                _ = stop.notified() => t.finish_cancelled(),
            }
        });
    });

    let queue = TaskQueue::new();
    queue.add(report.clone());
    queue.add(parse.clone());
    queue.add(fetch.clone());

    let watchdog = report.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        watchdog.cancel();
    });

    queue
        .run(|job| {
            tokio::spawn(job);
        })
        .await
        .expect("queue run failed");

    println!("parse  = {:?}", parse.outcome().value());
    match report.join().await {
        Outcome::Succeeded(sum) => println!("report = {}", sum),
        Outcome::Failed(error) => println!("report failed: {}", error),
        Outcome::Cancelled => println!("report cancelled by watchdog"),
    }
}
