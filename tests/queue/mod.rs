//! Work queue tests
//!
//! Drive tasks through the `Schedulable` boundary on real runtimes.

use std::sync::Arc;
use std::time::Duration;

use crate::common::{constant, thread_spawner, Counter, Journal};
use taskline::{QueueError, Schedulable, Task, TaskQueue};

fn tokio_spawner(job: futures::future::BoxFuture<'static, ()>) {
    tokio::spawn(job);
}

#[tokio::test]
async fn test_empty_queue_run_completes() {
    let queue = TaskQueue::new();
    queue.run(tokio_spawner).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_diamond_on_tokio() {
    let source = constant(10);
    let left: Task<i32, i32> = Task::named("left");
    let right: Task<i32, i32> = Task::named("right");
    let sink: Task<i32, i32> = Task::named("sink");

    left.link_input(source.clone());
    left.on_start(|t| {
        let n = t.take_input().into_value().unwrap_or_default();
        t.finish(n + 1);
    });
    right.link_input(source.clone());
    right.on_start(|t| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            let n = t.take_input().into_value().unwrap_or_default();
            t.finish(n * 2);
        });
    });

    // The sink reads left's output and waits on right explicitly
    sink.link_input(left.clone());
    sink.add_dependency(&right);
    let right_output = right.clone();
    sink.on_start(move |t| {
        let l = t.take_input().into_value().unwrap_or_default();
        let r = right_output.output().into_value().unwrap_or_default();
        t.finish(l + r);
    });

    let queue = TaskQueue::new();
    queue.add(sink.clone());
    queue.add(right.clone());
    queue.add(left.clone());
    queue.add(source.clone());

    queue.run(tokio_spawner).await.unwrap();

    // 11 + 20
    assert_eq!(sink.outcome().value(), Some(&31));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wide_fanout() {
    let queue = TaskQueue::new();
    let root = constant(1);
    queue.add(root.clone());

    let leaves: Vec<Task<i32, i32>> = (0..50)
        .map(|i| {
            let leaf: Task<i32, i32> = Task::new();
            leaf.link_input(root.clone());
            leaf.on_start(move |t| {
                let n = t.take_input().into_value().unwrap_or_default();
                t.finish(n + i);
            });
            queue.add(leaf.clone());
            leaf
        })
        .collect();

    queue.run(tokio_spawner).await.unwrap();

    let total: i32 = leaves
        .iter()
        .map(|leaf| *leaf.outcome().value().unwrap())
        .sum();
    assert_eq!(total, 50 + (0..50).sum::<i32>());
}

#[test]
fn test_queue_on_plain_threads() {
    let order = Journal::new();
    let first: Task<(), ()> = Task::new();
    let second: Task<(), ()> = Task::new();
    second.add_dependency(&first);

    let log = order.clone();
    first.on_start(move |t| {
        log.push("first");
        t.finish(());
    });
    let log = order.clone();
    second.on_start(move |t| {
        log.push("second");
        t.finish(());
    });

    let queue = TaskQueue::new();
    queue.add(second.clone());
    queue.add(first.clone());

    futures::executor::block_on(queue.run(thread_spawner)).unwrap();

    assert_eq!(order.events(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_paused_task_stalls_queue() {
    let task = constant(1);
    task.pause();

    let queue = TaskQueue::new();
    queue.add(task.clone());

    let result = queue.run(tokio_spawner).await;
    assert_eq!(result, Err(QueueError::Stalled { pending: 1 }));
    assert!(!task.is_finished());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_all_reaches_executing_tasks() {
    let cancels = Counter::new();
    let counter = cancels.clone();
    let task: Task<(), ()> = Task::new();
    task.on_cancel(move |t| {
        counter.hit();
        t.finish_cancelled();
    });
    task.on_start(|_| {
        // Waits for cancellation
    });

    let queue = Arc::new(TaskQueue::new());
    queue.add(task.clone());

    let runner = Arc::clone(&queue);
    let run = tokio::spawn(async move { runner.run(tokio_spawner).await });

    while !task.is_executing() {
        tokio::task::yield_now().await;
    }
    queue.cancel_all();

    run.await.unwrap().unwrap();
    assert_eq!(cancels.get(), 1);
    assert!(task.outcome().is_cancelled());
}

#[tokio::test]
async fn test_shared_schedulable_handles() {
    let a = constant(1);
    let b = constant("two");
    let handles: Vec<Arc<dyn Schedulable>> = vec![Arc::new(a.clone()), Arc::new(b.clone())];

    let queue = TaskQueue::new();
    for handle in handles {
        queue.add_shared(handle);
    }
    assert_eq!(queue.len(), 2);

    queue.run(tokio_spawner).await.unwrap();

    assert!(a.is_finished());
    assert!(b.is_finished());
    assert!(queue.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_input_provider_does_not_hang_run() {
    let task: Task<i32, i32> = Task::new();
    task.link_input_detached(|| -> taskline::Value<i32> { panic!("provider failed") });
    task.on_start(|t| t.finish(0));

    let queue = TaskQueue::new();
    queue.add(task.clone());
    queue.run(tokio_spawner).await.unwrap();

    assert!(task.outcome().is_failed());
}
