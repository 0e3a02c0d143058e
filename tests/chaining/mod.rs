//! Input chaining tests
//!
//! One task's finished output becomes another task's input.

use crate::common::constant;
use taskline::{OpError, Outcome, Reason, Schedulable, Task, Value};

#[test]
fn test_linked_task_receives_upstream_output() {
    let upstream = constant(String::from("hello"));
    let downstream: Task<String, usize> = Task::new();
    downstream.link_input(upstream.clone());
    downstream.on_start(|t| {
        let text = t.take_input().into_value().unwrap_or_default();
        t.finish(text.len());
    });

    assert_eq!(downstream.dependencies().len(), 1);
    assert_eq!(downstream.dependencies()[0].id(), upstream.id());

    upstream.start();
    downstream.start();

    assert_eq!(downstream.outcome().value(), Some(&5));
}

#[test]
fn test_three_stage_pipeline() {
    let a = constant(2);
    let b: Task<i32, i32> = Task::named("square");
    let c: Task<i32, String> = Task::named("render");

    b.link_input(a.clone());
    b.on_start(|t| {
        let n = t.take_input().into_value().unwrap_or_default();
        t.finish(n * n);
    });
    c.link_input(b.clone());
    c.on_start(|t| {
        let n = t.take_input().into_value().unwrap_or_default();
        t.finish(format!("result={}", n));
    });

    assert!(!c.is_ready());
    a.start();
    assert!(!c.is_ready());
    b.start();
    assert!(c.is_ready());
    c.start();

    assert_eq!(c.outcome().value().map(String::as_str), Some("result=4"));
}

#[test]
fn test_failed_upstream_propagates_as_absent_input() {
    let upstream: Task<(), i32> = Task::new();
    upstream.on_start(|t| t.finish_with_error(OpError::msg("upstream broke")));

    let downstream: Task<i32, i32> = Task::new();
    downstream.link_input(upstream.clone());
    downstream.on_start(|t| match t.take_input() {
        Value::Present(n) => t.finish(n),
        Value::Absent(Reason::Failed(error)) => t.finish_with_error(error),
        Value::Absent(_) => t.finish_cancelled(),
    });

    upstream.start();
    downstream.start();

    match downstream.outcome() {
        Outcome::Failed(error) => assert_eq!(error.to_string(), "task failed: upstream broke"),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_detached_link_declares_no_dependency() {
    let upstream = constant(8);
    let downstream: Task<i32, i32> = Task::new();
    downstream.link_input_detached(upstream.clone());

    assert!(downstream.dependencies().is_empty());
    assert!(downstream.is_ready());

    // Started early, the input is whatever the upstream holds right now
    downstream.on_start(|t| {
        let input = t.take_input();
        t.finish_with(input.into_value());
    });
    downstream.start();

    assert!(matches!(
        downstream.outcome(),
        Outcome::Failed(OpError::NoValue)
    ));
}

#[test]
fn test_link_after_start_is_ignored() {
    let upstream = constant(1);
    let downstream: Task<i32, i32> = Task::new();
    downstream.on_start(|_| {});
    downstream.start();

    downstream.link_input(upstream.clone());

    assert!(downstream.dependencies().is_empty());
}

#[test]
fn test_input_resolved_at_start_not_at_link() {
    let upstream: Task<(), i32> = Task::new();
    let downstream: Task<i32, i32> = Task::new();
    downstream.link_input(upstream.clone());
    downstream.set_input(100);
    downstream.on_start(|t| {
        let n = t.take_input().into_value().unwrap_or_default();
        t.finish(n);
    });

    upstream.on_start(|t| t.finish(7));
    upstream.start();
    downstream.start();

    assert_eq!(downstream.outcome().value(), Some(&7));
}
