//! Tests for tasks cancelled while still Initial

use crate::common::Counter;
use taskline::{Instruction, Outcome, Reason, State, Task};

#[test]
fn test_cancelled_initial_task_skips_body() {
    let runs = Counter::new();
    let counter = runs.clone();
    let task: Task<(), i32> = Task::new();
    task.on_start(move |t| {
        counter.hit();
        t.finish(1);
    });

    task.cancel();
    assert!(task.is_cancelled());
    assert_eq!(task.state(), State::Initial);

    task.start();

    assert_eq!(task.state(), State::Finished);
    assert!(matches!(task.outcome(), Outcome::Cancelled));
    assert!(matches!(task.output().reason(), Some(Reason::Cancelled)));
    assert_eq!(runs.get(), 0);
}

#[test]
fn test_cancelled_initial_task_skips_preconditions() {
    let evaluated = Counter::new();
    let counter = evaluated.clone();
    let task: Task<(), ()> = Task::new();
    task.add_precondition(move |_| {
        counter.hit();
        Instruction::Continue
    });

    task.cancel();
    task.start();

    assert_eq!(evaluated.get(), 0);
    assert!(task.outcome().is_cancelled());
}

#[test]
fn test_cancel_handler_not_called_before_start() {
    let calls = Counter::new();
    let counter = calls.clone();
    let task: Task<(), ()> = Task::new();
    task.on_cancel(move |_| counter.hit());

    task.cancel();
    task.start();

    assert_eq!(calls.get(), 0);
    assert!(task.is_finished());
}

#[test]
fn test_cancelled_paused_task_is_ready() {
    let task: Task<(), ()> = Task::new();
    task.pause();
    assert!(!task.is_ready());

    task.cancel();
    assert!(task.is_ready());
}

#[test]
fn test_cancel_after_finish_changes_nothing() {
    let task: Task<(), i32> = Task::new();
    task.on_start(|t| t.finish(4));
    task.start();

    task.cancel();

    assert!(!task.is_cancelled());
    assert!(matches!(task.outcome(), Outcome::Succeeded(4)));
}
