//! Tests for the finish operations

use taskline::{OpError, Outcome, Reason, State, Task};
use test_case::test_case;

#[test]
fn test_only_first_finish_counts() {
    let task: Task<(), i32> = Task::new();
    task.on_start(|t| {
        t.finish(1);
        t.finish(2);
        t.finish_with_error(OpError::msg("late"));
        t.finish_cancelled();
    });
    task.start();

    assert_eq!(task.output().try_get(), Some(&1));
    assert!(!task.is_cancelled());
}

#[test]
fn test_finish_before_start_has_no_effect() {
    let task: Task<(), i32> = Task::new();
    task.finish(9);

    assert_eq!(task.state(), State::Initial);
    assert!(matches!(task.output().reason(), Some(Reason::NoValue)));
}

#[test]
fn test_finish_with_error_fails_outcome() {
    let task: Task<(), i32> = Task::new();
    task.on_start(|t| t.finish_with_error(OpError::msg("disk full")));
    task.start();

    match task.outcome() {
        Outcome::Failed(error) => assert_eq!(error.to_string(), "task failed: disk full"),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test_case(Ok(3), true; "ok result succeeds")]
#[test_case(Err(OpError::msg("nope")), false; "err result fails")]
fn test_finish_with_result(result: Result<i32, OpError>, succeeded: bool) {
    let task: Task<(), i32> = Task::new();
    task.on_start(move |t| t.finish_with(result));
    task.start();

    assert_eq!(task.outcome().is_succeeded(), succeeded);
    assert_eq!(task.outcome().is_failed(), !succeeded);
}

#[test]
fn test_finish_with_cancelled_error_records_cancelled_reason() {
    let task: Task<(), i32> = Task::new();
    task.on_start(|t| t.finish_with(Err(OpError::Cancelled)));
    task.start();

    assert!(matches!(task.output().reason(), Some(Reason::Cancelled)));
    assert!(task.outcome().is_cancelled());
}

#[test]
fn test_output_value_reports_no_value_for_any_absence() {
    let task: Task<(), i32> = Task::new();
    task.on_start(|t| t.finish_with_error(OpError::msg("broken")));
    task.start();

    assert!(matches!(task.output().value(), Err(OpError::NoValue)));
}
