// Common test utilities and helpers for the test suite

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use taskline::Task;

/// Spawner that runs each submission on its own thread.
pub fn thread_spawner(job: BoxFuture<'static, ()>) {
    std::thread::spawn(move || futures::executor::block_on(job));
}

/// A source task that finishes with `value` as soon as it starts.
pub fn constant<T>(value: T) -> Task<(), T>
where
    T: Send + 'static,
{
    let task = Task::new();
    task.on_start(move |t| t.finish(value));
    task
}

/// A counter shared between a test and the closures it registers.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ordered record of named events.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: &'static str) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}
