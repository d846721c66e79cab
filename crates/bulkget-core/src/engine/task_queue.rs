//! Shared task queue drained by the worker pool
//!
//! Filled once before the run and never refilled. Concurrent takers each
//! receive a distinct task, and a failed task is never re-queued.

use crate::manifest::DownloadTask;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO queue of pending tasks shared by all workers
pub struct TaskQueue {
    tasks: Mutex<VecDeque<DownloadTask>>,
}

impl TaskQueue {
    /// Build a queue from parsed tasks
    pub fn new(tasks: impl IntoIterator<Item = DownloadTask>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into_iter().collect()),
        }
    }

    /// Pop the next task, or None immediately when the queue is empty.
    /// Two concurrent callers never receive the same task.
    pub fn take(&self) -> Option<DownloadTask> {
        self.tasks.lock().pop_front()
    }

    /// Number of tasks still waiting
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn task(i: usize) -> DownloadTask {
        DownloadTask::new(format!("http://example.com/{i}"), format!("{i}.bin"))
    }

    #[test]
    fn take_returns_none_when_empty() {
        let queue = TaskQueue::new([]);
        assert!(queue.is_empty());
        assert!(queue.take().is_none());
    }

    #[test]
    fn drains_in_insertion_order() {
        let queue = TaskQueue::new([task(0), task(1), task(2)]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.take().unwrap().url, "http://example.com/0");
        assert_eq!(queue.take().unwrap().url, "http://example.com/1");
        assert_eq!(queue.take().unwrap().url, "http://example.com/2");
        assert!(queue.take().is_none());
    }

    #[test]
    fn concurrent_takers_each_see_a_task_exactly_once() {
        let queue = TaskQueue::new((0..100).map(task));
        let seen = Mutex::new(Vec::new());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while let Some(task) = queue.take() {
                        seen.lock().push(task.url);
                    }
                });
            }
        });

        let mut seen = seen.into_inner();
        assert_eq!(seen.len(), 100);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 100, "a task was delivered twice");
    }
}
