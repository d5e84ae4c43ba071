//! The host scheduling capability consumed by [`Deferred`](crate::Deferred).
//!
//! The cell itself implements no event loop. Whatever mechanism the host
//! program uses to run work "on a later turn" is handed in as a
//! [`Schedule`] implementation at construction. Two reference hosts are
//! provided: [`TaskQueue`], a deterministic FIFO the caller pumps by hand,
//! and [`Inline`], which runs each task on the thread that submitted it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The capability to run a task at a later point in program execution.
///
/// Contract: tasks submitted from the same synchronous segment run after
/// that segment completes, in submission order. The continuation dispatch
/// ordering of [`Deferred`](crate::Deferred) is only as good as the host's
/// adherence to this.
pub trait Schedule: Send + Sync {
    /// Accept a task to run later.
    fn schedule(&self, task: Task);
}

/// Any `Fn(Task)` closure is a scheduler, so an existing event loop can be
/// bridged without a newtype.
impl<F> Schedule for F
where
    F: Fn(Task) + Send + Sync,
{
    fn schedule(&self, task: Task) {
        self(task)
    }
}

/// A deterministic FIFO task queue, pumped by the caller.
///
/// Tasks run strictly in submission order. Tasks submitted while the queue
/// is being pumped land at the back and run in the same pump.
///
/// # Examples
///
/// ```
/// use deferred_cell::{Schedule, TaskQueue};
///
/// let queue = TaskQueue::new();
/// queue.schedule(Box::new(|| println!("on the next turn")));
/// assert_eq!(queue.run_until_idle(), 1);
/// ```
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl TaskQueue {
    /// An empty queue.
    pub fn new() -> Self {
        TaskQueue {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Whether nothing is waiting to run.
    pub fn is_idle(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    /// Pop and run the frontmost task. Returns `false` if the queue was
    /// empty. The queue is unlocked while the task runs, so tasks may
    /// schedule further tasks.
    pub fn run_next(&self) -> bool {
        let task = self.tasks.lock().unwrap().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks scheduled along
    /// the way. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Schedule for TaskQueue {
    fn schedule(&self, task: Task) {
        self.tasks.lock().unwrap().push_back(task);
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("queued", &self.tasks.lock().unwrap().len())
            .finish()
    }
}

/// A degenerate host that runs every task immediately, on the submitting
/// thread's stack.
///
/// With this host, queued continuations run inside the `settle` call that
/// drained them. Useful when the settling side is a plain thread rather
/// than an event loop, as in the thread-and-timer tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inline;

impl Schedule for Inline {
    fn schedule(&self, task: Task) {
        task();
    }
}
