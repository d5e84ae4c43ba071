//! Single-assignment deferred values with continuation chaining.
//!
//! A [`Deferred<T>`] starts pending, is settled exactly once by a producer
//! the caller supplies at construction, and delivers the value to every
//! continuation registered on it. [`then`](Deferred::then) derives a new
//! `Deferred` from an existing one and flattens callbacks that themselves
//! return a `Deferred`, so chains always yield single-level values.
//!
//! The cell owns no event loop. "Run this later" is a capability the host
//! passes in: anything implementing [`Schedule`]. The crate ships two
//! reference hosts: a hand-pumped FIFO [`TaskQueue`] and the [`Inline`]
//! runner for thread-based producers. [`Waiter`] adapts a cell into a
//! `Future` for `async` callers.
//!
//! There is deliberately no rejection path: no error state, no error
//! propagation through chains. A producer or callback that panics unwinds
//! through its caller untouched.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use deferred_cell::{Deferred, Schedule, Step, TaskQueue};
//!
//! let queue = Arc::new(TaskQueue::new());
//!
//! // The producer decides when the value arrives; here it hands the
//! // settle capability to the host queue, standing in for a timer.
//! let source = Deferred::new(queue.clone(), {
//!     let queue = Arc::clone(&queue);
//!     move |settle| queue.schedule(Box::new(move || settle.settle(5)))
//! });
//!
//! let result = source
//!     .then(|n| Step::Value(n + 1))
//!     .then({
//!         let queue = Arc::clone(&queue);
//!         move |n| Step::Chain(Deferred::resolved(queue, n * 2))
//!     });
//!
//! queue.run_until_idle();
//! assert_eq!(result.value(), Some(12));
//! ```

pub mod deferred;
pub mod scheduler;
pub mod wait;

pub use deferred::{Deferred, Settle, Status, Step};
pub use scheduler::{Inline, Schedule, Task, TaskQueue};
pub use wait::Waiter;
