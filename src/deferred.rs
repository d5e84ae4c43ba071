//! The deferred value cell: a single-assignment container that starts out
//! pending, is settled exactly once by its producer, and delivers the value
//! to every continuation registered on it.
//!
//! Continuations registered while the cell is still pending are queued and
//! handed to the host scheduler when the cell settles, in registration
//! order. Continuations registered after settlement run immediately, inside
//! the registering call.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::scheduler::Schedule;

/// The observable lifecycle of a [`Deferred`].
///
/// The transition is one-way: once `Resolved`, a cell never reports
/// `Pending` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No value yet; continuations are queued.
    Pending,
    /// The value is fixed; continuations run immediately.
    Resolved,
}

/// What a [`then`](Deferred::then) callback hands back: either the next
/// value in the chain, or another deferred to wait on.
///
/// A `Chain` never becomes the stored value of the derived cell. The
/// derived cell settles with the chained cell's eventual value instead, so
/// a chain of callbacks always yields a single-level `Deferred`.
#[derive(Debug)]
pub enum Step<T> {
    /// Settle the derived cell with this value.
    Value(T),
    /// Settle the derived cell once this inner cell settles, with its value.
    Chain(Deferred<T>),
}

type Continuation<T> = Box<dyn FnOnce(T) + Send>;

enum State<T> {
    Pending,
    Resolved(T),
}

struct Inner<T> {
    state: State<T>,
    // Appended to only while pending; drained exactly once, at settlement.
    queue: Vec<Continuation<T>>,
}

impl<T> Inner<T> {
    fn pending() -> Self {
        Inner {
            state: State::Pending,
            queue: Vec::new(),
        }
    }
}

/// A handle to a single-assignment asynchronous value.
///
/// `Deferred` is a cheap handle over one shared cell; clones observe the
/// same state. A cell is created with a producer function that receives the
/// cell's [`Settle`] capability and decides when (and with what) the cell
/// resolves. Consumers compose follow-up work with [`then`](Deferred::then),
/// which derives a new `Deferred` from this one.
///
/// Every handle carries the host scheduling capability it was constructed
/// with; derived cells inherit it.
pub struct Deferred<T> {
    cell: Arc<Mutex<Inner<T>>>,
    scheduler: Arc<dyn Schedule>,
}

/// The settle capability for one [`Deferred`] cell.
///
/// Handed to the producer at construction. May be cloned and called any
/// number of times, but only the first call takes effect; the cell keeps
/// the first value and later calls are no-ops.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use deferred_cell::{Deferred, TaskQueue};
///
/// let queue = Arc::new(TaskQueue::new());
/// let (deferred, settle) = Deferred::pending(queue.clone());
/// settle.settle("first");
/// settle.settle("second");
/// assert_eq!(deferred.value(), Some("first"));
/// ```
pub struct Settle<T> {
    cell: Arc<Mutex<Inner<T>>>,
    scheduler: Arc<dyn Schedule>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Deferred {
            cell: Arc::clone(&self.cell),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<T> Clone for Settle<T> {
    fn clone(&self) -> Self {
        Settle {
            cell: Arc::clone(&self.cell),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<T: Clone + Send + 'static> Settle<T> {
    /// Fix the cell's value and run its queued continuations.
    ///
    /// The first call flips the cell to [`Status::Resolved`] and drains the
    /// continuation queue: each queued continuation is bound to a clone of
    /// the value and handed to the host scheduler as its own task, in
    /// registration order. Any later call returns without touching the
    /// cell.
    pub fn settle(&self, value: T) {
        let drained = {
            let mut inner = self.cell.lock().unwrap();
            if let State::Resolved(_) = inner.state {
                return;
            }
            inner.state = State::Resolved(value.clone());
            std::mem::take(&mut inner.queue)
        };
        // The value is bound here so the host only ever sees zero-argument
        // tasks.
        for continuation in drained {
            let value = value.clone();
            self.scheduler.schedule(Box::new(move || continuation(value)));
        }
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Create a pending cell and run `producer` with its settle capability.
    ///
    /// The producer runs synchronously, before `new` returns. It may settle
    /// right away, stash the [`Settle`] handle somewhere, or hand it to a
    /// timer or task queue to be called later; the cell stays pending until
    /// it does.
    ///
    /// A producer that panics is not caught here.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use deferred_cell::{Deferred, Schedule, Status, TaskQueue};
    ///
    /// let queue = Arc::new(TaskQueue::new());
    ///
    /// // Settling inside the producer resolves the cell immediately.
    /// let ready = Deferred::new(queue.clone(), |settle| settle.settle(5));
    /// assert_eq!(ready.status(), Status::Resolved);
    ///
    /// // Handing the settle capability to the host resolves it later.
    /// let later = Deferred::new(queue.clone(), {
    ///     let queue = Arc::clone(&queue);
    ///     move |settle| queue.schedule(Box::new(move || settle.settle(5)))
    /// });
    /// assert_eq!(later.status(), Status::Pending);
    /// queue.run_until_idle();
    /// assert_eq!(later.value(), Some(5));
    /// ```
    pub fn new<P>(scheduler: Arc<dyn Schedule>, producer: P) -> Self
    where
        P: FnOnce(Settle<T>),
    {
        let deferred = Deferred {
            cell: Arc::new(Mutex::new(Inner::pending())),
            scheduler,
        };
        producer(deferred.settle_handle());
        deferred
    }

    /// Create a pending cell and hand back its settle capability directly,
    /// for producers that live outside a closure.
    pub fn pending(scheduler: Arc<dyn Schedule>) -> (Self, Settle<T>) {
        let deferred = Deferred {
            cell: Arc::new(Mutex::new(Inner::pending())),
            scheduler,
        };
        let settle = deferred.settle_handle();
        (deferred, settle)
    }

    /// Create a cell that is already resolved with `value`.
    pub fn resolved(scheduler: Arc<dyn Schedule>, value: T) -> Self {
        Self::new(scheduler, move |settle| settle.settle(value))
    }

    fn settle_handle(&self) -> Settle<T> {
        Settle {
            cell: Arc::clone(&self.cell),
            scheduler: Arc::clone(&self.scheduler),
        }
    }

    /// Derive a new cell from this one.
    ///
    /// Returns immediately with a `Deferred` that settles once
    /// `on_fulfilled` has been applied to this cell's value. The callback
    /// returns a [`Step`]: a plain `Step::Value` settles the derived cell
    /// directly, while `Step::Chain` makes the derived cell wait for the
    /// inner cell and settle with its eventual value, however many chain
    /// levels deep that takes.
    ///
    /// Dispatch is deliberately asymmetric, and observable: on a pending
    /// cell the callback is queued and runs via the host scheduler after
    /// settlement, never inside this call; on a resolved cell it runs
    /// synchronously, before this call returns. Callers who need
    /// always-asynchronous delivery must not rely on `then` alone.
    ///
    /// A callback that panics is not caught here.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use deferred_cell::{Deferred, Status, Step, TaskQueue};
    ///
    /// let queue = Arc::new(TaskQueue::new());
    /// let (source, settle) = Deferred::pending(queue.clone());
    /// let doubled = source.then(|n: i32| Step::Value(n * 2));
    ///
    /// settle.settle(21);
    /// // The continuation is on the host queue, not yet run.
    /// assert_eq!(doubled.status(), Status::Pending);
    /// queue.run_until_idle();
    /// assert_eq!(doubled.value(), Some(42));
    /// ```
    ///
    /// Returning another deferred flattens into its value:
    ///
    /// ```
    /// use std::sync::Arc;
    /// use deferred_cell::{Deferred, Step, TaskQueue};
    ///
    /// let queue = Arc::new(TaskQueue::new());
    /// let source = Deferred::resolved(queue.clone(), 5);
    /// let next = source.then({
    ///     let queue = Arc::clone(&queue);
    ///     move |n| Step::Chain(Deferred::resolved(queue, n + 1))
    /// });
    /// assert_eq!(next.value(), Some(6));
    /// ```
    pub fn then<U, F>(&self, on_fulfilled: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Step<U> + Send + 'static,
    {
        let source = self.clone();
        Deferred::new(Arc::clone(&self.scheduler), move |settle| {
            source.on_resolved(move |value| match on_fulfilled(value) {
                Step::Value(result) => settle.settle(result),
                Step::Chain(inner) => inner.on_resolved(move |result| settle.settle(result)),
            });
        })
    }

    /// [`then`](Deferred::then) for callbacks that always produce a plain
    /// value.
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(move |value| Step::Value(f(value)))
    }

    /// Run `continuation` with the cell's value: immediately if the cell is
    /// already resolved, otherwise from the queue once it settles.
    pub(crate) fn on_resolved<F>(&self, continuation: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        let mut inner = self.cell.lock().unwrap();
        if let State::Resolved(value) = &inner.state {
            let value = value.clone();
            drop(inner);
            continuation(value);
        } else {
            inner.queue.push(Box::new(continuation));
        }
    }
}

impl<T> Deferred<T> {
    /// The cell's current lifecycle state.
    pub fn status(&self) -> Status {
        match self.cell.lock().unwrap().state {
            State::Pending => Status::Pending,
            State::Resolved(_) => Status::Resolved,
        }
    }

    /// Whether the cell has settled.
    pub fn is_resolved(&self) -> bool {
        self.status() == Status::Resolved
    }

    /// A clone of the resolved value, or `None` while pending.
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        match &self.cell.lock().unwrap().state {
            State::Resolved(value) => Some(value.clone()),
            State::Pending => None,
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("status", &self.status())
            .finish()
    }
}

impl<T> fmt::Debug for Settle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settle").finish_non_exhaustive()
    }
}
