//! Awaiting a deferred value.
//!
//! [`Waiter`] bridges a [`Deferred`] into `async` code: it is a `Future`
//! that completes with the cell's value. Delivery rides the same
//! continuation mechanism as [`then`](Deferred::then), so the cell's own
//! state machine is untouched. There is no failure channel; awaiting a
//! cell whose producer never settles never completes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::deferred::Deferred;

/// A `Future` for one delivery of a [`Deferred`] value.
///
/// Each call to [`Deferred::waiter`] registers its own continuation, so any
/// number of waiters may await the same cell; each receives a clone of the
/// value.
pub struct Waiter<T> {
    shared: Arc<Mutex<WaitState<T>>>,
}

struct WaitState<T> {
    value: Option<T>,
    waker: Option<Waker>,
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// An awaitable handle on this cell's value.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::thread;
    /// use deferred_cell::{Deferred, Inline};
    /// use futures::executor::block_on;
    ///
    /// let (deferred, settle) = Deferred::pending(Arc::new(Inline));
    /// let waiter = deferred.waiter();
    ///
    /// let producer = thread::spawn(move || settle.settle(String::from("ready")));
    /// producer.join().expect("producer thread panicked");
    /// assert_eq!(block_on(waiter), "ready");
    /// ```
    pub fn waiter(&self) -> Waiter<T> {
        let shared = Arc::new(Mutex::new(WaitState {
            value: None,
            waker: None,
        }));
        let delivery = Arc::clone(&shared);
        self.on_resolved(move |value| {
            let mut state = delivery.lock().unwrap();
            state.value = Some(value);
            if let Some(waker) = state.waker.take() {
                waker.wake();
            }
        });
        Waiter { shared }
    }
}

impl<T> Future for Waiter<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.lock().unwrap();
        match state.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for Waiter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use futures::executor::block_on;

    use crate::deferred::Deferred;
    use crate::scheduler::Inline;

    #[test]
    fn waiter_receives_a_value_settled_from_another_thread() {
        let (deferred, settle) = Deferred::pending(Arc::new(Inline));
        let waiter = deferred.waiter();

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            settle.settle(String::from("🍓"));
        });

        assert_eq!(block_on(waiter), "🍓");
        producer.join().expect("the producer thread has panicked");
    }

    #[test]
    fn waiter_on_a_resolved_cell_is_immediately_ready() {
        let deferred = Deferred::resolved(Arc::new(Inline), 7);
        assert_eq!(block_on(deferred.waiter()), 7);
    }

    #[test]
    fn every_waiter_observes_the_value() {
        let (deferred, settle) = Deferred::pending(Arc::new(Inline));
        let first = deferred.waiter();
        let second = deferred.waiter();

        let task1 = thread::spawn(move || block_on(first));
        let task2 = thread::spawn(move || block_on(second));
        settle.settle(String::from("shared"));

        assert_eq!(task1.join().expect("the task1 thread has panicked"), "shared");
        assert_eq!(task2.join().expect("the task2 thread has panicked"), "shared");
    }
}
