#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use deferred_cell::{Deferred, Inline, Schedule, Step, TaskQueue};
    use futures::executor::block_on;

    /// A timer-fed producer resolves after 50ms; two chained steps append
    /// to the value, the second through a nested deferred.
    #[test]
    fn chains_through_a_timer_fed_producer() {
        let scheduler: Arc<dyn Schedule> = Arc::new(Inline);
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Deferred::new(Arc::clone(&scheduler), |settle| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                settle.settle(String::from("first result"));
            });
        });

        let step_log = Arc::clone(&log);
        let nested_scheduler = Arc::clone(&scheduler);
        let last = first
            .then(move |result| {
                let appended = format!("{result} - 1");
                step_log.lock().unwrap().push(appended.clone());
                Step::Value(appended)
            })
            .then(move |result| {
                Step::Chain(Deferred::new(nested_scheduler, move |settle| {
                    settle.settle(format!("{result} - 2"));
                }))
            });

        let final_log = Arc::clone(&log);
        let done = last.then(move |result| {
            final_log.lock().unwrap().push(result.clone());
            Step::Value(result)
        });

        assert_eq!(block_on(done.waiter()), "first result - 1 - 2");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first result - 1", "first result - 1 - 2"]
        );
    }

    /// The same chain on the hand-pumped queue: everything between the
    /// producer firing and the final value is observable turn by turn.
    #[test]
    fn chains_deterministically_on_a_task_queue() {
        let queue = Arc::new(TaskQueue::new());

        let first = Deferred::new(queue.clone(), {
            let queue = Arc::clone(&queue);
            move |settle| {
                queue.schedule(Box::new(move || settle.settle(String::from("first result"))));
            }
        });

        let last = first
            .then(|result| Step::Value(format!("{result} - 1")))
            .then({
                let queue = Arc::clone(&queue);
                move |result| {
                    Step::Chain(Deferred::resolved(queue, format!("{result} - 2")))
                }
            });

        assert!(!first.is_resolved());
        assert!(!last.is_resolved());

        queue.run_until_idle();
        assert_eq!(last.value().as_deref(), Some("first result - 1 - 2"));
    }
}
