use crate::errors::{ErrorKind, StrataError};
use crate::future::{Future, Outcome, Promise};
use parking_lot::Mutex;
use std::sync::Arc;

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Combines futures into one completing with all values in input order.
    ///
    /// The result fails with the failure of the earliest input, by position,
    /// as soon as every input before it has succeeded. An empty input
    /// completes immediately with an empty vector.
    ///
    /// ```rust
    /// use strata::future::Future;
    ///
    /// let all = Future::sequence(vec![Future::successful(1), Future::successful(2)]);
    /// assert_eq!(all.wait().unwrap(), vec![1, 2]);
    /// ```
    pub fn sequence(futures: Vec<Future<T>>) -> Future<Vec<T>> {
        if futures.is_empty() {
            return Future::successful(Vec::new());
        }

        let promise = Promise::new();
        let progress = Arc::new(Mutex::new(Progress {
            slots: (0..futures.len()).map(|_| None).collect(),
            next: 0,
            settled: false,
        }));

        for (position, future) in futures.iter().enumerate() {
            let progress = progress.clone();
            let promise = promise.clone();
            future.on_complete(move |outcome| {
                let verdict = {
                    let mut progress = progress.lock();
                    if let Some(slot) = progress.slots.get_mut(position) {
                        *slot = Some(outcome.clone());
                    }
                    progress.advance()
                };
                if let Some(verdict) = verdict {
                    promise.try_complete(verdict);
                }
            });
        }
        promise.future()
    }

    /// Completes with the outcome of whichever input settles first.
    ///
    /// Fails with [ErrorKind::InvalidOperation] when given no futures.
    pub fn first_completed_of(futures: Vec<Future<T>>) -> Future<T> {
        if futures.is_empty() {
            log::error!("first_completed_of called without futures");
            return Future::failed(StrataError::new(
                "first_completed_of needs at least one future",
                ErrorKind::InvalidOperation,
            ));
        }

        let promise = Promise::new();
        for future in &futures {
            let promise = promise.clone();
            future.on_complete(move |outcome| {
                promise.try_complete(outcome.clone());
            });
        }
        promise.future()
    }
}

struct Progress<T> {
    slots: Vec<Option<Outcome<T>>>,
    // slots before `next` all hold successes
    next: usize,
    settled: bool,
}

impl<T> Progress<T> {
    // moves past settled successes; each slot is visited once
    fn advance(&mut self) -> Option<Outcome<Vec<T>>> {
        if self.settled {
            return None;
        }
        while self.next < self.slots.len() {
            match &self.slots[self.next] {
                Some(Ok(_)) => self.next += 1,
                Some(Err(err)) => {
                    self.settled = true;
                    return Some(Err(err.clone()));
                }
                None => return None,
            }
        }
        self.settled = true;
        let values = self
            .slots
            .drain(..)
            .filter_map(|slot| match slot {
                Some(Ok(value)) => Some(value),
                _ => None,
            })
            .collect();
        Some(Ok(values))
    }
}
