use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::future::WorkerPool;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The settled state of a [Future]: a value or the failure reason.
pub type Outcome<T> = StrataResult<T>;

type Continuation<T> = Box<dyn FnOnce(&Outcome<T>) + Send + 'static>;

struct State<T> {
    outcome: Option<Arc<Outcome<T>>>,
    continuations: VecDeque<Continuation<T>>,
    // set while some thread is running continuations, so late registrations
    // queue up behind earlier ones instead of overtaking them
    draining: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    completed: Condvar,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Shared {
            state: Mutex::new(State {
                outcome: None,
                continuations: VecDeque::new(),
                draining: false,
            }),
            completed: Condvar::new(),
        }
    }

    fn complete(&self, outcome: Outcome<T>) -> bool {
        {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(Arc::new(outcome));
            self.completed.notify_all();
            if state.draining {
                return true;
            }
            state.draining = true;
        }
        self.drain();
        true
    }

    fn register(&self, continuation: Continuation<T>) {
        {
            let mut state = self.state.lock();
            state.continuations.push_back(continuation);
            if state.outcome.is_none() || state.draining {
                return;
            }
            state.draining = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let (outcome, continuation) = {
                let mut state = self.state.lock();
                let outcome = match state.outcome.clone() {
                    Some(outcome) => outcome,
                    None => {
                        state.draining = false;
                        return;
                    }
                };
                match state.continuations.pop_front() {
                    Some(continuation) => (outcome, continuation),
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };

            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| continuation(&outcome))) {
                log::error!("Future continuation panicked: {}", panic_message(payload.as_ref()));
            }
        }
    }
}

/// An asynchronous, single-assignment result.
///
/// A `Future` is completed exactly once, with a value or a [StrataError], by
/// its [Promise] or by the pool task that produced it. Continuations attached
/// with the combinators below fire at most once each, in attachment order,
/// after completion. They run on the completing thread, or right away on the
/// attaching thread when the future is already settled.
///
/// `Future` is a cheap handle; clones observe the same cell.
///
/// # Examples
///
/// ```rust
/// use strata::future::Future;
///
/// let doubled = Future::successful(21).map(|v| v * 2);
/// assert_eq!(doubled.wait().unwrap(), 42);
/// ```
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Future {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Debug for Future<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        match state.outcome.as_deref() {
            None => write!(f, "Future(<pending>)"),
            Some(Ok(_)) => write!(f, "Future(<success>)"),
            Some(Err(err)) => write!(f, "Future(<failure: {}>)", err),
        }
    }
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A future already completed with `value`.
    pub fn successful(value: T) -> Future<T> {
        let promise = Promise::new();
        promise.success(value);
        promise.future()
    }

    /// A future already completed with `error`.
    pub fn failed(error: StrataError) -> Future<T> {
        let promise = Promise::new();
        promise.failure(error);
        promise.future()
    }

    /// Runs `task` on `pool` and completes with its result.
    ///
    /// A panicking task fails the future with [ErrorKind::InternalError]. If
    /// the pool is shut down the future fails with [ErrorKind::StoreClosed].
    pub fn spawn<F>(pool: &WorkerPool, task: F) -> Future<T>
    where
        F: FnOnce() -> StrataResult<T> + Send + 'static,
    {
        let promise = Promise::new();
        let future = promise.future();
        let producer = promise.clone();
        let submitted = pool.execute(move || {
            let outcome = match catch_unwind(AssertUnwindSafe(task)) {
                Ok(outcome) => outcome,
                Err(payload) => Err(panic_error("Pool task", payload.as_ref())),
            };
            producer.try_complete(outcome);
        });

        if let Err(err) = submitted {
            promise.failure(err);
        }
        future
    }

    /// Returns a future completing with `f(value)`; failures pass through.
    ///
    /// A panic inside `f` fails the returned future instead of unwinding into
    /// the completing thread.
    pub fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Like [Future::map] for fallible functions: an `Err` fails the result.
    pub fn try_map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> StrataResult<U> + Send + 'static,
    {
        let promise = Promise::new();
        let result = promise.future();
        self.shared.register(Box::new(move |outcome: &Outcome<T>| match outcome {
            Ok(value) => {
                let value = value.clone();
                let mapped = match catch_unwind(AssertUnwindSafe(move || f(value))) {
                    Ok(mapped) => mapped,
                    Err(payload) => Err(panic_error("map", payload.as_ref())),
                };
                promise.try_complete(mapped);
            }
            Err(err) => {
                promise.failure(err.clone());
            }
        }));
        result
    }

    /// Chains a dependent asynchronous step.
    ///
    /// The result completes with the outcome of the future returned by `f`.
    /// A failure of either stage fails the result.
    pub fn flat_map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        let promise = Promise::new();
        let result = promise.future();
        self.shared.register(Box::new(move |outcome: &Outcome<T>| match outcome {
            Ok(value) => {
                let value = value.clone();
                match catch_unwind(AssertUnwindSafe(move || f(value))) {
                    Ok(inner) => {
                        inner.on_complete(move |inner_outcome| {
                            promise.try_complete(inner_outcome.clone());
                        });
                    }
                    Err(payload) => {
                        promise.failure(panic_error("flat_map", payload.as_ref()));
                    }
                }
            }
            Err(err) => {
                promise.failure(err.clone());
            }
        }));
        result
    }

    /// Observes a successful value. Returns this future unchanged.
    pub fn on_success<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.shared.register(Box::new(move |outcome: &Outcome<T>| {
            if let Ok(value) = outcome {
                f(value);
            }
        }));
        self.clone()
    }

    /// Observes a failure. Returns this future unchanged.
    pub fn on_failure<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&StrataError) + Send + 'static,
    {
        self.shared.register(Box::new(move |outcome: &Outcome<T>| {
            if let Err(err) = outcome {
                f(err);
            }
        }));
        self.clone()
    }

    /// Observes the outcome, whichever it is. Returns this future unchanged.
    pub fn on_complete<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        self.shared.register(Box::new(f));
        self.clone()
    }

    /// Runs `f` on the outcome, then completes a new future with that same
    /// outcome. Stages chained this way run in order, so side effects can be
    /// interposed without touching the data flowing through.
    pub fn and_then<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let promise = Promise::new();
        let result = promise.future();
        self.shared.register(Box::new(move |outcome: &Outcome<T>| {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(outcome))) {
                log::error!("and_then callback panicked: {}", panic_message(payload.as_ref()));
            }
            promise.try_complete(outcome.clone());
        }));
        result
    }

    /// Turns a failure into a value; successes pass through.
    pub fn recover<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&StrataError) -> T + Send + 'static,
    {
        let promise = Promise::new();
        let result = promise.future();
        self.shared.register(Box::new(move |outcome: &Outcome<T>| match outcome {
            Ok(value) => {
                promise.success(value.clone());
            }
            Err(err) => {
                let recovered = match catch_unwind(AssertUnwindSafe(|| f(err))) {
                    Ok(value) => Ok(value),
                    Err(payload) => Err(panic_error("recover", payload.as_ref())),
                };
                promise.try_complete(recovered);
            }
        }));
        result
    }

    /// Blocks the calling thread until the future settles.
    ///
    /// Meant for the outermost layer and for tests; never call it from a
    /// continuation or a pool task.
    pub fn wait(&self) -> Outcome<T> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(outcome) = state.outcome.as_deref() {
                return outcome.clone();
            }
            self.shared.completed.wait(&mut state);
        }
    }

    /// Like [Future::wait] with an upper bound; `None` if still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if let Some(outcome) = state.outcome.as_deref() {
                return Some(outcome.clone());
            }
            if self.shared.completed.wait_until(&mut state, deadline).timed_out() {
                return state.outcome.as_deref().cloned();
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.shared.state.lock().outcome.is_some()
    }

    /// The outcome if already settled, without blocking.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.shared.state.lock().outcome.as_deref().cloned()
    }
}

/// The write side of a [Future].
///
/// The first completion wins; later attempts are ignored and report `false`.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Promise {
            shared: Arc::new(Shared::new()),
        }
    }

    /// The future observing this promise.
    pub fn future(&self) -> Future<T> {
        Future {
            shared: self.shared.clone(),
        }
    }

    /// Completes with `outcome` unless already completed.
    pub fn try_complete(&self, outcome: Outcome<T>) -> bool {
        self.shared.complete(outcome)
    }

    pub fn success(&self, value: T) -> bool {
        self.try_complete(Ok(value))
    }

    pub fn failure(&self, error: StrataError) -> bool {
        self.try_complete(Err(error))
    }

    pub fn is_completed(&self) -> bool {
        self.shared.state.lock().outcome.is_some()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn panic_error(stage: &str, payload: &(dyn Any + Send)) -> StrataError {
    let message = format!("{} panicked: {}", stage, panic_message(payload));
    log::error!("{}", message);
    StrataError::new(&message, ErrorKind::InternalError)
}
