use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::future::future::panic_message;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of named worker threads fed by a channel.
///
/// Workers are named `{name}-{index}`. A panicking task is logged and the
/// worker keeps serving. After [WorkerPool::shutdown] no new task is accepted;
/// queued tasks still run and the workers exit once the queue is empty.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    name: String,
    size: usize,
    sender: Mutex<Option<Sender<Task>>>,
}

impl WorkerPool {
    pub fn new(size: usize, name: &str) -> StrataResult<WorkerPool> {
        if size == 0 {
            log::error!("Worker pool '{}' needs at least one thread", name);
            return Err(StrataError::new(
                "Worker pool needs at least one thread",
                ErrorKind::InvalidOperation,
            ));
        }

        let (sender, receiver) = unbounded::<Task>();
        for index in 0..size {
            let receiver = receiver.clone();
            thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop(receiver))?;
        }
        log::debug!("Started worker pool '{}' with {} threads", name, size);

        Ok(WorkerPool {
            inner: Arc::new(PoolInner {
                name: name.to_string(),
                size,
                sender: Mutex::new(Some(sender)),
            }),
        })
    }

    /// Queues `task` for execution on one of the workers.
    pub fn execute<F>(&self, task: F) -> StrataResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.inner.sender.lock();
        match sender.as_ref() {
            Some(sender) => sender.send(Box::new(task)).map_err(|_| {
                log::error!("Worker pool '{}' is no longer receiving tasks", self.inner.name);
                StrataError::new("Worker pool is shut down", ErrorKind::StoreClosed)
            }),
            None => Err(StrataError::new("Worker pool is shut down", ErrorKind::StoreClosed)),
        }
    }

    pub fn shutdown(&self) {
        if self.inner.sender.lock().take().is_some() {
            log::debug!("Shutting down worker pool '{}'", self.inner.name);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }
}

fn worker_loop(receiver: Receiver<Task>) {
    while let Ok(task) = receiver.recv() {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
            log::error!(
                "Task panicked on {}: {}",
                thread::current().name().unwrap_or("worker"),
                panic_message(payload.as_ref())
            );
        }
    }
}
