use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strata::database::Database;
use strata::errors::StrataResult;
use strata::schema::{FieldSpec, Schema};
use strata_plugin::{Plugin, Reporter, UuidGenerator};

/// Runs a test with retry logic and error handling.
/// Tests run on the current thread so many of them can share the machine.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StrataResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> StrataResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> StrataResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();
        let failure = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_backtrace = Some(bt);
                e
            }
            Err(panic_err) => {
                last_backtrace = Some(Backtrace::capture().to_string());
                if let Some(s) = panic_err.downcast_ref::<&str>() {
                    format!("Panic: {}", s)
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    format!("Panic: {}", s)
                } else {
                    "Panic: unknown payload".to_string()
                }
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("Error: {}", failure);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(failure);
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    db: Database,
    reporter: Arc<RecordingReporter>,
}

impl TestContext {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            reporter: Arc::new(RecordingReporter::default()),
        }
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }

    pub fn reporter(&self) -> Arc<RecordingReporter> {
        self.reporter.clone()
    }

    /// A plugin over this context's database reporting into [TestContext::reporter].
    pub fn plugin(&self) -> StrataResult<Plugin> {
        Plugin::new(self.db(), self.reporter.clone(), Arc::new(UuidGenerator))
    }
}

pub fn create_test_context() -> StrataResult<TestContext> {
    let db = Database::builder()
        .worker_threads(4)
        .thread_name("strata-test")
        .open()?;
    Ok(TestContext::new(db))
}

pub fn cleanup(ctx: TestContext) -> StrataResult<()> {
    ctx.db.close();
    Ok(())
}

/// `key: String, value: Double`
pub fn key_value_schema() -> StrataResult<Schema> {
    Schema::new(vec![("key", FieldSpec::string()), ("value", FieldSpec::double())])
}

/// Collects every report so tests can assert on them.
#[derive(Default)]
pub struct RecordingReporter {
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, message: &str) {
        self.infos.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}
