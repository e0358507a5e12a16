/// Where the plugin reports the outcome of each operation.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);

    fn error(&self, message: &str);
}

/// Forwards reports to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}
