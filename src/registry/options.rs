use crate::config::ConfigStore;
use crate::error::AppError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Receives errors from the best-effort phases (stop and uninstall)
pub type ErrorHandler = Arc<dyn Fn(AppError) + Send + Sync>;

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Registry options
#[derive(Clone)]
pub struct Options {
    start_timeout: Duration,
    stop_timeout: Duration,
    error_handler: ErrorHandler,
    configs: ConfigStore,
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    pub fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    pub fn error_handler(&self) -> ErrorHandler {
        Arc::clone(&self.error_handler)
    }

    /// Per-component configs, looked up at init time
    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            start_timeout: DEFAULT_START_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            error_handler: Arc::new(|_| {}),
            configs: ConfigStore::new(),
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("start_timeout", &self.start_timeout)
            .field("stop_timeout", &self.stop_timeout)
            .field("configs", &self.configs)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Options`]
///
/// Anything left unset keeps its default: 15s timeouts, an error handler
/// that discards, and an empty config store.
///
/// # Example
/// ```rust,ignore
/// let options = Options::builder()
///     .start_timeout(Duration::from_secs(30))
///     .error_handler(|err| tracing::error!("{}", err))
///     .config("db", json!({"url": "postgres://localhost"}))
///     .build();
/// ```
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start timeout; zero keeps the default
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.options.start_timeout = timeout;
        }
        self
    }

    /// Set the stop timeout; zero keeps the default
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.options.stop_timeout = timeout;
        }
        self
    }

    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(AppError) + Send + Sync + 'static,
    {
        self.options.error_handler = Arc::new(handler);
        self
    }

    /// Share an existing config store
    pub fn configs(mut self, configs: ConfigStore) -> Self {
        self.options.configs = configs;
        self
    }

    /// Set the config of a single component
    pub fn config(self, name: impl Into<String>, value: Value) -> Self {
        self.options.configs.set(name, value);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.start_timeout(), Duration::from_secs(15));
        assert_eq!(options.stop_timeout(), Duration::from_secs(15));
        assert!(options.configs().is_empty());
        (options.error_handler())(AppError::EmptyName);
    }

    #[test]
    fn test_zero_timeouts_keep_defaults() {
        let options = Options::builder()
            .start_timeout(Duration::ZERO)
            .stop_timeout(Duration::from_secs(3))
            .build();
        assert_eq!(options.start_timeout(), DEFAULT_START_TIMEOUT);
        assert_eq!(options.stop_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_handler_and_configs() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = Options::builder()
            .error_handler(move |err| sink.lock().unwrap().push(err.to_string()))
            .config("db", json!({"pool": 2}))
            .build();

        (options.error_handler())(AppError::EmptyName);
        assert_eq!(*seen.lock().unwrap(), vec!["Component name is empty"]);
        assert_eq!(options.configs().get("db"), Some(json!({"pool": 2})));
    }
}
