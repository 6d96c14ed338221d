use std::cell::RefCell;
use std::{sync::Arc, sync::OnceLock};

thread_local! {
    static THREAD_LOG_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

tokio::task_local! {
    /// Task-local logging context, used by exported async methods so the prefix survives `.await`.
    pub static LOG_CONTEXT: RefCell<Option<String>>;
}

/// Logger implemented by the native host.
///
/// Every record emitted by this crate through the `log` facade is forwarded here once a logger
/// has been installed with [`set_logger`].
///
/// # Examples
///
/// ```rust
/// use blinkup::primitives::logger::{LogLevel, Logger};
///
/// struct StdoutLogger;
///
/// impl Logger for StdoutLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// class BlinkUpLogcatLogger : Logger {
///     override fun log(level: LogLevel, message: String) {
///         when (level) {
///             LogLevel.ERROR -> Log.e("BlinkUp", message)
///             LogLevel.WARN -> Log.w("BlinkUp", message)
///             else -> Log.d("BlinkUp", message)
///         }
///     }
/// }
///
/// setLogger(BlinkUpLogcatLogger()) // once, at plugin initialization
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of the onboarding flow.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// `log::Log` implementation forwarding to the host-provided [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records from dependencies are dropped; everything else is forwarded.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_from_blinkup = module_path.is_some_and(|path| path.starts_with("blinkup"));
    let is_verbose = matches!(level, log::Level::Debug | log::Level::Trace);
    is_from_blinkup || !is_verbose
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the host logger and wires it into the `log` facade.
///
/// Only the first call takes effect; later calls are ignored.
#[allow(clippy::module_name_repetitions)]
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    static LOGGER: ForeignLogger = ForeignLogger;
    if let Err(e) = log::set_logger(&LOGGER) {
        eprintln!("Failed to install BlinkUp logger: {e}");
        return;
    }
    log::set_max_level(log::LevelFilter::Trace);
}

/// Logs a trace-level message with the current context prefix
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::trace!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::trace!($($arg)*)
        }
    };
}

/// Logs a debug-level message with the current context prefix
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::debug!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::debug!($($arg)*)
        }
    };
}

/// Logs an info-level message with the current context prefix
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::info!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::info!($($arg)*)
        }
    };
}

/// Logs a warning-level message with the current context prefix
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::warn!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::warn!($($arg)*)
        }
    };
}

/// Logs an error-level message with the current context prefix
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::error!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::error!($($arg)*)
        }
    };
}

/// Which backing storage a [`LogContext`] wrote to, so `Drop` restores the same one.
enum LogContextStorage {
    TaskLocal,
    ThreadLocal,
}

/// Scope guard that sets the `[BlinkUp][Module]` log prefix until dropped.
///
/// # Examples
///
/// ```rust
/// use blinkup::primitives::logger::{get_context, LogContext};
///
/// {
///     let _ctx = LogContext::new("OnboardingOrchestrator");
///     assert_eq!(get_context().as_deref(), Some("[BlinkUp][OnboardingOrchestrator]"));
/// }
/// assert_eq!(get_context(), None);
/// ```
pub struct LogContext {
    previous: Option<String>,
    storage: LogContextStorage,
}

impl LogContext {
    /// Enters a new logging context scope for `module`.
    #[must_use]
    pub fn new(module: &str) -> Self {
        let new_context = Some(format!("[BlinkUp][{module}]"));

        // task_local persists across .await points; sync callers fall back to thread_local
        match LOG_CONTEXT.try_with(|ctx| ctx.replace(new_context.clone())) {
            Ok(previous) => Self {
                previous,
                storage: LogContextStorage::TaskLocal,
            },
            Err(_) => Self {
                previous: THREAD_LOG_CONTEXT.with(|ctx| ctx.replace(new_context)),
                storage: LogContextStorage::ThreadLocal,
            },
        }
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        match self.storage {
            LogContextStorage::TaskLocal => {
                let _ = LOG_CONTEXT.try_with(|ctx| ctx.replace(previous));
            }
            LogContextStorage::ThreadLocal => {
                THREAD_LOG_CONTEXT.with(|ctx| ctx.replace(previous));
            }
        }
    }
}

/// Returns the active logging context prefix, if any.
#[must_use]
pub fn get_context() -> Option<String> {
    LOG_CONTEXT
        .try_with(|ctx| ctx.borrow().clone())
        .unwrap_or_else(|_| THREAD_LOG_CONTEXT.with(|ctx| ctx.borrow().clone()))
}

/// Runs a block inside a scoped logging context.
///
/// # Examples
///
/// ```rust
/// use blinkup::with_log_context;
///
/// with_log_context!("PlanIdResolver" => {
///     blinkup::info!("resolving plan id");
/// });
/// ```
#[macro_export]
macro_rules! with_log_context {
    ($module:expr => $block:block) => {{
        let _blinkup_logger_ctx = $crate::primitives::logger::LogContext::new($module);
        $block
    }};
}
