// Logging System for Turnstile
//
// This module provides a unified logging interface for the station. It's
// built on top of the `tracing` ecosystem.
//
// # Usage Examples
//
// ## Basic Initialization
//
// ```rust
// use turnstile::logging;
//
// // INFO level, console output
// logging::init(logging::LogConfig::default());
//
// // Or with custom settings
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## File Logging
//
// ```rust
// use turnstile::logging;
//
// let config = logging::LogConfig::default();
// logging::init_with_file(config, "station.log").unwrap();
// ```
//
// ## Station Macros
//
// ```rust
// use turnstile::{actor_span, log_lifecycle};
//
// let span = actor_span!("Car", 3);
// let _guard = span.enter();
// log_lifecycle!("Car", 3, "stopped");
// ```
//
// Levels used by the station: actor state transitions at TRACE, service
// events at DEBUG, station lifecycle at INFO, faults at ERROR.

use std::io;
use std::sync::Once;
use tracing::{Level, Subscriber};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for the Turnstile logging system
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: false,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    // Add any target-specific filters if provided
    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

/// Initialize the logging system with the given configuration
///
/// Sets up the global tracing subscriber. It's safe to call multiple times;
/// only the first call will take effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(
                registry.with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_writer(io::stderr),
                ),
            )
        } else {
            Box::new(
                registry.with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_ansi(atty::is(atty::Stream::Stderr))
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_thread_names(config.show_thread_info),
                ),
            )
        };

        set_global_subscriber(subscriber);
    });
}

// Helper function to set the global subscriber
fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Initialize logging with both console and file output
///
/// Console output goes to stderr, so stdout stays reserved for the station
/// report. The file is opened in append mode and always gets plain text with
/// thread names.
///
/// # Errors
/// Returns an error if the log file cannot be opened or created. Nothing is
/// initialized in that case.
pub fn init_with_file(config: LogConfig, log_file: &str) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    INIT.call_once(|| {
        let console_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .with_thread_names(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// Initialize logging for testing
///
/// Only shows warnings and errors to keep test output clean.
///
/// ```rust
/// #[test]
/// fn my_test() {
///     turnstile::logging::init_test();
///     // Your test code...
/// }
/// ```
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        target_filters: None,
    });
}

/// Create a new span for an actor thread
///
/// ```rust
/// use turnstile::actor_span;
///
/// let span = actor_span!("Car", 3);
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! actor_span {
    ($actor_kind:expr, $actor_id:expr) => {
        tracing::info_span!("actor", kind = $actor_kind, id = %$actor_id)
    };
    ($actor_kind:expr, $actor_id:expr, $($fields:tt)*) => {
        tracing::info_span!("actor", kind = $actor_kind, id = %$actor_id, $($fields)*)
    };
}

/// Log actor lifecycle events - use for important actor state changes
///
/// ```rust
/// use turnstile::log_lifecycle;
///
/// log_lifecycle!("Car", 3, "started");
/// log_lifecycle!("Car", 3, "stopped", services = 12);
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($actor_kind:expr, $actor_id:expr, $event:expr) => {
        tracing::info!(actor_kind = $actor_kind, actor_id = %$actor_id, event = $event);
    };
    ($actor_kind:expr, $actor_id:expr, $event:expr, $($fields:tt)*) => {
        tracing::info!(actor_kind = $actor_kind, actor_id = %$actor_id, event = $event, $($fields)*);
    };
}

/// Log service events - acquire, release and rejoin
///
/// ```rust
/// use turnstile::log_service;
///
/// log_service!("acquired", resource = 1);
/// ```
#[macro_export]
macro_rules! log_service {
    ($event:expr) => {
        tracing::debug!(service = $event);
    };
    ($event:expr, $($fields:tt)*) => {
        tracing::debug!(service = $event, $($fields)*);
    };
}

/// Log station events - use for important station state changes
///
/// ```rust
/// use turnstile::log_system;
///
/// log_system!("start", "completed", actors = 10);
/// ```
#[macro_export]
macro_rules! log_system {
    ($operation:expr, $status:expr) => {
        tracing::info!(operation = $operation, status = $status);
    };
    ($operation:expr, $status:expr, $($fields:tt)*) => {
        tracing::info!(operation = $operation, status = $status, $($fields)*);
    };
}

/// Log error events - use for all error conditions
///
/// ```rust
/// use turnstile::log_error;
///
/// let fault = turnstile::ActorFault::InvalidHandle(turnstile::ResourceId::new(9));
/// log_error!(fault, actor = 3);
/// ```
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error);
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*);
    };
}

/// Get the current tracing dispatcher
///
/// The station captures it before spawning actor threads and installs it in
/// each of them, so actors log through the same subscriber as the thread that
/// started the station, including scoped test subscribers.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}
