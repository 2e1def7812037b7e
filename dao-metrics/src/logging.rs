//! Logging configuration for the metrics pipeline.
//!
//! Pipeline code logs through `tracing`. [`LogConfig`] decides how chatty the
//! hot paths are: per-cell normalization failures and per-dataset data
//! operations go through the [`log_cell_failure!`](crate::log_cell_failure)
//! and [`log_data_op!`](crate::log_data_op) macros, which check the config
//! before formatting anything.
//!
//! Installing a subscriber is left to the application; [`setup::init_logging`]
//! is the one the bundled CLI uses.

use tracing::Level;

/// Controls pipeline log volume.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Most verbose level the gated logging macros emit
    pub base_level: Level,
    /// Whether to log individual date cells that fail to normalize
    pub log_cell_failures: bool,
    /// Whether to log per-dataset load and processing events
    pub log_data_operations: bool,
    /// Maximum length for logged cell values
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_cell_failures: false,
            log_data_operations: true,
            max_field_length: 128,
        }
    }
}

impl LogConfig {
    /// Logs everything, including every unparsable date cell.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_cell_failures: true,
            log_data_operations: true,
            max_field_length: 512,
        }
    }

    /// Warnings and errors only.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_cell_failures: false,
            log_data_operations: false,
            max_field_length: 64,
        }
    }

    pub fn balanced() -> Self {
        Self::default()
    }

    /// Whether events at `level` pass `base_level`.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.base_level
    }

    /// Truncates a cell value to `max_field_length` before it is logged.
    pub fn field(&self, value: &str) -> String {
        truncate_field(value, self.max_field_length)
    }
}

/// Logs one unparsable date cell at debug level when cell logging is enabled.
#[macro_export]
macro_rules! log_cell_failure {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_cell_failures && $config.enabled(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs a data operation at info level when data-operation logging is enabled.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations && $config.enabled(tracing::Level::INFO) {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates `value` to at most `max_length` bytes on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber installation.
pub mod setup {
    use tracing::Level;

    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Level for everything outside this crate
        pub level: Level,
        /// Level for `dao_metrics` targets
        pub crate_level: Level,
        pub json_format: bool,
        /// Overrides the computed filter when set
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::WARN,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the `EnvFilter` directive string.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},dao_metrics={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global subscriber with an `EnvFilter` and a plain or JSON
    /// fmt layer. `RUST_LOG` takes precedence over the config.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dao_metrics::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
