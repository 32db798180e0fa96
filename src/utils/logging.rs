//! Structured logging with credential redaction
//!
//! Entries carry `key=value` fields and are emitted as `tracing` events.
//! Fields named like a credential (`api_key`, `token`, ...) never reach the
//! subscriber in clear text.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Field keys whose values are always masked (substring, case-insensitive)
const SENSITIVE_KEYS: &[&str] = &["api_key", "apikey", "key", "token", "secret", "password", "authorization"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies, or `debug`
/// when `verbose` is on. Safe to call more than once.
pub fn init(default_level: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// One log line under construction
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Component tag (`binance`, `pipeline`, `web`, ...)
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Append `key=value`, masking the value when the key is sensitive
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        let value = if is_sensitive(key) { mask(&value) } else { value };
        self.fields.push((key, value));
        self
    }

    fn fields_line(&self) -> String {
        let pairs: Vec<String> = self.fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.join(" ")
    }

    pub fn log(self) {
        let fields = self.fields_line();
        let (module, message) = (self.module, self.message.as_str());

        match self.level {
            LogLevel::Debug => tracing::debug!(module, fields = %fields, "{message}"),
            LogLevel::Info => tracing::info!(module, fields = %fields, "{message}"),
            LogLevel::Warn => tracing::warn!(module, fields = %fields, "{message}"),
            LogLevel::Error => tracing::error!(module, fields = %fields, "{message}"),
        }
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Replace a secret by a marker that only reveals its length
fn mask(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        n => format!("[REDACTED:{n}chars]"),
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_entry {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)*) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::$level, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
    };
}

/// `log_debug!("binance", "GET", path = path)`
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Debug, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Info, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Warn, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Error, $module, $msg $(, $key = $value)*)
    };
}
