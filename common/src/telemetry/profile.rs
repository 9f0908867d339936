use std::time::Duration;

use tracing_subscriber::filter::LevelFilter;

use crate::env::get_bool_env;

/// Environment variable toggling the development profile.
pub const DEBUG_ENV: &str = "DEBUG";

/// Logging configuration read once at startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Use the development profile instead of the production one.
    pub debug: bool,
}

impl LogConfig {
    /// Read the configuration from the `DEBUG` environment variable.
    /// Absent or malformed values select the production profile.
    pub fn from_env() -> Self {
        Self {
            debug: get_bool_env(DEBUG_ENV),
        }
    }

    /// Profile selected by this configuration.
    pub fn profile(&self) -> Profile {
        if self.debug {
            Profile::development()
        } else {
            Profile::production()
        }
    }
}

/// How records are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Human readable lines.
    Console,
    /// One JSON object per line.
    Json,
}

/// Rate limit applied to identical records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Length of the window during which identical records are counted.
    pub tick: Duration,
    /// Number of identical records emitted per window.
    pub first: u64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            first: 100,
        }
    }
}

/// Complete description of how the process logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// Output encoding.
    pub encoding: Encoding,
    /// Most verbose level that is emitted.
    pub level: LevelFilter,
    /// Attach a captured stack trace to every error record.
    pub stacktrace_on_error: bool,
    /// Sampling of identical records, if any.
    pub sampling: Option<SamplingPolicy>,
}

impl Profile {
    /// Console output at debug level with stack traces on errors and no sampling.
    pub fn development() -> Self {
        Self {
            encoding: Encoding::Console,
            level: LevelFilter::DEBUG,
            stacktrace_on_error: true,
            sampling: None,
        }
    }

    /// JSON output at info level with sampling and no stack traces.
    pub fn production() -> Self {
        Self {
            encoding: Encoding::Json,
            level: LevelFilter::INFO,
            stacktrace_on_error: false,
            sampling: Some(SamplingPolicy::default()),
        }
    }
}
