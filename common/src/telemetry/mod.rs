//! Provides the process wide structured logger.
//!
//! The profile is chosen once from the `DEBUG` environment variable and installed as the
//! global default subscriber, which also receives records logged through the `log` facade.
//! Components obtain name scoped loggers with [`get_logger`].
//!
//! Reconfiguring at runtime goes through [`reload_from_env`] or [`LoggerFactory::reload`];
//! the environment is not re-read on every call.
mod format;
mod profile;
mod sampling;

use std::{
    fmt,
    io::{self, IsTerminal, Write},
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use anyhow::{bail, Result};
use tracing::Span;
use tracing_subscriber::{fmt::MakeWriter, layer::Layered, prelude::*, reload, Layer, Registry};

pub use profile::{Encoding, LogConfig, Profile, SamplingPolicy, DEBUG_ENV};
pub use sampling::{Clock, MonotonicClock, ProfileGate, Sampler};

use format::StacktraceOnError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Subscriber assembled by a [`LoggerFactory`].
pub type LogSubscriber =
    Layered<ProfileGate, Layered<reload::Layer<BoxedLayer, Registry>, Registry>>;

static FACTORY: OnceLock<LoggerFactory> = OnceLock::new();

/// Install the process wide logger using `config`.
///
/// Fails if logging was already initialized or another global subscriber is installed.
pub fn init(config: LogConfig) -> Result<&'static LoggerFactory> {
    if FACTORY.get().is_some() {
        bail!("logging is already initialized");
    }
    let (factory, subscriber) = LoggerFactory::stderr(config);
    subscriber.try_init()?;
    Ok(FACTORY.get_or_init(|| factory))
}

/// Return a logger whose records are tagged with `name`.
///
/// The first call installs the process wide logger from the environment when [`init`] was
/// not called.
pub fn get_logger(name: &str) -> ScopedLogger {
    FACTORY
        .get_or_init(|| {
            let (factory, subscriber) = LoggerFactory::stderr(LogConfig::from_env());
            // Records go to the existing global subscriber if one is already installed.
            let _ = subscriber.try_init();
            factory
        })
        .logger(name)
}

/// Re-read the `DEBUG` environment variable and switch the process wide profile.
pub fn reload_from_env() -> Result<()> {
    match FACTORY.get() {
        Some(factory) => factory.reload(LogConfig::from_env()),
        None => init(LogConfig::from_env()).map(|_| ()),
    }
}

/// Builds and reconfigures the logging pipeline for one output.
pub struct LoggerFactory<W = fn() -> io::Stderr> {
    writer: W,
    ansi: bool,
    clock: Arc<dyn Clock>,
    config: RwLock<LogConfig>,
    gate: ProfileGate,
    output: reload::Handle<BoxedLayer, Registry>,
}

impl LoggerFactory {
    fn stderr(config: LogConfig) -> (Self, LogSubscriber) {
        let writer: fn() -> io::Stderr = io::stderr;
        Self::build(
            config,
            writer,
            io::stderr().is_terminal(),
            Arc::new(MonotonicClock),
        )
    }
}

impl<W> LoggerFactory<W>
where
    W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
{
    /// Create a factory writing to `writer` together with the subscriber it controls.
    ///
    /// The subscriber is not installed; use it with `tracing::subscriber::with_default`
    /// or install it yourself.
    pub fn with_writer(config: LogConfig, writer: W) -> (Self, LogSubscriber) {
        Self::build(config, writer, false, Arc::new(MonotonicClock))
    }

    pub(crate) fn build(
        config: LogConfig,
        writer: W,
        ansi: bool,
        clock: Arc<dyn Clock>,
    ) -> (Self, LogSubscriber) {
        let profile = config.profile();
        let gate = ProfileGate::new(profile.level, sampler(&profile, &clock));
        let (output, handle) =
            reload::Layer::new(output_layer(&profile, writer.clone(), ansi));
        let subscriber = Registry::default().with(output).with(gate.clone());
        let factory = Self {
            writer,
            ansi,
            clock,
            config: RwLock::new(config),
            gate,
            output: handle,
        };
        (factory, subscriber)
    }

    /// Configuration currently in effect.
    pub fn config(&self) -> LogConfig {
        *self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the installed subscriber to the profile selected by `config`.
    ///
    /// Sampling counters start over.
    pub fn reload(&self, config: LogConfig) -> Result<()> {
        let profile = config.profile();
        self.output
            .reload(output_layer(&profile, self.writer.clone(), self.ansi))?;
        self.gate.set(profile.level, sampler(&profile, &self.clock));
        tracing::callsite::rebuild_interest_cache();
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        self.flush();
        Ok(())
    }

    /// Return a logger whose records are tagged with `name`.
    pub fn logger(&self, name: &str) -> ScopedLogger {
        self.flush();
        ScopedLogger::new(name)
    }

    fn flush(&self) {
        let _ = self.writer.make_writer().flush();
    }
}

impl<W> fmt::Debug for LoggerFactory<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("ansi", &self.ansi)
            .field(
                "config",
                &*self.config.read().unwrap_or_else(PoisonError::into_inner),
            )
            .finish_non_exhaustive()
    }
}

fn sampler(profile: &Profile, clock: &Arc<dyn Clock>) -> Option<Sampler> {
    profile
        .sampling
        .map(|policy| Sampler::new(policy, clock.clone()))
}

// Stack traces are only rendered for the console encoding.
fn output_layer<W>(profile: &Profile, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    match profile.encoding {
        Encoding::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
        Encoding::Console if profile.stacktrace_on_error => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .event_format(StacktraceOnError::new(
                tracing_subscriber::fmt::format().compact(),
            ))
            .boxed(),
        Encoding::Console => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .compact()
            .boxed(),
    }
}

/// Logger scoped to a component name.
///
/// Every record carries a `logger` field holding the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedLogger {
    name: Arc<str>,
}

impl ScopedLogger {
    fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    /// Name attached to every record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child logger named `<parent>.<child>`.
    pub fn named(&self, child: &str) -> Self {
        Self::new(&format!("{}.{}", self.name, child))
    }

    /// Span carrying the logger name, for use with the `tracing` macros.
    pub fn span(&self) -> Span {
        tracing::info_span!("logger", logger = %self.name)
    }

    /// Run `f` inside [`ScopedLogger::span`].
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span().in_scope(f)
    }

    /// Emit a debug record.
    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(logger = %self.name, "{message}");
    }

    /// Emit an info record.
    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(logger = %self.name, "{message}");
    }

    /// Emit a warning record.
    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(logger = %self.name, "{message}");
    }

    /// Emit an error record.
    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(logger = %self.name, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use serde_json::Value;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    use super::{sampling::test::ManualClock, *};

    /// In-memory sink shared between the test and the subscriber.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect()
        }

        fn records(&self) -> Vec<Value> {
            self.lines()
                .iter()
                .map(|line| serde_json::from_str(line).expect("json record"))
                .collect()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    const PRODUCTION: LogConfig = LogConfig { debug: false };
    const DEVELOPMENT: LogConfig = LogConfig { debug: true };

    #[test]
    fn development_accepts_debug_and_traces_errors() {
        let buffer = Buffer::default();
        let (factory, subscriber) = LoggerFactory::with_writer(DEVELOPMENT, buffer.clone());
        with_default(subscriber, || {
            let log = factory.logger("reconciler");
            log.debug("looking up build config");
            log.error("failed to create route");
        });

        let output = buffer.lines().join("\n");
        assert!(output.contains("looking up build config"), "{output}");
        assert!(output.contains("failed to create route"), "{output}");
        assert!(output.contains("stacktrace:"), "{output}");
        // Console lines are not JSON.
        assert!(serde_json::from_str::<Value>(&buffer.lines()[0]).is_err());
    }

    #[test]
    fn production_rejects_debug_and_emits_json() {
        let buffer = Buffer::default();
        let (factory, subscriber) = LoggerFactory::with_writer(PRODUCTION, buffer.clone());
        with_default(subscriber, || {
            let log = factory.logger("reconciler");
            log.debug("looking up build config");
            log.error("failed to create route");
        });

        let records = buffer.records();
        assert_eq!(records.len(), 1, "{records:?}");
        let record = &records[0];
        assert_eq!(record["level"], "ERROR");
        assert_eq!(record["message"], "failed to create route");
        assert_eq!(record["logger"], "reconciler");
        assert!(record["timestamp"].is_string());
        assert!(!buffer.lines()[0].contains("stacktrace"));
    }

    #[test]
    fn production_samples_identical_records() {
        let buffer = Buffer::default();
        let clock = ManualClock::new();
        let (factory, subscriber) =
            LoggerFactory::build(PRODUCTION, buffer.clone(), false, clock.clone());
        with_default(subscriber, || {
            let log = factory.logger("reconciler");
            for _ in 0..150 {
                log.warn("image stream tag not found");
            }
            assert_eq!(buffer.lines().len(), 100);

            clock.advance(Duration::from_secs(1));
            log.warn("image stream tag not found");
        });
        assert_eq!(buffer.lines().len(), 101);
    }

    #[test]
    fn development_does_not_sample() {
        let buffer = Buffer::default();
        let clock = ManualClock::new();
        let (factory, subscriber) =
            LoggerFactory::build(DEVELOPMENT, buffer.clone(), false, clock);
        with_default(subscriber, || {
            let log = factory.logger("reconciler");
            for _ in 0..150 {
                log.info("requeue");
            }
        });
        assert_eq!(buffer.lines().len(), 150);
    }

    #[test]
    fn records_are_tagged_with_logger_name() {
        let buffer = Buffer::default();
        let (factory, subscriber) = LoggerFactory::with_writer(PRODUCTION, buffer.clone());
        with_default(subscriber, || {
            factory.logger("reconciler").info("reconciling");
            factory.logger("webhook").info("reconciling");
            factory.logger("reconciler").named("builds").info("reconciling");
        });

        let loggers: Vec<_> = buffer
            .records()
            .iter()
            .map(|record| record["logger"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(loggers, ["reconciler", "webhook", "reconciler.builds"]);
    }

    #[test]
    fn in_scope_tags_raw_events() {
        let buffer = Buffer::default();
        let (factory, subscriber) = LoggerFactory::with_writer(PRODUCTION, buffer.clone());
        with_default(subscriber, || {
            factory
                .logger("reconciler")
                .in_scope(|| tracing::info!(kind = "Route", "resource created"));
        });

        let records = buffer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["kind"], "Route");
        assert_eq!(records[0]["span"]["logger"], "reconciler");
    }

    #[test]
    fn global_logger_installs_once() {
        let first = get_logger("reconciler");
        let second = get_logger("reconciler");
        assert_eq!(first, second);
        assert!(init(PRODUCTION).is_err());
        reload_from_env().unwrap();
    }

    #[test]
    fn reload_switches_profile() {
        let buffer = Buffer::default();
        let (factory, subscriber) = LoggerFactory::with_writer(PRODUCTION, buffer.clone());
        with_default(subscriber, || {
            let log = factory.logger("reconciler");
            log.debug("before reload");
            factory.reload(DEVELOPMENT).unwrap();
            log.debug("after reload");
        });

        assert_eq!(factory.config(), DEVELOPMENT);
        let output = buffer.lines().join("\n");
        assert!(!output.contains("before reload"), "{output}");
        assert!(output.contains("after reload"), "{output}");
    }
}
