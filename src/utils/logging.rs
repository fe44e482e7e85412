use std::fmt;
use std::fmt::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
}

/// Install the global subscriber from the `[logging]` config section.
/// The returned guards must live until the program exits, or buffered log
/// lines are lost.
///
/// The subscriber always stacks one terminal layer and one file layer;
/// outputs missing from the config write to a sink.
pub fn setup() -> Result<Vec<WorkerGuard>> {
    let cfg: LoggingConfig = config().get("logging")?;

    let mut guards = Vec::new();
    let mut term = None;
    let mut file = None;
    for output in cfg.outputs.iter().filter(|o| o.enabled) {
        let (writer, guard) = output.target.to_writer();
        guards.push(guard);
        match output.target {
            LoggingTarget::Term(_) if term.is_none() => term = Some(writer),
            LoggingTarget::File(_) if file.is_none() => file = Some(writer),
            _ => {}
        }
    }
    let term = term.unwrap_or_else(|| discard(&mut guards));
    let file = file.unwrap_or_else(|| discard(&mut guards));

    Registry::default()
        .with(cfg.filter.to_env_filter())
        .with(
            FmtLayer::default()
                .with_ansi(true)
                .with_target(false)
                .with_timer(LocalTimeFormat)
                .with_writer(term),
        )
        .with(
            FmtLayer::default()
                .with_ansi(false)
                .with_target(false)
                .with_timer(LocalTimeFormat)
                .with_writer(file),
        )
        .try_init()?;

    Ok(guards)
}

fn discard(guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) = NonBlockingBuilder::default()
        .lossy(false)
        .finish(std::io::sink());
    guards.push(guard);
    writer
}

struct LocalTimeFormat;

impl FormatTime for LocalTimeFormat {
    fn format_time(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    filter: FilterConfig,
    #[serde(default)]
    outputs: Vec<LoggingOutput>,
}

#[derive(Debug, serde::Deserialize)]
struct FilterConfig {
    #[serde(default)]
    directives: Option<String>,
    #[serde(default)]
    from_env: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            directives: Some("info".into()),
            from_env: Some("RUST_LOG".into()),
        }
    }
}

impl FilterConfig {
    fn to_env_filter(&self) -> EnvFilter {
        let filter = match &self.from_env {
            Some(env) => EnvFilter::from_env(env),
            None => EnvFilter::default(),
        };

        match &self.directives {
            Some(dirs) => dirs
                .split(',')
                .filter_map(|s| match s.parse() {
                    Ok(d) => Some(d),
                    Err(err) => {
                        eprintln!("ignoring log directive `{}`: {}", s, err);
                        None
                    }
                })
                .fold(filter, |f, dir| f.add_directive(dir)),
            None => filter,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct LoggingOutput {
    enabled: bool,
    target: LoggingTarget,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
enum LoggingTarget {
    Term(TermOutput),
    File(FileOutput),
}

#[derive(Debug, serde::Deserialize)]
struct TermOutput {
    name: TermTarget,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum TermTarget {
    Stdout,
    Stderr,
}

#[derive(Debug, serde::Deserialize)]
struct FileOutput {
    directory: PathBuf,
    name: PathBuf,
}

impl LoggingTarget {
    fn to_writer(&self) -> (NonBlocking, WorkerGuard) {
        match self {
            LoggingTarget::Term(term) => match term.name {
                TermTarget::Stdout => NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(std::io::stdout()),
                TermTarget::Stderr => NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(std::io::stderr()),
            },
            LoggingTarget::File(file) => NonBlockingBuilder::default()
                .lossy(false)
                .finish(RollingFileAppender::new(Rotation::NEVER, &file.directory, &file.name)),
        }
    }
}
