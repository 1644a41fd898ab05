use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{ClassifyEntry, InitResult, ProgressEvent, ProgressSink, ProgressSinkKind, RunReport};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(result: &RunReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_classify(result: &[ClassifyEntry]) -> io::Result<()> {
        Self::print_json(&result)
    }

    pub fn print_init(result: &InitResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the tracing subscriber.
pub struct LogSink {
    kind: ProgressSinkKind,
}

impl LogSink {
    pub fn new(kind: ProgressSinkKind) -> Self {
        Self { kind }
    }
}

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        let command = match self.kind {
            ProgressSinkKind::Build => "build",
            ProgressSinkKind::Classify => "classify",
            ProgressSinkKind::Init => "init",
        };
        match event.elapsed {
            Some(elapsed) => info!(
                command,
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => info!(command, "{}", event.message),
        }
    }
}
