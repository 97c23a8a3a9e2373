//! Telemetry cycle sources for the replay harness.
//!
//! A unified trait for reading [`TelemetryCycle`]s: pre-loaded vectors
//! (tests, synthetic replay) and JSON lines from stdin or a file.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::types::TelemetryCycle;

/// Events produced by a cycle source.
#[derive(Debug)]
pub enum CycleEvent {
    Cycle(Box<TelemetryCycle>),
    /// No more data
    Eof,
}

/// Where telemetry cycles come from.
///
/// The replay loop calls [`next_cycle`](CycleSource::next_cycle) in a
/// `select!` with cancellation.
#[async_trait]
pub trait CycleSource: Send {
    /// `Eof` when exhausted; `Err` only for unrecoverable read failures.
    async fn next_cycle(&mut self) -> Result<CycleEvent>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

// ============================================================================
// In-memory source
// ============================================================================

/// Replays pre-loaded cycles with an optional delay between them.
pub struct VecSource {
    cycles: std::vec::IntoIter<TelemetryCycle>,
    delay_ms: u64,
    yielded_first: bool,
}

impl VecSource {
    pub fn new(cycles: Vec<TelemetryCycle>, delay_ms: u64) -> Self {
        Self { cycles: cycles.into_iter(), delay_ms, yielded_first: false }
    }
}

#[async_trait]
impl CycleSource for VecSource {
    async fn next_cycle(&mut self) -> Result<CycleEvent> {
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.cycles.next() {
            Some(c) => {
                self.yielded_first = true;
                Ok(CycleEvent::Cycle(Box::new(c)))
            }
            None => Ok(CycleEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// JSON lines source (stdin / file)
// ============================================================================

/// Reads one JSON `TelemetryCycle` per line. Blank and malformed lines are
/// skipped with a warning.
pub struct JsonLinesSource<R> {
    reader: R,
    line_buffer: String,
    line_no: u64,
    name: String,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self { reader, line_buffer: String::with_capacity(2048), line_no: 0, name: name.into() }
    }
}

impl JsonLinesSource<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl JsonLinesSource<BufReader<tokio::fs::File>> {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("opening telemetry file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CycleSource for JsonLinesSource<R> {
    async fn next_cycle(&mut self) -> Result<CycleEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self
                .reader
                .read_line(&mut self.line_buffer)
                .await
                .with_context(|| format!("reading {}", self.name))?;
            if bytes == 0 {
                return Ok(CycleEvent::Eof);
            }
            self.line_no += 1;
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TelemetryCycle>(line) {
                Ok(cycle) => return Ok(CycleEvent::Cycle(Box::new(cycle))),
                Err(e) => warn!(source = %self.name, line = self.line_no, error = %e, "Skipping malformed cycle"),
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
