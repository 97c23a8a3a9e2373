//! Replay loop: source → pipeline → JSON lines sink, until EOF or cancellation.

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::source::{CycleEvent, CycleSource};
use super::{CycleOutput, PipelineStats, SpaceWeatherPipeline};

/// Which timestamp a replayed cycle is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayClock {
    /// The cycle's own sample timestamp (deterministic replay)
    #[default]
    SampleTime,
    /// Wall-clock time when the cycle is processed
    WallClock,
}

pub struct ProcessingLoop<W> {
    pipeline: SpaceWeatherPipeline,
    sink: W,
    cancel_token: CancellationToken,
    clock: ReplayClock,
    pretty: bool,
}

impl<W: AsyncWrite + Unpin + Send> ProcessingLoop<W> {
    pub fn new(pipeline: SpaceWeatherPipeline, sink: W, cancel_token: CancellationToken) -> Self {
        Self { pipeline, sink, cancel_token, clock: ReplayClock::default(), pretty: false }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: ReplayClock) -> Self {
        self.clock = clock;
        self
    }

    /// Pretty-print each output record instead of one compact line.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Run until the source is exhausted, a write fails, or cancellation.
    ///
    /// Returns final pipeline statistics.
    pub async fn run<S: CycleSource>(mut self, source: &mut S) -> PipelineStats {
        info!(source = source.source_name(), "Processing telemetry cycles");

        loop {
            let event = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
                result = source.next_cycle() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!(error = %e, "Source error");
                            break;
                        }
                    }
                }
            };

            let cycle = match event {
                CycleEvent::Cycle(c) => c,
                CycleEvent::Eof => {
                    info!(cycles = self.pipeline.get_stats().cycles_processed, "Source reached end");
                    break;
                }
            };

            let now = match self.clock {
                ReplayClock::SampleTime => cycle.sample.timestamp,
                ReplayClock::WallClock => chrono::Utc::now(),
            };
            let output = self.pipeline.run_cycle(&cycle, now).await;

            if let Err(e) = self.emit(&output).await {
                warn!(error = %e, "Output sink closed");
                break;
            }
        }

        if let Err(e) = self.sink.flush().await {
            warn!(error = %e, "Failed to flush output");
        }
        let stats = self.pipeline.get_stats();
        info!("{stats}");
        stats
    }

    async fn emit(&mut self, output: &CycleOutput) -> std::io::Result<()> {
        let mut line = encode(output, self.pretty)?;
        line.push(b'\n');
        self.sink.write_all(&line).await
    }
}

fn encode<T: Serialize>(value: &T, pretty: bool) -> std::io::Result<Vec<u8>> {
    let bytes = if pretty { serde_json::to_vec_pretty(value) } else { serde_json::to_vec(value) };
    bytes.map_err(std::io::Error::from)
}
