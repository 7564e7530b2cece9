//! Triangulator worker.
//!
//! Each worker owns one `T<n>_IN` / `T<n>_OUT` pair. A `DRAW` is rasterized
//! into the worker's scratch arena and merged into the shared matrix records
//! with a load, resolve, store cycle. Every inbound event except `SHUTDOWN`
//! is answered with `Done`, even when the draw itself failed.
//!
//! Two workers resolving at the same time race on the matrices; nothing
//! arbitrates the read-modify-write.

use std::fmt;

use log::{debug, error, info};
use raster::{Rasterizer, Shading, Triangle, DEFAULT_CAPACITY};
use service_abi::{
    absorb, DepthBuffer, Dimensions, DrawCommand, Failure, FailureKind, Participant, RasterBuffer,
    Step,
};
use transport::{Endpoint, Event, EventKind, ReadSemantics, RecordId, RecordResult, Reply};

#[derive(Clone, Debug)]
pub struct TriangulatorConfig {
    /// The `n` in `T<n>`.
    pub index: u32,
    pub dims: Dimensions,
    pub shading: Shading,
    pub scratch_capacity: usize,
    pub read_semantics: ReadSemantics,
}

impl TriangulatorConfig {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            dims: Dimensions::default(),
            shading: Shading::default(),
            scratch_capacity: DEFAULT_CAPACITY,
            read_semantics: ReadSemantics::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriangulatorStats {
    pub draws: u64,
    pub samples: u64,
    pub written: u64,
    pub clipped: u64,
    pub failures: u64,
}

pub struct Triangulator {
    endpoint: Endpoint,
    config: TriangulatorConfig,
    rasterizer: Rasterizer,
    stats: TriangulatorStats,
}

impl Triangulator {
    pub fn new(endpoint: Endpoint, config: TriangulatorConfig) -> Self {
        let rasterizer = Rasterizer::new(config.scratch_capacity);
        Self {
            endpoint,
            config,
            rasterizer,
            stats: TriangulatorStats::default(),
        }
    }

    pub fn index(&self) -> u32 {
        self.config.index
    }

    pub fn stats(&self) -> &TriangulatorStats {
        &self.stats
    }

    fn inbox(&self) -> RecordId {
        RecordId::triangulator_in(self.config.index)
    }

    fn outbox(&self) -> RecordId {
        RecordId::triangulator_out(self.config.index)
    }

    fn report(index: u32, stats: &mut TriangulatorStats, failure: Failure) {
        error!("T{index}: {failure}");
        stats.failures += 1;
    }

    fn absorb<T>(&mut self, result: RecordResult<T>, kind: FailureKind) -> RecordResult<Option<T>> {
        let (index, stats) = (self.config.index, &mut self.stats);
        absorb(result, kind, |failure| Self::report(index, stats, failure))
    }

    /// Reports a command-level error and yields `None` in its place.
    fn command<T, E: fmt::Display>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                Self::report(self.config.index, &mut self.stats, Failure::command(err));
                None
            }
        }
    }

    fn pre_clear(&mut self) -> RecordResult<()> {
        if self.config.read_semantics == ReadSemantics::Retain {
            let cleared = self.endpoint.send_event(self.inbox(), &Event::none());
            self.absorb(cleared, FailureKind::Event)?;
        }
        Ok(())
    }

    fn reply_done(&mut self) -> RecordResult<()> {
        let sent = self.endpoint.send_reply(self.outbox(), Reply::Done);
        self.absorb(sent, FailureKind::Event)?;
        Ok(())
    }

    fn draw(&mut self, event: &Event) -> RecordResult<()> {
        let Some(cmd) = self.command(DrawCommand::parse(event)) else {
            return Ok(());
        };
        let triangle = Triangle::from(cmd);
        let drawn = self.rasterizer.draw_triangle(&triangle);
        let Some(report) = self.command(drawn) else {
            return Ok(());
        };
        self.stats.draws += 1;
        self.stats.samples += report.samples as u64;
        debug!(
            "T{}: rasterized {} samples ({} paired, {} unpaired)",
            self.config.index, report.samples, report.paired, report.unpaired
        );

        let dims = self.config.dims;
        let loaded = self.endpoint.load_matrix(RecordId::raster_matrix());
        let Some(bytes) = self.absorb(loaded, FailureKind::Command)? else {
            return Ok(());
        };
        let Some(mut raster) = self.command(RasterBuffer::from_bytes(dims, bytes)) else {
            return Ok(());
        };
        let loaded = self.endpoint.load_matrix(RecordId::depth_matrix());
        let Some(bytes) = self.absorb(loaded, FailureKind::Command)? else {
            return Ok(());
        };
        let Some(mut depth) = self.command(DepthBuffer::from_bytes(dims, bytes)) else {
            return Ok(());
        };

        let resolved = self
            .rasterizer
            .resolve(&mut raster, &mut depth, &self.config.shading);
        self.stats.written += resolved.written as u64;
        self.stats.clipped += resolved.clipped as u64;

        let stored = self
            .endpoint
            .store_matrix(RecordId::raster_matrix(), raster.as_bytes());
        self.absorb(stored, FailureKind::Command)?;
        let stored = self
            .endpoint
            .store_matrix(RecordId::depth_matrix(), depth.as_bytes());
        self.absorb(stored, FailureKind::Command)?;
        Ok(())
    }
}

impl Participant for Triangulator {
    fn name(&self) -> String {
        format!("T{}", self.config.index)
    }

    fn step(&mut self) -> RecordResult<Step> {
        let received = self.endpoint.receive_event(self.inbox());
        let Some(event) = self.absorb(received, FailureKind::Event)? else {
            // The driver is waiting on this worker whatever arrived.
            self.pre_clear()?;
            self.reply_done()?;
            return Ok(Step::Continue);
        };

        match event.kind() {
            EventKind::None => {
                self.endpoint.pause(self.inbox());
                Ok(Step::Continue)
            }
            EventKind::Shutdown => {
                self.pre_clear()?;
                info!("T{}: shutting down", self.config.index);
                Ok(Step::Stop)
            }
            EventKind::Draw => {
                self.pre_clear()?;
                self.draw(&event)?;
                self.reply_done()?;
                Ok(Step::Continue)
            }
            EventKind::ClearRaster | EventKind::ClearDepth => {
                self.pre_clear()?;
                debug!("T{}: ignoring {:?}", self.config.index, event.kind());
                self.reply_done()?;
                Ok(Step::Continue)
            }
        }
    }
}
