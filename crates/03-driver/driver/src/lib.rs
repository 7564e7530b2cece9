//! Scheduling driver.
//!
//! The driver polls `DRIVER_IN` for application commands. Clears are applied
//! directly to the matrix records; draws are handed to one triangulator at a
//! time, round-robin, and the driver blocks on that worker's reply before it
//! acknowledges on `DRIVER_OUT`. `SHUTDOWN` is forwarded to every worker and
//! ends the loop.

use log::{debug, error, info};
use service_abi::{
    absorb, ClearDepth, ClearRaster, DepthBuffer, Dimensions, Failure, FailureKind, Participant,
    RasterBuffer, Rgb, Status, Step,
};
use smallvec::SmallVec;
use transport::{
    Endpoint, Event, EventKind, ReadSemantics, RecordId, RecordResult, Reply,
};

/// Triangulator indices the driver dispatches to.
pub type Roster = SmallVec<[u32; 8]>;

#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub dims: Dimensions,
    pub triangulators: Roster,
    pub read_semantics: ReadSemantics,
    /// Colour the raster matrix is seeded with.
    pub initial_color: Rgb,
    /// Depth the depth matrix is seeded with.
    pub initial_depth: i32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dims: Dimensions::default(),
            triangulators: SmallVec::from_slice(&[1]),
            read_semantics: ReadSemantics::default(),
            initial_color: Rgb::default(),
            initial_depth: 0,
        }
    }
}

/// Per-kind event counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    handled: [u64; 5],
    pub failures: u64,
}

impl DriverStats {
    pub fn handled(&self, kind: EventKind) -> u64 {
        self.handled[kind.code() as usize]
    }

    fn record(&mut self, kind: EventKind) {
        self.handled[kind.code() as usize] += 1;
    }
}

pub struct Driver {
    endpoint: Endpoint,
    config: DriverConfig,
    next: usize,
    stats: DriverStats,
}

impl Driver {
    pub fn new(endpoint: Endpoint, config: DriverConfig) -> Self {
        Self {
            endpoint,
            config,
            next: 0,
            stats: DriverStats::default(),
        }
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Prepares the records the session starts from: an idle `DRIVER_OUT`
    /// and both matrices seeded with the configured clear values.
    pub fn initialize(&mut self) -> Status {
        let dims = self.config.dims;
        self.endpoint
            .send_reply(RecordId::driver_out(), Reply::Idle)
            .map_err(Failure::initialization)?;
        let raster = RasterBuffer::filled(dims, self.config.initial_color.into());
        self.endpoint
            .store_matrix(RecordId::raster_matrix(), raster.as_bytes())
            .map_err(Failure::initialization)?;
        let depth = DepthBuffer::filled(dims, self.config.initial_depth);
        self.endpoint
            .store_matrix(RecordId::depth_matrix(), depth.as_bytes())
            .map_err(Failure::initialization)?;
        info!(
            "driver: initialized {}x{} matrices for {} triangulator(s)",
            dims.width,
            dims.height,
            self.config.triangulators.len()
        );
        Ok(())
    }

    fn report(stats: &mut DriverStats, failure: Failure) {
        error!("driver: {failure}");
        stats.failures += 1;
    }

    fn absorb<T>(&mut self, result: RecordResult<T>, kind: FailureKind) -> RecordResult<Option<T>> {
        let stats = &mut self.stats;
        absorb(result, kind, |failure| Self::report(stats, failure))
    }

    fn retains(&self) -> bool {
        self.config.read_semantics == ReadSemantics::Retain
    }

    /// Marks `DRIVER_IN` handled when reads leave the payload in place.
    fn pre_clear(&mut self) -> RecordResult<()> {
        if self.retains() {
            let cleared = self
                .endpoint
                .send_event(RecordId::driver_in(), &Event::none());
            self.absorb(cleared, FailureKind::Event)?;
        }
        Ok(())
    }

    fn acknowledge(&mut self) -> RecordResult<()> {
        let sent = self
            .endpoint
            .send_reply(RecordId::driver_out(), Reply::Done);
        self.absorb(sent, FailureKind::Event)?;
        Ok(())
    }

    fn clear_raster(&mut self, event: &Event) -> RecordResult<()> {
        let ClearRaster(rgb) = match ClearRaster::parse(event) {
            Ok(cmd) => cmd,
            Err(failure) => {
                Self::report(&mut self.stats, failure);
                return Ok(());
            }
        };
        let raster = RasterBuffer::filled(self.config.dims, rgb.into());
        let stored = self
            .endpoint
            .store_matrix(RecordId::raster_matrix(), raster.as_bytes());
        self.absorb(stored, FailureKind::Command)?;
        Ok(())
    }

    fn clear_depth(&mut self, event: &Event) -> RecordResult<()> {
        let ClearDepth(value) = match ClearDepth::parse(event) {
            Ok(cmd) => cmd,
            Err(failure) => {
                Self::report(&mut self.stats, failure);
                return Ok(());
            }
        };
        let depth = DepthBuffer::filled(self.config.dims, value);
        let stored = self
            .endpoint
            .store_matrix(RecordId::depth_matrix(), depth.as_bytes());
        self.absorb(stored, FailureKind::Command)?;
        Ok(())
    }

    /// Hands a draw to the next triangulator and waits for its `Done`.
    fn dispatch(&mut self, event: &Event) -> RecordResult<()> {
        let roster = &self.config.triangulators;
        if roster.is_empty() {
            Self::report(
                &mut self.stats,
                Failure::command("no triangulators are configured"),
            );
            return Ok(());
        }
        let index = roster[self.next % roster.len()];
        self.next = self.next.wrapping_add(1);
        let (inbox, outbox) = (
            RecordId::triangulator_in(index),
            RecordId::triangulator_out(index),
        );

        if self.retains() {
            // A retained reply from the previous draw must not satisfy this one.
            let cleared = self.endpoint.send_reply(outbox, Reply::Idle);
            self.absorb(cleared, FailureKind::Event)?;
        }
        debug!("driver: dispatching DRAW to T{index}");
        let sent = self.endpoint.send_event(inbox, event);
        if self.absorb(sent, FailureKind::Event)?.is_some() {
            self.await_done(outbox)?;
        }
        Ok(())
    }

    fn await_done(&mut self, outbox: RecordId) -> RecordResult<()> {
        loop {
            let reply = self.endpoint.receive_reply(outbox);
            match self.absorb(reply, FailureKind::Event)? {
                Some(Reply::Done) => return Ok(()),
                Some(Reply::Idle) => self.endpoint.pause(outbox),
                // The malformed reply was already claimed; waiting on would
                // block forever.
                None => return Ok(()),
            }
        }
    }

    fn broadcast_shutdown(&mut self) -> RecordResult<()> {
        let roster = self.config.triangulators.clone();
        for index in roster {
            let sent = self
                .endpoint
                .send_event(RecordId::triangulator_in(index), &Event::shutdown());
            self.absorb(sent, FailureKind::Event)?;
        }
        Ok(())
    }
}

impl Participant for Driver {
    fn name(&self) -> String {
        "driver".into()
    }

    /// Handles exactly one inbound event.
    fn step(&mut self) -> RecordResult<Step> {
        let received = self.endpoint.receive_event(RecordId::driver_in());
        let Some(event) = self.absorb(received, FailureKind::Event)? else {
            self.pre_clear()?;
            self.acknowledge()?;
            return Ok(Step::Continue);
        };

        if event.kind() == EventKind::None {
            self.stats.record(EventKind::None);
            self.endpoint.pause(RecordId::driver_in());
            return Ok(Step::Continue);
        }
        self.pre_clear()?;

        self.stats.record(event.kind());
        let step = match event.kind() {
            EventKind::None => Step::Continue,
            EventKind::Draw => {
                self.dispatch(&event)?;
                Step::Continue
            }
            EventKind::ClearRaster => {
                debug!("driver: clearing raster matrix");
                self.clear_raster(&event)?;
                Step::Continue
            }
            EventKind::ClearDepth => {
                debug!("driver: clearing depth matrix");
                self.clear_depth(&event)?;
                Step::Continue
            }
            EventKind::Shutdown => {
                info!("driver: shutting down");
                self.broadcast_shutdown()?;
                Step::Stop
            }
        };
        self.acknowledge()?;
        Ok(step)
    }
}
