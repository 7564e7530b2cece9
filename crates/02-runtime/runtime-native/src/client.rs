use anyhow::{Context, Result};
use log::debug;
use service_abi::{ClearDepth, ClearRaster, DepthBuffer, Dimensions, DrawCommand, RasterBuffer, Rgb};
use transport::{Endpoint, Event, ReadSemantics, RecordId, Reply};

/// The application's side of `DRIVER_IN` / `DRIVER_OUT`.
///
/// Every command blocks until the driver acknowledges it, so at most one
/// command is in flight per session.
#[derive(Clone, Debug)]
pub struct Client {
    endpoint: Endpoint,
    dims: Dimensions,
    read_semantics: ReadSemantics,
}

impl Client {
    /// Wraps an endpoint on the session's store.
    pub fn new(endpoint: Endpoint, dims: Dimensions, read_semantics: ReadSemantics) -> Self {
        Self {
            endpoint,
            dims,
            read_semantics,
        }
    }

    /// Writes `event` to `DRIVER_IN` and waits for the driver's `Done`.
    pub fn submit(&self, event: &Event) -> Result<()> {
        let outbox = RecordId::driver_out();
        if self.read_semantics == ReadSemantics::Retain {
            // Otherwise the previous command's retained `Done` answers this one.
            self.endpoint.send_reply(outbox, Reply::Idle)?;
        }
        debug!("client: submitting {:?}", event.kind());
        self.endpoint
            .send_event(RecordId::driver_in(), event)
            .with_context(|| format!("submitting {:?}", event.kind()))?;
        loop {
            match self.endpoint.receive_reply(outbox)? {
                Reply::Done => return Ok(()),
                Reply::Idle => self.endpoint.pause(outbox),
            }
        }
    }

    /// Submits one triangle.
    pub fn draw(&self, cmd: &DrawCommand) -> Result<()> {
        self.submit(&cmd.to_event()?)
    }

    /// Fills the raster matrix with `rgb`.
    pub fn clear_raster(&self, rgb: Rgb) -> Result<()> {
        self.submit(&ClearRaster(rgb).to_event())
    }

    /// Fills the depth matrix with `depth`.
    pub fn clear_depth(&self, depth: i32) -> Result<()> {
        self.submit(&ClearDepth(depth).to_event())
    }

    /// Asks the driver to stop itself and every triangulator.
    pub fn shutdown(&self) -> Result<()> {
        self.submit(&Event::shutdown())
    }

    /// Current contents of the raster matrix.
    pub fn raster(&self) -> Result<RasterBuffer> {
        let bytes = self.endpoint.load_matrix(RecordId::raster_matrix())?;
        Ok(RasterBuffer::from_bytes(self.dims, bytes)?)
    }

    /// Current contents of the depth matrix.
    pub fn depth(&self) -> Result<DepthBuffer> {
        let bytes = self.endpoint.load_matrix(RecordId::depth_matrix())?;
        Ok(DepthBuffer::from_bytes(self.dims, bytes)?)
    }
}
