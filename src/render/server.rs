use crate::foundation::core::RasterSize;
use crate::foundation::error::{PlatenError, PlatenResult};
use crate::render::backend::{InjectedDocument, Rasterizer};
use crate::render::surface::RasterSurface;
use crate::wire::message::{RenderRequest, RenderResponse};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, error};

/// Options controlling the renderer-side server.
#[derive(Clone, Copy, Debug)]
pub struct RenderServerOpts {
    /// Delay between document injection and rasterization, giving resources
    /// referenced by the injected markup time to load. A heuristic for a
    /// known race, not a correctness guarantee.
    pub settle_delay: Duration,
}

impl Default for RenderServerOpts {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(150),
        }
    }
}

/// The renderer-side server: converts exactly one request into exactly one
/// response.
///
/// All raster resources are provisioned once at construction and hot-reused:
/// the document slot and the reserved surface are overwritten wholesale on
/// each request, so the server holds no other cross-request state.
pub(crate) struct RenderServer {
    document: InjectedDocument,
    surface: RasterSurface,
    rasterizer: Box<dyn Rasterizer>,
    opts: RenderServerOpts,
}

impl RenderServer {
    pub(crate) fn new(
        rasterizer: Box<dyn Rasterizer>,
        opts: RenderServerOpts,
    ) -> PlatenResult<Self> {
        Ok(Self {
            document: InjectedDocument::default(),
            surface: RasterSurface::new(RasterSize {
                width: 1,
                height: 1,
            })?,
            rasterizer,
            opts,
        })
    }

    /// Serve one request payload, producing the validated response payload.
    pub(crate) fn handle(&mut self, payload: &Value) -> PlatenResult<Value> {
        let req = RenderRequest::from_value(payload)?;
        debug!(id = %req.id, width = req.width, height = req.height, "render request");

        // Inject into the reserved slots, replacing the previous contents.
        self.document.css.clear();
        self.document.css.push_str(&req.css);
        self.document.html.clear();
        self.document.html.push_str(&req.html);

        self.surface.resize(RasterSize {
            width: req.width,
            height: req.height,
        })?;

        if !self.opts.settle_delay.is_zero() {
            std::thread::sleep(self.opts.settle_delay);
        }

        let bitmap = self.rasterizer.rasterize(&self.document)?;
        self.surface.draw_scaled(&bitmap)?;
        let uri = self.surface.to_png_data_uri()?;

        RenderResponse { id: req.id, uri }.to_value()
    }
}

/// Client-side owner of the isolated rendering surface: the renderer thread
/// plus the two channel endpoints that reach it.
///
/// The server thread exits when the handle is dropped and its request sender
/// disconnects.
#[derive(Debug)]
pub struct SurfaceHandle {
    tx: Sender<Value>,
    rx: Receiver<Value>,
    viewport: Option<RasterSize>,
}

impl SurfaceHandle {
    /// Wrap pre-opened channel endpoints to a live peer.
    ///
    /// The regular constructor is [`spawn_surface`]; this one lets tests and
    /// alternative hosts stand in for the renderer thread.
    pub fn from_channel(tx: Sender<Value>, rx: Receiver<Value>) -> Self {
        Self {
            tx,
            rx,
            viewport: None,
        }
    }

    /// Cosmetic size of the hidden surface, independent of any request's
    /// raster target dimensions.
    pub fn viewport(&self) -> Option<RasterSize> {
        self.viewport
    }

    /// Resize the hidden surface (cosmetic only).
    pub fn set_viewport(&mut self, size: RasterSize) {
        self.viewport = Some(size);
    }

    pub(crate) fn send(&self, payload: Value) -> PlatenResult<()> {
        self.tx
            .send(payload)
            .map_err(|_| PlatenError::protocol("render surface channel closed"))
    }

    pub(crate) fn recv_timeout(&self, timeout: Duration) -> PlatenResult<Value> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => {
                PlatenError::protocol("timed out awaiting render response")
            }
            RecvTimeoutError::Disconnected => {
                PlatenError::protocol("render surface channel closed")
            }
        })
    }
}

/// Provision the isolated rendering surface: spawn the renderer thread, open
/// its channels, and block until it signals that provisioning finished.
///
/// A surface that does not become ready within `ready_timeout` is a protocol
/// error; there is no retry, since a surface that cannot come up is a
/// host-level fault.
pub fn spawn_surface(
    rasterizer: Box<dyn Rasterizer>,
    opts: RenderServerOpts,
    ready_timeout: Duration,
) -> PlatenResult<SurfaceHandle> {
    let (req_tx, req_rx) = mpsc::channel::<Value>();
    let (resp_tx, resp_rx) = mpsc::channel::<Value>();
    let (ready_tx, ready_rx) = mpsc::channel::<()>();

    std::thread::Builder::new()
        .name("platen-render-surface".to_owned())
        .spawn(move || run_surface(rasterizer, opts, ready_tx, req_rx, resp_tx))
        .map_err(|e| PlatenError::protocol(format!("spawn render surface thread: {e}")))?;

    ready_rx.recv_timeout(ready_timeout).map_err(|_| {
        PlatenError::protocol("render surface did not signal ready in time")
    })?;

    Ok(SurfaceHandle::from_channel(req_tx, resp_rx))
}

fn run_surface(
    rasterizer: Box<dyn Rasterizer>,
    opts: RenderServerOpts,
    ready_tx: Sender<()>,
    rx: Receiver<Value>,
    tx: Sender<Value>,
) {
    let mut server = match RenderServer::new(rasterizer, opts) {
        Ok(s) => s,
        Err(e) => {
            // Ready is never signaled; the creator times out.
            error!(error = %e, "render surface failed to provision");
            return;
        }
    };
    let _ = ready_tx.send(());
    drop(ready_tx);

    while let Ok(payload) = rx.recv() {
        match server.handle(&payload) {
            Ok(reply) => {
                if tx.send(reply).is_err() {
                    break;
                }
            }
            Err(e) => {
                // The wire contract has no error reply shape; a request the
                // server cannot serve is fatal to the surface.
                error!(error = %e, "render surface terminated");
                return;
            }
        }
    }
    debug!("render surface channel closed");
}
