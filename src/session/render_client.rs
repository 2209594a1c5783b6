use crate::foundation::core::RasterSize;
use crate::foundation::error::{PlatenError, PlatenResult};
use crate::render::backend::{RasterizerKind, RasterizerOpts, create_rasterizer};
use crate::render::server::{RenderServerOpts, SurfaceHandle, spawn_surface};
use crate::scene::compose::compose_document;
use crate::scene::model::Asset;
use crate::template::compile::compiler_for_asset;
use crate::wire::message::{RenderRequest, RenderResponse};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// Options controlling a [`RenderClient`].
#[derive(Clone, Debug)]
pub struct RenderClientOpts {
    /// Rasterizer backend provisioned into the surface on first use.
    pub rasterizer: RasterizerKind,
    /// Options for that rasterizer.
    pub rasterizer_opts: RasterizerOpts,
    /// Renderer-side server options.
    pub server: RenderServerOpts,
    /// How long to wait for the surface's ready signal on first use.
    pub surface_ready_timeout: Duration,
    /// How long to wait for a request's matched response.
    pub round_trip_timeout: Duration,
}

impl Default for RenderClientOpts {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerKind::Svg,
            rasterizer_opts: RasterizerOpts::default(),
            server: RenderServerOpts::default(),
            surface_ready_timeout: Duration::from_secs(5),
            round_trip_timeout: Duration::from_secs(30),
        }
    }
}

/// Client-side orchestrator of the render pipeline.
///
/// Owns the render channel session exclusively: the surface handle and the
/// request/response client are lazily created singletons, cached for the
/// client's lifetime and never recreated. [`render`](Self::render) is
/// single-flight: concurrent calls are fully serialized, so a later call's
/// composition step never interleaves with an earlier call's outstanding
/// round trip and the server sees at most one active raster job.
pub struct RenderClient {
    opts: RenderClientOpts,
    state: Mutex<ClientState>,
}

#[derive(Debug, Default)]
struct ClientState {
    surface: Option<SurfaceHandle>,
    wire: Option<WireClient>,
}

impl ClientState {
    /// Resolve both lazy singletons, provisioning them on first use.
    ///
    /// Callers already hold the client's state lock, so concurrent first
    /// users serialize here and observe the same created resources; a
    /// duplicate surface is impossible.
    fn parts(
        &mut self,
        opts: &RenderClientOpts,
    ) -> PlatenResult<(&mut SurfaceHandle, &mut WireClient)> {
        if self.surface.is_none() {
            let rasterizer = create_rasterizer(opts.rasterizer, &opts.rasterizer_opts)?;
            self.surface = Some(spawn_surface(
                rasterizer,
                opts.server,
                opts.surface_ready_timeout,
            )?);
        }
        if self.wire.is_none() {
            self.wire = Some(WireClient::new());
        }
        match (self.surface.as_mut(), self.wire.as_mut()) {
            (Some(surface), Some(wire)) => Ok((surface, wire)),
            _ => Err(PlatenError::protocol("render channel session unavailable")),
        }
    }
}

/// Request/response client bound to the surface channel: mints correlation
/// ids and performs the validated round trip.
#[derive(Debug)]
struct WireClient {
    next_id: u64,
}

impl WireClient {
    fn new() -> Self {
        Self { next_id: 0 }
    }

    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("req-{}", self.next_id)
    }

    /// Send a request and await the response whose id matches.
    ///
    /// Responses carrying any other id are protocol violations: logged and
    /// ignored, never applied. The wait is bounded by `timeout` overall.
    fn call(
        &self,
        surface: &SurfaceHandle,
        req: &RenderRequest,
        timeout: Duration,
    ) -> PlatenResult<RenderResponse> {
        surface.send(req.to_value()?)?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let payload = surface.recv_timeout(remaining)?;
            let resp = RenderResponse::from_value(&payload)?;
            if resp.id == req.id {
                return Ok(resp);
            }
            warn!(
                expected = %req.id,
                received = %resp.id,
                "ignoring render response with mismatched id"
            );
        }
    }
}

impl RenderClient {
    /// Create a client; the surface is not provisioned until the first
    /// render that needs it.
    pub fn new(opts: RenderClientOpts) -> Self {
        Self {
            opts,
            state: Mutex::new(ClientState::default()),
        }
    }

    /// Create a client bound to an already-provisioned surface.
    pub fn with_surface(opts: RenderClientOpts, surface: SurfaceHandle) -> Self {
        Self {
            opts,
            state: Mutex::new(ClientState {
                surface: Some(surface),
                wire: None,
            }),
        }
    }

    /// Render one asset against one of its data rows.
    ///
    /// Resolves to `Ok(Some(uri))` with a PNG data URI, or `Ok(None)` when
    /// the asset cannot be composed into a renderable document (it has no
    /// data source, or `data_row` is out of range); "nothing to show" is
    /// not an error. Template, validation, and channel failures propagate
    /// as errors.
    #[tracing::instrument(skip(self, asset))]
    pub fn render(&self, asset: &dyn Asset, data_row: usize) -> PlatenResult<Option<String>> {
        // The state lock doubles as the flight lock: held for the whole call
        // body, it serializes every step below, composition included.
        let mut state = self
            .state
            .lock()
            .map_err(|_| PlatenError::protocol("render client lock poisoned"))?;

        let doc = compose_document(asset);
        let size = RasterSize::new(asset.width(), asset.height())?;
        let Some(compiler) = compiler_for_asset(asset, data_row)? else {
            return Ok(None);
        };

        let (surface, wire) = state.parts(&self.opts)?;
        surface.set_viewport(size);
        let id = wire.mint_id();

        // The composed document is always template-expanded before
        // transmission; the compiler's bound row and helpers are the entire
        // evaluation context.
        let css = compiler.compile(&doc.css)?.render(None)?;
        let html = compiler.compile(&doc.html)?.render(None)?;

        let req = RenderRequest {
            id,
            css,
            html,
            width: size.width,
            height: size.height,
        };
        let resp = wire.call(surface, &req, self.opts.round_trip_timeout)?;
        Ok(Some(resp.uri))
    }
}
