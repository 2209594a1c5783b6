//! Platen composes a multi-layer card design into a single rasterized image.
//!
//! The pixel-producing work runs in an isolated rendering surface (a
//! dedicated renderer thread owning all raster resources) reachable only
//! through message passing. The crate's core is the cross-context render
//! pipeline:
//!
//! - fold an asset's layer fragments into one composed document
//!   (painter's-algorithm order, bottom layer first)
//! - expand the document's `{{ ... }}` templates against one bound data row
//!   and a helper set
//! - ship the document plus sizing metadata over a structurally validated
//!   wire contract
//! - rasterize on the isolated surface and reply with a PNG data URI,
//!   correlated back to the exact originating request
//!
//! [`RenderClient`] orchestrates the client side (lazy surface provisioning,
//! single-flight serialization, id correlation); [`RenderEpoch`] provides the
//! stale-response guard for consumers that trigger renders from fast-changing
//! state.
#![forbid(unsafe_code)]

mod foundation;

pub mod render;
pub mod scene;
pub mod session;
pub mod template;
pub mod wire;

pub use crate::foundation::core::RasterSize;
pub use crate::foundation::error::{PlatenError, PlatenResult};

pub use crate::render::backend::{
    InjectedDocument, RasterBitmap, Rasterizer, RasterizerKind, RasterizerOpts, create_rasterizer,
};
pub use crate::render::data_uri::decode_png;
pub use crate::render::server::{RenderServerOpts, SurfaceHandle, spawn_surface};
pub use crate::render::svg::SvgRasterizer;
pub use crate::scene::compose::{ComposedDocument, compose_document};
pub use crate::scene::model::{Asset, CardDef, DataRow, DataSource, Layer, LayerFragment};
pub use crate::session::epoch::{RenderEpoch, RenderKey};
pub use crate::session::render_client::{RenderClient, RenderClientOpts};
pub use crate::template::compile::{
    CompiledTemplate, ROW_KEY, TemplateCompiler, compiler_for_asset,
};
pub use crate::template::helpers::{HelperFn, builtin_helpers};
pub use crate::wire::message::{RenderRequest, RenderResponse};
