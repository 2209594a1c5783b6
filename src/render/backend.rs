use crate::foundation::core::RasterSize;
use crate::foundation::error::PlatenResult;
use std::path::PathBuf;

/// A rasterized bitmap as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct RasterBitmap {
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// The document a rasterizer renders: the server's reserved style and
/// root-content slots, overwritten wholesale per request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InjectedDocument {
    /// Stylesheet text injected into the reserved style slot.
    pub css: String,
    /// Markup injected into the reserved root container.
    pub html: String,
}

/// A renderer that turns an injected document into a bitmap of its rendered
/// appearance.
///
/// The bitmap's natural size need not match any requested target size; the
/// render server normalizes it with an explicit scaled draw onto the reserved
/// surface.
pub trait Rasterizer: Send {
    /// Rasterize the injected document.
    fn rasterize(&mut self, doc: &InjectedDocument) -> PlatenResult<RasterBitmap>;
}

/// Available rasterizer kinds.
///
/// - `Svg` interprets the composed document as SVG markup plus a stylesheet.
#[derive(Clone, Copy, Debug)]
pub enum RasterizerKind {
    /// usvg/resvg-backed vector rasterizer.
    Svg,
}

/// Rasterizer-agnostic options.
#[derive(Clone, Debug, Default)]
pub struct RasterizerOpts {
    /// Directory used to resolve external references in the injected
    /// document (images, fonts).
    pub resources_dir: Option<PathBuf>,
    /// Natural viewport assumed when the document does not size itself.
    pub viewport: Option<RasterSize>,
}

/// Create a rasterizer implementation.
pub fn create_rasterizer(
    kind: RasterizerKind,
    opts: &RasterizerOpts,
) -> PlatenResult<Box<dyn Rasterizer>> {
    match kind {
        RasterizerKind::Svg => Ok(Box::new(crate::render::svg::SvgRasterizer::new(
            opts.clone(),
        ))),
    }
}
