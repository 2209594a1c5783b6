use crate::foundation::error::{PlatenError, PlatenResult};
use crate::render::backend::{InjectedDocument, RasterBitmap, Rasterizer, RasterizerOpts};
use std::sync::Arc;

const MAX_DIM: u32 = 16_384;

/// Rasterizes an injected document by interpreting its markup as SVG content
/// and its stylesheet as the document's CSS.
///
/// The document is wrapped in an `<svg>` envelope holding one `<style>`
/// element followed by the root content, then parsed with `usvg` and rendered
/// with `resvg` at the tree's natural size. When the envelope carries no
/// intrinsic size, the configured viewport (or usvg's default) applies.
pub struct SvgRasterizer {
    opts: RasterizerOpts,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRasterizer {
    /// Create a rasterizer with system fonts loaded once up front.
    pub fn new(opts: RasterizerOpts) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            opts,
            fontdb: Arc::new(db),
        }
    }
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("opts", &self.opts)
            .finish()
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&mut self, doc: &InjectedDocument) -> PlatenResult<RasterBitmap> {
        let markup = envelope(doc);

        let mut usvg_opts = usvg::Options {
            resources_dir: self.opts.resources_dir.clone(),
            fontdb: self.fontdb.clone(),
            ..usvg::Options::default()
        };
        if let Some(vp) = self.opts.viewport
            && let Some(size) = usvg::Size::from_wh(vp.width as f32, vp.height as f32)
        {
            usvg_opts.default_size = size;
        }

        let tree = usvg::Tree::from_data(markup.as_bytes(), &usvg_opts)
            .map_err(|e| PlatenError::raster(format!("parse injected document as svg: {e}")))?;

        fn to_px(v: f32) -> PlatenResult<u32> {
            if !v.is_finite() || v <= 0.0 {
                return Err(PlatenError::raster("injected document has invalid size"));
            }
            Ok((v.ceil() as u32).max(1))
        }

        let size = tree.size();
        let w = to_px(size.width())?;
        let h = to_px(size.height())?;
        if w > MAX_DIM || h > MAX_DIM {
            return Err(PlatenError::raster(format!(
                "rasterized document too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
            )));
        }

        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| PlatenError::raster("failed to allocate rasterizer pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        Ok(RasterBitmap {
            width: w,
            height: h,
            data: pixmap.data().to_vec(),
            premultiplied: true,
        })
    }
}

/// Wrap the injected slots into one parseable SVG document: the reserved
/// style element first, the root content after it.
fn envelope(doc: &InjectedDocument) -> String {
    let mut s = String::with_capacity(doc.css.len() + doc.html.len() + 96);
    s.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\">");
    if !doc.css.is_empty() {
        s.push_str("<style><![CDATA[");
        s.push_str(&doc.css);
        s.push_str("]]></style>");
    }
    s.push_str(&doc.html);
    s.push_str("</svg>");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::RasterSize;

    fn doc(css: &str, html: &str) -> InjectedDocument {
        InjectedDocument {
            css: css.to_owned(),
            html: html.to_owned(),
        }
    }

    #[test]
    fn rasterizes_at_configured_viewport_size() {
        let mut r = SvgRasterizer::new(RasterizerOpts {
            resources_dir: None,
            viewport: Some(RasterSize {
                width: 20,
                height: 10,
            }),
        });
        let bmp = r
            .rasterize(&doc("", "<rect width=\"20\" height=\"10\" fill=\"#ff0000\"/>"))
            .unwrap();
        assert_eq!((bmp.width, bmp.height), (20, 10));
        assert!(bmp.premultiplied);
        assert_eq!(bmp.data.len(), 20 * 10 * 4);
        // Solid red fill: the first pixel must be opaque and red-dominant.
        assert_eq!(bmp.data[3], 255);
        assert!(bmp.data[0] > 200);
    }

    #[test]
    fn stylesheet_slot_is_injected_into_the_envelope() {
        let mut r = SvgRasterizer::new(RasterizerOpts {
            resources_dir: None,
            viewport: Some(RasterSize {
                width: 8,
                height: 8,
            }),
        });
        let bmp = r
            .rasterize(&doc(
                "rect { fill: #00ff00; }",
                "<rect width=\"8\" height=\"8\"/>",
            ))
            .unwrap();
        assert_eq!((bmp.width, bmp.height), (8, 8));
    }

    #[test]
    fn malformed_markup_is_a_raster_error() {
        let mut r = SvgRasterizer::new(RasterizerOpts::default());
        let err = r.rasterize(&doc("", "<rect")).unwrap_err();
        assert!(matches!(err, PlatenError::Raster(_)));
    }
}
