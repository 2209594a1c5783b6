use crate::foundation::core::RasterSize;
use crate::foundation::error::{PlatenError, PlatenResult};
use crate::render::backend::RasterBitmap;
use crate::render::data_uri;
use resvg::tiny_skia;

/// The server's reserved offscreen raster surface.
///
/// Provisioned once at server start and hot-reused: it is resized to each
/// request's exact target dimensions (reallocating only when they change) and
/// repainted wholesale, so no partial state survives between requests.
pub(crate) struct RasterSurface {
    pixmap: tiny_skia::Pixmap,
    size: RasterSize,
}

impl RasterSurface {
    pub(crate) fn new(size: RasterSize) -> PlatenResult<Self> {
        Ok(Self {
            pixmap: alloc_pixmap(size.width, size.height)?,
            size,
        })
    }

    /// Size the surface to exactly `size`, clearing any previous contents.
    pub(crate) fn resize(&mut self, size: RasterSize) -> PlatenResult<()> {
        if size == self.size {
            self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
            return Ok(());
        }
        self.pixmap = alloc_pixmap(size.width, size.height)?;
        self.size = size;
        Ok(())
    }

    /// Draw a rasterizer bitmap onto the surface, scaled to the surface's
    /// exact dimensions.
    ///
    /// This normalization step exists because a rasterizer's natural output
    /// size may not equal the requested target size.
    pub(crate) fn draw_scaled(&mut self, bitmap: &RasterBitmap) -> PlatenResult<()> {
        let expected = (bitmap.width as usize)
            .saturating_mul(bitmap.height as usize)
            .saturating_mul(4);
        if bitmap.data.len() != expected {
            return Err(PlatenError::raster(format!(
                "rasterizer bitmap has {} bytes, expected {expected} for {}x{}",
                bitmap.data.len(),
                bitmap.width,
                bitmap.height
            )));
        }

        let mut src = alloc_pixmap(bitmap.width, bitmap.height)?;
        if bitmap.premultiplied {
            src.data_mut().copy_from_slice(&bitmap.data);
        } else {
            for (dst, px) in src
                .data_mut()
                .chunks_exact_mut(4)
                .zip(bitmap.data.chunks_exact(4))
            {
                let a = px[3];
                dst[0] = premul(px[0], a);
                dst[1] = premul(px[1], a);
                dst[2] = premul(px[2], a);
                dst[3] = a;
            }
        }

        let sx = self.size.width as f32 / bitmap.width as f32;
        let sy = self.size.height as f32 / bitmap.height as f32;
        let paint = tiny_skia::PixmapPaint {
            quality: tiny_skia::FilterQuality::Bilinear,
            ..tiny_skia::PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            src.as_ref(),
            &paint,
            tiny_skia::Transform::from_scale(sx, sy),
            None,
        );
        Ok(())
    }

    /// Extract the surface contents as a PNG data URI.
    pub(crate) fn to_png_data_uri(&self) -> PlatenResult<String> {
        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        data_uri::encode_png(self.size.width, self.size.height, &rgba)
    }
}

/// Obtain a drawing surface of the given dimensions.
///
/// Allocation failure here is the fatal "no drawing context" condition: the
/// server has no fallback rasterization path.
fn alloc_pixmap(width: u32, height: u32) -> PlatenResult<tiny_skia::Pixmap> {
    tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        PlatenError::raster(format!("failed to obtain a {width}x{height} drawing surface"))
    })
}

fn premul(c: u8, a: u8) -> u8 {
    let c = u16::from(c);
    let a = u16::from(a);
    (((c * a) + 127) / 255) as u8
}
