use anyhow::{Result, anyhow};
use image::{RgbImage, RgbaImage};
use tiny_skia::{FilterQuality, IntSize, Paint, Pixmap, PixmapPaint, Rect, Transform};

use tracing::debug;

use crate::style::Rgba;

/// Padding around the text box when a background panel is drawn.
pub(crate) const BACKGROUND_PADDING: f32 = 5.0;

pub(crate) fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Fills the padded panel behind a `width` x `height` text box whose top
/// left corner is `(x, y)`. A negative width (tight letter spacing) spans
/// to the left of `x`.
pub(crate) fn fill_background(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: Rgba,
) {
    let (left, right) = (x.min(x + width), x.max(x + width));
    let (top, bottom) = (y.min(y + height), y.max(y + height));
    let rect = Rect::from_ltrb(
        left - BACKGROUND_PADDING,
        top - BACKGROUND_PADDING,
        right + BACKGROUND_PADDING,
        bottom + BACKGROUND_PADDING,
    );
    match rect {
        Some(rect) => pixmap.fill_rect(rect, &solid_paint(color), Transform::identity(), None),
        None => debug!(x, y, width, height, "background panel has no area"),
    }
}

/// Gaussian blur of a premultiplied layer.
pub(crate) fn blur_layer(layer: &Pixmap, sigma: f32) -> Result<Pixmap> {
    let (width, height) = (layer.width(), layer.height());
    let buffer = RgbaImage::from_raw(width, height, layer.data().to_vec())
        .ok_or_else(|| anyhow!("failed to copy shadow layer"))?;
    let mut data = image::imageops::blur(&buffer, sigma).into_raw();
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3];
        for channel in &mut px[..3] {
            *channel = (*channel).min(alpha);
        }
    }
    let size = IntSize::from_wh(width, height).ok_or_else(|| anyhow!("empty shadow layer"))?;
    Pixmap::from_vec(data, size).ok_or_else(|| anyhow!("failed to rebuild shadow layer"))
}

pub(crate) fn draw_layer(target: &mut Pixmap, layer: &Pixmap) {
    target.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

/// Rotates `layer` counter-clockwise by `degrees` around `(cx, cy)`.
pub(crate) fn rotate_layer(layer: &Pixmap, degrees: f32, cx: f32, cy: f32) -> Result<Pixmap> {
    let mut rotated = Pixmap::new(layer.width(), layer.height())
        .ok_or_else(|| anyhow!("empty overlay"))?;
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    rotated.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &paint,
        Transform::from_rotate_at(-degrees, cx, cy),
        None,
    );
    Ok(rotated)
}

/// Composites the premultiplied `overlay` over `base` and drops alpha.
/// Pixels the overlay leaves fully transparent keep the base color exactly.
pub(crate) fn flatten(base: &RgbaImage, overlay: &Pixmap) -> Result<RgbImage> {
    if base.width() != overlay.width() || base.height() != overlay.height() {
        return Err(anyhow!(
            "overlay is {}x{} but image is {}x{}",
            overlay.width(),
            overlay.height(),
            base.width(),
            base.height()
        ));
    }
    let mut out = RgbImage::new(base.width(), base.height());
    for ((dst, src), top) in out
        .pixels_mut()
        .zip(base.pixels())
        .zip(overlay.data().chunks_exact(4))
    {
        let inverse = 255 - top[3] as u32;
        for channel in 0..3 {
            let under = (src[channel] as u32 * inverse + 127) / 255;
            dst[channel] = (top[channel] as u32 + under).min(255) as u8;
        }
    }
    Ok(out)
}
