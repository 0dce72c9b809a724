//! Rasterising the composite for the text-recognition collaborator.
//!
//! The composite is rebuilt from the original pixels: each group's mapped
//! rectangle is cropped out of the source, turned by the display rotation,
//! and the crops are stacked top to bottom with a visible separator band
//! between consecutive groups.

use crate::error::{Result, StitchError};
use crate::mapper::PixelRect;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::io::Cursor;
use std::ops::Range;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SEPARATOR_COLOR: Rgba<u8> = Rgba([32, 32, 32, 255]);

/// Largest canvas, in pixels, a snapshot may allocate.
const MAX_SNAPSHOT_PIXELS: u64 = 1 << 28;

/// Rotations smaller than this are treated as none.
const ANGLE_EPSILON: f64 = 1e-6;

/// A rendered composite and where its separator bands sit.
#[derive(Debug)]
pub struct RenderedComposite {
    pub image: DynamicImage,
    /// Pixel rows covered by each separator band, top to bottom.
    pub separator_rows: Vec<Range<u32>>,
}

/// An encoded image ready to hand to a recognizer.
#[derive(Clone, Debug)]
pub struct EncodedSnapshot {
    pub mime_type: &'static str,
    pub data: String,
}

pub struct ImageProcessor;

impl ImageProcessor {
    /// Crops `rects` out of `original` and stacks them into one image.
    ///
    /// `angle` is the display rotation in radians (counter-clockwise).
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::EmptySelection`] if any rectangle clamps to
    /// zero area, and [`StitchError::ImageProcessing`] if `rects` is empty
    /// or the stacked canvas would be too large.
    pub fn render_composite(
        original: &DynamicImage,
        rects: &[PixelRect],
        separator_px: u32,
        angle: f64,
    ) -> Result<RenderedComposite> {
        if rects.is_empty() {
            return Err(StitchError::image("nothing to render"));
        }

        let crops = rects
            .iter()
            .map(|rect| {
                let crop = Self::crop_rect(original, rect)?;
                Ok(Self::rotate(crop, angle))
            })
            .collect::<Result<Vec<_>>>()?;

        let width = crops.iter().map(RgbaImage::width).max().unwrap_or(0);
        let gaps = u32::try_from(crops.len() - 1).unwrap_or(u32::MAX);
        let height = crops
            .iter()
            .try_fold(0u32, |acc, crop| acc.checked_add(crop.height()))
            .and_then(|h| h.checked_add(gaps.checked_mul(separator_px)?))
            .filter(|&h| u64::from(width) * u64::from(h) <= MAX_SNAPSHOT_PIXELS)
            .ok_or_else(|| {
                StitchError::image(format!(
                    "composite of {} regions with {separator_px}px separators is too large",
                    crops.len()
                ))
            })?;

        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
        let mut separator_rows = Vec::with_capacity(crops.len() - 1);
        let mut y = 0u32;
        for (i, crop) in crops.iter().enumerate() {
            if i > 0 {
                for row in y..y + separator_px {
                    for x in 0..width {
                        canvas.put_pixel(x, row, SEPARATOR_COLOR);
                    }
                }
                separator_rows.push(y..y + separator_px);
                y += separator_px;
            }
            imageops::overlay(&mut canvas, crop, 0, i64::from(y));
            y += crop.height();
        }

        log::debug!(
            "rendered composite {}x{} from {} regions",
            width,
            height,
            crops.len()
        );
        Ok(RenderedComposite {
            image: DynamicImage::ImageRgba8(canvas),
            separator_rows,
        })
    }

    /// Cuts a pixel rectangle out of `original`, clamped to its bounds.
    fn crop_rect(original: &DynamicImage, rect: &PixelRect) -> Result<RgbaImage> {
        let x = rect.min_x.floor().max(0.0) as u32;
        let y = rect.min_y.floor().max(0.0) as u32;
        let right = (rect.max_x.ceil().max(0.0) as u32).min(original.width());
        let bottom = (rect.max_y.ceil().max(0.0) as u32).min(original.height());

        let width = right.saturating_sub(x);
        let height = bottom.saturating_sub(y);
        if width == 0 || height == 0 {
            return Err(StitchError::EmptySelection);
        }

        Ok(original.crop_imm(x, y, width, height).to_rgba8())
    }

    /// Turns a crop by `angle` without clipping its corners.
    fn rotate(crop: RgbaImage, angle: f64) -> RgbaImage {
        if angle.abs() < ANGLE_EPSILON {
            return crop;
        }

        let (w, h) = (f64::from(crop.width()), f64::from(crop.height()));
        let (sin, cos) = angle.sin_cos();
        let rotated_w = span(w * cos.abs() + h * sin.abs());
        let rotated_h = span(w * sin.abs() + h * cos.abs());
        let side_w = rotated_w.max(crop.width());
        let side_h = rotated_h.max(crop.height());

        let mut padded = RgbaImage::from_pixel(side_w, side_h, BACKGROUND);
        imageops::overlay(
            &mut padded,
            &crop,
            i64::from((side_w - crop.width()) / 2),
            i64::from((side_h - crop.height()) / 2),
        );

        // Pixel rows run down, so a counter-clockwise turn is a negative angle here.
        let turned =
            rotate_about_center(&padded, -angle as f32, Interpolation::Bilinear, BACKGROUND);
        imageops::crop_imm(
            &turned,
            (side_w - rotated_w) / 2,
            (side_h - rotated_h) / 2,
            rotated_w,
            rotated_h,
        )
        .to_image()
    }

    /// Encodes an image as base64 PNG.
    pub fn encode_png(image: &DynamicImage) -> Result<EncodedSnapshot> {
        let bytes = Self::encode(image, ImageFormat::Png)?;
        Ok(EncodedSnapshot {
            mime_type: "image/png",
            data: BASE64.encode(bytes),
        })
    }

    /// Encodes an image as base64 JPEG.
    pub fn encode_jpeg(image: &DynamicImage) -> Result<EncodedSnapshot> {
        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let bytes = Self::encode(&rgb, ImageFormat::Jpeg)?;
        Ok(EncodedSnapshot {
            mime_type: "image/jpeg",
            data: BASE64.encode(bytes),
        })
    }

    fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        image
            .write_to(&mut cursor, format)
            .map_err(|e| StitchError::image(format!("Failed to encode image: {}", e)))?;

        Ok(buffer)
    }
}

/// Whole pixels needed to cover `length`, forgiving trig round-off.
fn span(length: f64) -> u32 {
    (length - ANGLE_EPSILON).ceil().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        }))
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> PixelRect {
        PixelRect { min_x: x0, min_y: y0, max_x: x1, max_y: y1 }
    }

    #[test]
    fn crops_are_stacked_with_separator_band() {
        let source = gradient(200, 100);
        let rendered = ImageProcessor::render_composite(
            &source,
            &[rect(10.0, 10.0, 60.0, 30.0), rect(100.0, 50.0, 130.0, 90.0)],
            4,
            0.0,
        )
        .unwrap();

        let image = rendered.image.to_rgba8();
        assert_eq!(image.width(), 50);
        assert_eq!(image.height(), 20 + 4 + 40);
        assert_eq!(rendered.separator_rows, vec![20..24]);
        assert_eq!(*image.get_pixel(0, 0), Rgba([10, 10, 0, 255]));
        assert_eq!(*image.get_pixel(0, 21), SEPARATOR_COLOR);
        assert_eq!(*image.get_pixel(0, 24), Rgba([100, 50, 0, 255]));
        // Narrower crops leave background to their right.
        assert_eq!(*image.get_pixel(45, 30), BACKGROUND);
    }

    #[test]
    fn out_of_bounds_rect_is_empty_selection() {
        let source = gradient(50, 50);
        let err = ImageProcessor::render_composite(&source, &[rect(60.0, 60.0, 80.0, 80.0)], 0, 0.0)
            .err()
            .unwrap();
        assert!(matches!(err, StitchError::EmptySelection));
    }

    #[test]
    fn oversized_separators_are_refused() {
        let source = gradient(50, 50);
        let rects = [rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 20.0, 30.0, 30.0)];
        for separator_px in [u32::MAX, u32::MAX / 2, 1 << 26] {
            let err = ImageProcessor::render_composite(&source, &rects, separator_px, 0.0)
                .err()
                .unwrap();
            assert!(matches!(err, StitchError::ImageProcessing(_)));
        }
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let source = gradient(100, 100);
        let rendered = ImageProcessor::render_composite(
            &source,
            &[rect(0.0, 0.0, 40.0, 20.0)],
            0,
            std::f64::consts::FRAC_PI_2,
        )
        .unwrap();
        assert_eq!(rendered.image.width(), 20);
        assert_eq!(rendered.image.height(), 40);
        assert!(rendered.separator_rows.is_empty());
    }

    #[test]
    fn encodings_produce_base64() {
        let source = gradient(8, 8);
        let png = ImageProcessor::encode_png(&source).unwrap();
        assert_eq!(png.mime_type, "image/png");
        let bytes = BASE64.decode(png.data).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(ImageProcessor::encode_jpeg(&source).unwrap().mime_type, "image/jpeg");
    }
}
