//! Splitting a tall canvas into A4 page slices

use image::{imageops, Rgba, RgbaImage};

/// A4 width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// One page worth of canvas.
#[derive(Debug, Clone)]
pub struct PageSlice {
    pub image: RgbaImage,
    /// Slice height relative to a full page; below 1.0 only for the last page
    pub page_fraction: f64,
}

/// Canvas rows that fit on one A4 page at the canvas width.
pub fn slice_height(canvas_width: u32) -> f64 {
    canvas_width as f64 * A4_HEIGHT_MM / A4_WIDTH_MM
}

/// Number of pages needed for a canvas, at least one.
pub fn page_count(canvas_width: u32, canvas_height: u32) -> usize {
    let slice = slice_height(canvas_width);
    if slice <= 0.0 {
        return 1;
    }
    ((canvas_height as f64 / slice).ceil() as usize).max(1)
}

/// Cut `canvas` into top-anchored page slices.
///
/// Every slice spans the full canvas width. The last slice keeps its true
/// height, so nothing is stretched vertically.
pub fn slice_pages(canvas: &RgbaImage) -> Vec<PageSlice> {
    let (width, height) = canvas.dimensions();
    let slice = slice_height(width);

    if width == 0 || height == 0 {
        let blank = RgbaImage::from_pixel(width.max(1), 1, Rgba([255, 255, 255, 255]));
        return vec![PageSlice {
            image: blank,
            page_fraction: 0.0,
        }];
    }

    (0..page_count(width, height))
        .filter_map(|index| {
            let top = (index as f64 * slice).round() as u32;
            if top >= height {
                return None;
            }
            let bottom = (((index + 1) as f64 * slice).round() as u32).min(height);
            let rows = bottom - top;
            Some(PageSlice {
                image: imageops::crop_imm(canvas, 0, top, width, rows).to_image(),
                page_fraction: (rows as f64 / slice).min(1.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn test_slice_height_follows_a4_ratio() {
        assert!((slice_height(210) - 297.0).abs() < 1e-9);
        assert!((slice_height(1588) - 2245.83).abs() < 0.01);
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(page_count(210, 297), 1);
        assert_eq!(page_count(210, 298), 2);
        assert_eq!(page_count(210, 1), 1);
        assert_eq!(page_count(210, 0), 1);
    }

    #[test]
    fn test_slices_cover_canvas_exactly() {
        let slices = slice_pages(&canvas(210, 700));

        assert_eq!(slices.len(), 3);
        let total: u32 = slices.iter().map(|s| s.image.height()).sum();
        assert_eq!(total, 700);
        assert!(slices.iter().all(|s| s.image.width() == 210));
    }

    #[test]
    fn test_last_slice_keeps_true_height() {
        let slices = slice_pages(&canvas(210, 400));

        assert_eq!(slices[0].image.height(), 297);
        assert_eq!(slices[0].page_fraction, 1.0);
        assert_eq!(slices[1].image.height(), 103);
        assert!((slices[1].page_fraction - 103.0 / 297.0).abs() < 1e-9);
    }

    #[test]
    fn test_slices_preserve_content_order() {
        let mut image = canvas(210, 400);
        image.put_pixel(0, 300, Rgba([255, 0, 0, 255]));

        let slices = slice_pages(&image);
        assert_eq!(slices[1].image.get_pixel(0, 3).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_empty_canvas_yields_one_page() {
        assert_eq!(slice_pages(&canvas(0, 0)).len(), 1);
    }
}
