//! 8-bit colour space conversions.
//!
//! Converted images reuse [`RgbImage`] as a plain three-channel byte buffer:
//! HSV is stored as `[H, S, V]` with hue halved into `0..180`, YCbCr (BT.601,
//! full range) as `[Y, Cb, Cr]`.

use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use rayon::ThreadPool;

pub fn convert_rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    convert_rgb_to_gray_in_pool(rgb, None)
}

pub fn convert_rgb_to_gray_in_pool(rgb: &RgbImage, pool: Option<&ThreadPool>) -> GrayImage {
    let run = || {
        let (w, h) = rgb.dimensions();
        let mut gray_data = vec![0u8; (w as usize) * (h as usize)];

        gray_data
            .par_iter_mut()
            .zip(rgb.as_raw().par_chunks_exact(3))
            .for_each(|(g, px)| {
                let luma = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
                *g = ((luma + 500) / 1000) as u8;
            });

        GrayImage::from_raw(w, h, gray_data).unwrap_or_else(|| GrayImage::new(w, h))
    };

    if let Some(p) = pool {
        p.install(run)
    } else {
        run()
    }
}

pub fn convert_rgb_to_hsv(rgb: &RgbImage) -> RgbImage {
    convert_rgb_to_hsv_in_pool(rgb, None)
}

pub fn convert_rgb_to_hsv_in_pool(rgb: &RgbImage, pool: Option<&ThreadPool>) -> RgbImage {
    map_pixels_in_pool(rgb, pool, rgb_to_hsv)
}

pub fn convert_rgb_to_ycbcr(rgb: &RgbImage) -> RgbImage {
    convert_rgb_to_ycbcr_in_pool(rgb, None)
}

pub fn convert_rgb_to_ycbcr_in_pool(rgb: &RgbImage, pool: Option<&ThreadPool>) -> RgbImage {
    map_pixels_in_pool(rgb, pool, rgb_to_ycbcr)
}

/// Converts one pixel to `[H, S, V]` with `H` in `0..180`.
pub fn rgb_to_hsv(px: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = px.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };

    let mut h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = (h / 2.0).round() as u32 % 180;
    [h as u8, to_u8(s), to_u8(v)]
}

/// Converts one pixel to `[Y, Cb, Cr]`.
pub fn rgb_to_ycbcr(px: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = px.map(f32::from);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 + 0.564 * (b - y);
    let cr = 128.0 + 0.713 * (r - y);
    [to_u8(y), to_u8(cb), to_u8(cr)]
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn map_pixels_in_pool<F>(rgb: &RgbImage, pool: Option<&ThreadPool>, f: F) -> RgbImage
where
    F: Fn([u8; 3]) -> [u8; 3] + Sync,
{
    let run = || {
        let (w, h) = rgb.dimensions();
        let mut out = rgb.as_raw().clone();

        out.par_chunks_exact_mut(3).for_each(|px| {
            let mapped = f([px[0], px[1], px[2]]);
            px.copy_from_slice(&mapped);
        });

        RgbImage::from_raw(w, h, out).unwrap_or_else(|| RgbImage::new(w, h))
    };

    if let Some(p) = pool {
        p.install(run)
    } else {
        run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn ycbcr_primaries() {
        assert_eq!(rgb_to_ycbcr([255, 0, 0]), [76, 85, 255]);
        assert_eq!(rgb_to_ycbcr([0, 255, 0]), [150, 44, 21]);
        assert_eq!(rgb_to_ycbcr([0, 0, 255]), [29, 255, 107]);
    }

    #[test]
    fn ycbcr_gray_has_neutral_chroma() {
        for v in [0u8, 1, 64, 100, 128, 200, 255] {
            let [y, cb, cr] = rgb_to_ycbcr([v, v, v]);
            assert_eq!(y, v);
            assert_eq!((cb, cr), (128, 128));
        }
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([90, 90, 90]), [0, 0, 90]);
    }

    #[test]
    fn converted_image_keeps_dimensions() {
        let img = RgbImage::from_pixel(7, 5, Rgb([10, 200, 30]));
        let ycc = convert_rgb_to_ycbcr(&img);
        assert_eq!(ycc.dimensions(), (7, 5));
        assert_eq!(ycc.get_pixel(6, 4).0, rgb_to_ycbcr([10, 200, 30]));

        let gray = convert_rgb_to_gray(&img);
        assert_eq!(gray.dimensions(), (7, 5));
    }
}
