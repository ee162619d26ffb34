use crate::grid::BlockRect;
use crate::{ImgprocError, Result};
use image::RgbImage;

pub const HISTOGRAM_BINS: usize = 256;

pub type Histogram = [u32; HISTOGRAM_BINS];

/// Counts the values of one channel of a three-channel buffer inside `region`.
///
/// The region is clipped to the image, so an out-of-range or empty region
/// yields an all-zero histogram.
pub fn compute_channel_histogram(
    image: &RgbImage,
    channel: usize,
    region: BlockRect,
) -> Result<Histogram> {
    if channel >= 3 {
        return Err(ImgprocError::InvalidChannel {
            channel,
            channels: 3,
        });
    }

    let mut hist = [0u32; HISTOGRAM_BINS];
    let x_end = region.x.saturating_add(region.width).min(image.width());
    let y_end = region.y.saturating_add(region.height).min(image.height());
    if region.x >= x_end || region.y >= y_end {
        return Ok(hist);
    }

    let stride = image.width() as usize * 3;
    let raw = image.as_raw();
    for y in region.y..y_end {
        let row = &raw[y as usize * stride..(y as usize + 1) * stride];
        for px in row[region.x as usize * 3..x_end as usize * 3].chunks_exact(3) {
            hist[px[channel] as usize] += 1;
        }
    }

    Ok(hist)
}

/// Pearson correlation of two histograms over their paired bins.
///
/// Ranges over `[-1, 1]`, 1 meaning identical shape. When either histogram is
/// constant the coefficient is undefined and 1.0 is returned.
pub fn compare_hist_correlation(a: &[u32], b: &[u32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 1.0;
    }
    let scale = 1.0 / n as f64;

    let (mut s1, mut s2, mut s11, mut s22, mut s12) = (0.0f64, 0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        s1 += x;
        s2 += y;
        s11 += x * x;
        s22 += y * y;
        s12 += x * y;
    }

    let num = s12 - s1 * s2 * scale;
    let denom = (s11 - s1 * s1 * scale) * (s22 - s2 * s2 * scale);
    if denom.abs() > f64::EPSILON {
        num / denom.sqrt()
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn full(img: &RgbImage) -> BlockRect {
        BlockRect {
            x: 0,
            y: 0,
            width: img.width(),
            height: img.height(),
        }
    }

    #[test]
    fn counts_selected_channel() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        img.put_pixel(3, 3, Rgb([10, 99, 30]));

        let h = compute_channel_histogram(&img, 1, full(&img)).unwrap();
        assert_eq!(h[20], 15);
        assert_eq!(h[99], 1);
        assert_eq!(h.iter().sum::<u32>(), 16);
    }

    #[test]
    fn region_is_clipped() {
        let img = RgbImage::from_pixel(4, 4, Rgb([5, 5, 5]));
        let region = BlockRect {
            x: 2,
            y: 2,
            width: 10,
            height: 10,
        };
        let h = compute_channel_histogram(&img, 0, region).unwrap();
        assert_eq!(h[5], 4);

        let empty = BlockRect {
            x: 1,
            y: 1,
            width: 0,
            height: 3,
        };
        let h = compute_channel_histogram(&img, 0, empty).unwrap();
        assert!(h.iter().all(|&c| c == 0));
    }

    #[test]
    fn invalid_channel_is_rejected() {
        let img = RgbImage::new(2, 2);
        assert!(compute_channel_histogram(&img, 3, full(&img)).is_err());
    }

    #[test]
    fn correlation_of_identical_histograms_is_one() {
        let mut h = [0u32; HISTOGRAM_BINS];
        h[3] = 10;
        h[200] = 4;
        assert!((compare_hist_correlation(&h, &h) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_disjoint_spikes_is_slightly_negative() {
        let mut a = [0u32; HISTOGRAM_BINS];
        let mut b = [0u32; HISTOGRAM_BINS];
        a[10] = 100;
        b[20] = 100;
        let c = compare_hist_correlation(&a, &b);
        assert!((c + 1.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_of_constant_histogram_is_one() {
        let zeros = [0u32; HISTOGRAM_BINS];
        let mut spike = [0u32; HISTOGRAM_BINS];
        spike[0] = 1;
        assert_eq!(compare_hist_correlation(&zeros, &zeros), 1.0);
        assert_eq!(compare_hist_correlation(&zeros, &spike), 1.0);
    }
}
