use cv_features::*;
use image::{GrayImage, Luma, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn blocky_texture(size: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cells = size / 8;
    let shades: Vec<u8> = (0..cells * cells).map(|_| rng.gen()).collect();
    GrayImage::from_fn(size, size, |x, y| Luma([shades[((y / 8) * cells + x / 8) as usize]]))
}

fn crop(img: &GrayImage, x: u32, y: u32, size: u32) -> GrayImage {
    image::imageops::crop_imm(img, x, y, size, size).to_image()
}

#[test]
fn test_translated_views_verify_geometrically() {
    let scene = blocky_texture(320, 11);
    let a = crop(&scene, 0, 0, 256);
    let b = crop(&scene, 13, 6, 256);

    let orb = Orb::new();
    let (kps_a, desc_a) = orb.detect_and_compute(&a);
    let (kps_b, desc_b) = orb.detect_and_compute(&b);
    assert!(kps_a.len() > 20);
    assert!(kps_b.len() > 20);

    let matches = Matcher::new().with_ratio_test(0.9).match_descriptors(&desc_a, &desc_b);
    assert!(matches.len() > 6);

    let src: Vec<(f64, f64)> = kps_a.iter().map(|k| (k.x, k.y)).collect();
    let dst: Vec<(f64, f64)> = kps_b.iter().map(|k| (k.x, k.y)).collect();
    let config = RansacConfig {
        threshold: 5.0,
        ..RansacConfig::default()
    };
    let result = estimate_homography(&matches, &src, &dst, &config).unwrap();

    assert!(result.num_inliers > 10, "only {} inliers", result.num_inliers);
    let h = result.model.unwrap();
    // Content of `b` sits 13 px left and 6 px up of the same content in `a`
    let centre = h * nalgebra::Vector3::new(128.0, 128.0, 1.0);
    assert!((centre[0] / centre[2] - 115.0).abs() < 3.0);
    assert!((centre[1] / centre[2] - 122.0).abs() < 3.0);
}

#[test]
fn test_unrelated_textures_match_poorly() {
    let orb = Orb::new();
    let (_, desc_a) = orb.detect_and_compute(&blocky_texture(256, 1));
    let (_, desc_b) = orb.detect_and_compute(&blocky_texture(256, 2));
    let (_, desc_a2) = orb.detect_and_compute(&blocky_texture(256, 1));

    let matcher = Matcher::new();
    let unrelated = matcher.match_descriptors(&desc_a, &desc_b).len();
    let identical = matcher.match_descriptors(&desc_a, &desc_a2).len();
    assert!(identical > unrelated);
}

#[test]
fn test_orb_on_converted_colour_image() {
    let mut rgb = RgbImage::new(128, 128);
    for (x, y, p) in rgb.enumerate_pixels_mut() {
        let on = ((x / 16) + (y / 16)) % 2 == 0;
        *p = if on { Rgb([230, 40, 40]) } else { Rgb([20, 20, 160]) };
    }
    let gray = cv_imgproc::convert_rgb_to_gray(&rgb);

    let (kps, descs) = orb_detect_and_compute(&gray, 100);
    assert_eq!(kps.len(), descs.len());
    assert!(kps.len() <= 100);
}
