use cv_core::{KeyPoint, KeyPoints};
use image::GrayImage;

/// Bresenham circle of radius 3 around the candidate pixel.
const CIRCLE_OFFSETS: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Minimum contiguous arc of brighter or darker circle pixels.
const ARC_LENGTH: usize = 9;

/// FAST-9 corner detector with 3×3 non-maximum suppression.
///
/// Keypoints carry their corner score as `response` and are returned
/// strongest first; equal scores keep raster order.
pub fn fast_detect(image: &GrayImage, threshold: u8, max_keypoints: usize) -> KeyPoints {
    let width = image.width() as i32;
    let height = image.height() as i32;
    if width < 7 || height < 7 {
        return KeyPoints::new();
    }

    let mut scores = vec![0u32; (width * height) as usize];
    for y in 3..height - 3 {
        for x in 3..width - 3 {
            scores[(y * width + x) as usize] = fast_score(image, x, y, threshold);
        }
    }

    let mut keypoints = Vec::new();
    for y in 3..height - 3 {
        for x in 3..width - 3 {
            let idx = (y * width + x) as usize;
            let score = scores[idx];
            if score > 0 && is_local_maximum(&scores, width, x, y) {
                keypoints.push(KeyPoint::new(x as f64, y as f64).with_response(score as f64));
            }
        }
    }

    keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
    keypoints.truncate(max_keypoints);

    KeyPoints { keypoints }
}

/// Corner score at `(x, y)`, 0 when the segment test fails.
///
/// The score is the summed absolute contrast beyond `threshold` of the
/// brighter or darker circle pixels, whichever side forms the arc.
pub fn fast_score(image: &GrayImage, x: i32, y: i32, threshold: u8) -> u32 {
    let width = image.width() as i32;
    let height = image.height() as i32;
    if x < 3 || y < 3 || x >= width - 3 || y >= height - 3 {
        return 0;
    }

    let p = image.get_pixel(x as u32, y as u32)[0] as i32;
    let t = threshold as i32;

    let mut states = [0i8; 16];
    let mut bright_sum = 0u32;
    let mut dark_sum = 0u32;
    for (i, &(dx, dy)) in CIRCLE_OFFSETS.iter().enumerate() {
        let val = image.get_pixel((x + dx) as u32, (y + dy) as u32)[0] as i32;
        if val > p + t {
            states[i] = 1;
            bright_sum += (val - p - t) as u32;
        } else if val < p - t {
            states[i] = -1;
            dark_sum += (p - val - t) as u32;
        }
    }

    let bright = has_arc(&states, 1);
    let dark = has_arc(&states, -1);
    match (bright, dark) {
        (true, true) => bright_sum.max(dark_sum),
        (true, false) => bright_sum.max(1),
        (false, true) => dark_sum.max(1),
        (false, false) => 0,
    }
}

fn has_arc(states: &[i8; 16], want: i8) -> bool {
    let mut run = 0;
    for i in 0..16 + ARC_LENGTH {
        if states[i % 16] == want {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Strict maximum over the 3×3 neighbourhood; on a plateau the first pixel in
/// raster order wins.
fn is_local_maximum(scores: &[u32], width: i32, x: i32, y: i32) -> bool {
    let idx = (y * width + x) as usize;
    let score = scores[idx];
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let n_idx = ((y + dy) * width + (x + dx)) as usize;
            let other = scores[n_idx];
            if other > score || (other == score && n_idx < idx) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn uniform_image_has_no_corners() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        assert!(fast_detect(&img, 20, 100).is_empty());
    }

    #[test]
    fn isolated_bright_dot_is_a_corner() {
        let mut img = GrayImage::from_pixel(21, 21, Luma([0]));
        img.put_pixel(10, 10, Luma([255]));

        assert!(fast_score(&img, 10, 10, 20) > 0);
        let kps = fast_detect(&img, 20, 10);
        assert_eq!(kps.len(), 1);
        assert_eq!((kps.keypoints[0].x, kps.keypoints[0].y), (10.0, 10.0));
    }

    #[test]
    fn square_corners_are_detected() {
        let mut img = GrayImage::from_pixel(50, 50, Luma([0]));
        for y in 15..35 {
            for x in 15..35 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        let kps = fast_detect(&img, 20, 100);
        assert!(!kps.is_empty());
        let near_top_left = kps
            .iter()
            .any(|kp| (kp.x - 15.0).abs() <= 2.0 && (kp.y - 15.0).abs() <= 2.0);
        assert!(near_top_left);
        assert!(kps
            .keypoints
            .windows(2)
            .all(|w| w[0].response >= w[1].response));
    }

    #[test]
    fn max_keypoints_caps_output() {
        let mut img = GrayImage::from_pixel(64, 64, Luma([0]));
        for y in (8..56).step_by(8) {
            for x in (8..56).step_by(8) {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        assert_eq!(fast_detect(&img, 20, 5).len(), 5);
    }
}
