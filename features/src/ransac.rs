//! RANSAC homography estimation for geometric verification of matches.

use crate::{FeatureError, Result};
use cv_core::{Matches, Ransac, RobustConfig, RobustModel, RobustResult};
use nalgebra::{DMatrix, Matrix3, Vector3};

pub type RansacConfig = RobustConfig;
pub type RansacResult<M> = RobustResult<M>;

#[derive(Clone, Debug)]
pub struct MatchPair {
    pub src: (f64, f64),
    pub dst: (f64, f64),
}

/// Planar homography via normalized DLT; error is the forward reprojection
/// distance in pixels.
pub struct HomographyEstimator;

impl RobustModel<MatchPair> for HomographyEstimator {
    type Model = Matrix3<f64>;

    fn min_sample_size(&self) -> usize {
        4
    }

    fn estimate(&self, data: &[&MatchPair]) -> Option<Self::Model> {
        if data.len() < 4 {
            return None;
        }

        let src: Vec<(f64, f64)> = data.iter().map(|m| m.src).collect();
        let dst: Vec<(f64, f64)> = data.iter().map(|m| m.dst).collect();
        let t_src = normalizing_transform(&src)?;
        let t_dst = normalizing_transform(&dst)?;

        let n_rows = (data.len() * 2).max(9);
        let mut a = DMatrix::<f64>::zeros(n_rows, 9);
        for (i, (s, d)) in src.iter().zip(&dst).enumerate() {
            let p1 = t_src * Vector3::new(s.0, s.1, 1.0);
            let p2 = t_dst * Vector3::new(d.0, d.1, 1.0);
            let (x1, y1, x2, y2) = (p1[0], p1[1], p2[0], p2[1]);

            let r1 = i * 2;
            let r2 = r1 + 1;
            a[(r1, 0)] = -x1;
            a[(r1, 1)] = -y1;
            a[(r1, 2)] = -1.0;
            a[(r1, 6)] = x2 * x1;
            a[(r1, 7)] = x2 * y1;
            a[(r1, 8)] = x2;
            a[(r2, 3)] = -x1;
            a[(r2, 4)] = -y1;
            a[(r2, 5)] = -1.0;
            a[(r2, 6)] = y2 * x1;
            a[(r2, 7)] = y2 * y1;
            a[(r2, 8)] = y2;
        }

        let h_norm = solve_dlt_homography(a)?;
        if h_norm.determinant().abs() < 1e-12 {
            return None;
        }

        let t_dst_inv = t_dst.try_inverse()?;
        let h = t_dst_inv * h_norm * t_src;
        let scale = h[(2, 2)];
        if scale.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(h / scale)
    }

    fn compute_error(&self, model: &Self::Model, data: &MatchPair) -> f64 {
        let p2_pred = model * Vector3::new(data.src.0, data.src.1, 1.0);
        if p2_pred[2].abs() > 1e-10 {
            let x2_pred = p2_pred[0] / p2_pred[2];
            let y2_pred = p2_pred[1] / p2_pred[2];
            ((x2_pred - data.dst.0).powi(2) + (y2_pred - data.dst.1).powi(2)).sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// A minimal sample with three collinear (or coincident) points on either
    /// side does not fix a homography.
    fn is_degenerate(&self, sample: &[&MatchPair]) -> bool {
        let src: Vec<(f64, f64)> = sample.iter().map(|m| m.src).collect();
        let dst: Vec<(f64, f64)> = sample.iter().map(|m| m.dst).collect();
        has_collinear_triple(&src) || has_collinear_triple(&dst)
    }
}

fn has_collinear_triple(points: &[(f64, f64)]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let (a, b, c) = (points[i], points[j], points[k]);
                let (abx, aby) = (b.0 - a.0, b.1 - a.1);
                let (acx, acy) = (c.0 - a.0, c.1 - a.1);
                let cross = abx * acy - aby * acx;
                let scale = abx.hypot(aby) * acx.hypot(acy);
                if cross.abs() <= 1e-6 * scale {
                    return true;
                }
            }
        }
    }
    false
}

/// Similarity transform moving the centroid to the origin and scaling the
/// mean distance from it to √2.
fn normalizing_transform(points: &[(f64, f64)]) -> Option<Matrix3<f64>> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| (p.0 - cx).hypot(p.1 - cy))
        .sum::<f64>()
        / n;
    if !(mean_dist > 1e-12) {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Some(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

/// Null vector of `a` (at least 9 rows) reshaped row-major into 3×3.
fn solve_dlt_homography(a: DMatrix<f64>) -> Option<Matrix3<f64>> {
    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))?;
    let h = v_t.row(min_idx);

    Some(Matrix3::new(
        h[0], h[1], h[2],
        h[3], h[4], h[5],
        h[6], h[7], h[8],
    ))
}

/// Estimate the homography mapping `src_points` onto `dst_points` through the
/// correspondences in `matches` (query index into `src`, train index into
/// `dst`).
pub fn estimate_homography(
    matches: &Matches,
    src_points: &[(f64, f64)],
    dst_points: &[(f64, f64)],
    config: &RansacConfig,
) -> Result<RansacResult<Matrix3<f64>>> {
    let data = matches
        .iter()
        .map(|m| {
            let src = src_points.get(m.query_idx).copied();
            let dst = dst_points.get(m.train_idx).copied();
            match (src, dst) {
                (Some(src), Some(dst)) => Ok(MatchPair { src, dst }),
                _ => Err(FeatureError::MatchingError(format!(
                    "match ({}, {}) out of range for {} source / {} destination points",
                    m.query_idx,
                    m.train_idx,
                    src_points.len(),
                    dst_points.len()
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(find_homography(&data, config))
}

/// Estimate a homography from explicit correspondences.
pub fn find_homography(pairs: &[MatchPair], config: &RansacConfig) -> RansacResult<Matrix3<f64>> {
    Ransac::new(config.clone()).run(&HomographyEstimator, pairs)
}
