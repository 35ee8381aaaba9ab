use std::f64::consts::TAU;

use featseq_types::{Point2, ProfileEntity};

/// Points per arc or circle when sampling for winding.
const CURVE_SAMPLES: usize = 16;

/// Sample an entity along its declared direction, excluding its end point
/// so that consecutive entities of a loop do not repeat vertices.
/// Splines are approximated by their control polygon.
pub fn sample_points(entity: &ProfileEntity) -> Vec<Point2> {
    match entity {
        ProfileEntity::Line { start, .. } => vec![*start],
        ProfileEntity::Circle { center, radius } => (0..CURVE_SAMPLES)
            .map(|k| Point2::polar(*center, *radius, TAU * k as f64 / CURVE_SAMPLES as f64))
            .collect(),
        ProfileEntity::Arc {
            center,
            radius,
            start_angle,
            sweep_angle,
        } => (0..CURVE_SAMPLES)
            .map(|k| {
                let t = k as f64 / CURVE_SAMPLES as f64;
                Point2::polar(*center, *radius, start_angle + sweep_angle * t)
            })
            .collect(),
        ProfileEntity::Spline { control_points, .. } => match control_points.split_last() {
            Some((_, head)) => head.to_vec(),
            None => Vec::new(),
        },
        ProfileEntity::Unsupported => Vec::new(),
    }
}

/// Shoelace area of a closed polygon. Positive = counter-clockwise.
pub fn signed_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area / 2.0
}
