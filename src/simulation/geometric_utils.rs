//! Geometric utility functions for distance calculations and steering.

use geo::algorithm::Distance;
use geo::{Euclidean, Point};
use ndarray::Array1;
use rand::Rng;

use super::params::Bounds;

/// Builds a 2D position vector.
pub fn pos2(x: f32, y: f32) -> Array1<f32> {
    Array1::from_vec(vec![x, y])
}

/// Euclidean distance between two 2D positions.
pub fn distance(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    Euclidean.distance(Point::new(a[0], a[1]), Point::new(b[0], b[1]))
}

/// Moves `from` toward `to` by at most `max_delta` without overshooting.
///
/// # Returns
///
/// The new position. If `to` is closer than `max_delta` it is returned as is.
pub fn move_towards(from: &Array1<f32>, to: &Array1<f32>, max_delta: f32) -> Array1<f32> {
    let delta = to - from;
    let dist = distance(from, to);
    if dist <= max_delta || dist == 0.0 {
        return to.clone();
    }
    from + &(delta * (max_delta / dist))
}

/// Point at the same distance from `pos` as `threat`, on the opposite side.
pub fn away_from(pos: &Array1<f32>, threat: &Array1<f32>) -> Array1<f32> {
    pos + &(pos - threat)
}

/// Clamps a position into the world bounds in place.
pub fn clamp_to_bounds_mut(v: &mut Array1<f32>, bounds: &Bounds) {
    v[0] = v[0].clamp(bounds.min_x, bounds.max_x);
    v[1] = v[1].clamp(bounds.min_y, bounds.max_y);
}

/// Uniformly random position inside the bounds.
pub fn random_in_bounds<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds) -> Array1<f32> {
    pos2(
        rng.random_range(bounds.min_x..=bounds.max_x),
        rng.random_range(bounds.min_y..=bounds.max_y),
    )
}

/// Uniformly random position inside a circle (rejection sampling).
pub fn random_in_circle<R: Rng + ?Sized>(rng: &mut R, center: &Array1<f32>, radius: f32) -> Array1<f32> {
    loop {
        let x = rng.random_range(-1.0f32..=1.0);
        let y = rng.random_range(-1.0f32..=1.0);
        if x * x + y * y <= 1.0 {
            return pos2(center[0] + x * radius, center[1] + y * radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_towards_does_not_overshoot() {
        let from = pos2(0.0, 0.0);
        let to = pos2(3.0, 4.0);

        let step = move_towards(&from, &to, 1.0);
        assert!((distance(&from, &step) - 1.0).abs() < 1e-5);
        assert!((step[0] - 0.6).abs() < 1e-5);

        let arrived = move_towards(&from, &to, 10.0);
        assert_eq!(arrived, to);
    }

    #[test]
    fn away_from_mirrors_threat() {
        let p = away_from(&pos2(1.0, 1.0), &pos2(0.0, 1.0));
        assert_eq!(p, pos2(2.0, 1.0));
    }

    #[test]
    fn clamp_keeps_points_inside() {
        let bounds = Bounds {
            min_x: -8.0,
            max_x: 8.0,
            min_y: -4.0,
            max_y: 4.0,
        };
        let mut p = pos2(12.0, -9.0);
        clamp_to_bounds_mut(&mut p, &bounds);
        assert_eq!(p, pos2(8.0, -4.0));
    }
}
