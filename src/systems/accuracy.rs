//! Shot spread.

use bevy::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Generate a random direction within the spread cone.
///
/// Uses a Gaussian distribution so shots cluster around the aim point; the
/// cone angle is treated as three standard deviations.
///
/// # Arguments
/// * `base_direction` - The aim direction before spread
/// * `spread_angle` - Cone angle in radians; zero leaves the direction untouched
/// * `rng` - Random source
///
/// # Returns
/// A unit direction with spread applied
pub fn apply_spread(base_direction: Vec3, spread_angle: f32, rng: &mut impl Rng) -> Vec3 {
    let direction = base_direction.normalize_or(Vec3::NEG_Z);
    if spread_angle <= 0.0 {
        return direction;
    }

    let Ok(normal) = Normal::new(0.0, spread_angle / 3.0) else {
        return direction;
    };

    let angle_x: f32 = normal.sample(rng);
    let angle_y: f32 = normal.sample(rng);

    // Offsets are taken in the plane perpendicular to the shot
    let (right, up) = direction.any_orthonormal_pair();
    (direction + right * angle_x.tan() + up * angle_y.tan()).normalize_or(direction)
}
