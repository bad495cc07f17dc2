//! Point-light influence radius from the attenuation model `1 / (c + l·d + q·d²)`.

use glam::Vec3;

pub const ATTENUATION_CONSTANT: f32 = 1.0;
pub const ATTENUATION_LINEAR: f32 = 0.14;
pub const ATTENUATION_QUADRATIC: f32 = 0.07;

/// Distance at which the brightest channel drops to 5/256 of its intensity.
/// Lights too dim to ever reach that threshold get radius 0.
pub fn point_light_radius(color: Vec3) -> f32 {
    let l_max = color.max_element();
    let (c, l, q) = (ATTENUATION_CONSTANT, ATTENUATION_LINEAR, ATTENUATION_QUADRATIC);
    let discriminant = l * l - 4.0 * q * (c - (256.0 / 5.0) * l_max);
    if discriminant <= 0.0 {
        return 0.0;
    }
    ((-l + discriminant.sqrt()) / (2.0 * q)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn white_light_radius() {
        assert_relative_eq!(point_light_radius(Vec3::ONE), 25.798, epsilon = 1e-3);
    }

    #[test]
    fn radius_uses_the_brightest_channel() {
        let red = point_light_radius(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(red, point_light_radius(Vec3::ONE));
    }

    #[test]
    fn black_light_has_no_volume() {
        assert_eq!(point_light_radius(Vec3::ZERO), 0.0);
    }

    #[test]
    fn radius_is_monotonic_in_intensity() {
        let mut previous = point_light_radius(Vec3::splat(0.05));
        for step in 1..=200 {
            let l_max = 0.05 + step as f32 * 0.05;
            let radius = point_light_radius(Vec3::splat(l_max));
            assert!(radius > previous, "radius must grow: {l_max}");
            previous = radius;
        }
    }
}
