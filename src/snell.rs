//! Snell's law for planar dielectric interfaces.
//!
//! This module computes the transmission angle for a ray crossing a boundary
//! between two media with real refractive indices. When the transmitted sine
//! exceeds unity there is no real transmission angle and the critical-angle
//! condition is signaled instead, so total internal reflection is an ordinary
//! branch of the return type rather than an error.

#[cfg(test)]
mod tests {

    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn normal_incidence_same_media() {
        let theta_t = get_theta_t(0.0, 1.0, 1.0);
        match theta_t {
            Transmission::Angle(theta_t) => assert!(theta_t.abs() < 0.01),
            _ => panic!("expected transmission at normal incidence"),
        }
    }

    #[test]
    fn normal_incidence() {
        let theta_t = get_theta_t(0.0, 1.0, 1.31);
        match theta_t {
            Transmission::Angle(theta_t) => assert!(theta_t.abs() < f32::EPSILON),
            _ => panic!("expected transmission at normal incidence"),
        }
    }

    #[test]
    fn angle30_incidence() {
        let theta_i = 30.0 * PI / 180.0;
        match get_theta_t(theta_i, 1.0, 1.31) {
            Transmission::Angle(theta_t) => {
                let abs_difference = (theta_t - 0.3916126).abs();
                assert!(abs_difference < 0.001)
            }
            _ => panic!("30 degrees into denser medium must transmit"),
        }
    }

    #[test]
    fn snell_round_trip() {
        // sin(theta_i) * n1 == sin(theta_t) * n2 for any non-critical angle
        let theta_i = 0.7;
        let (n1, n2) = (1.5, 1.2);
        match get_theta_t(theta_i, n1, n2) {
            Transmission::Angle(theta_t) => {
                let lhs = theta_i.sin() * n1;
                let rhs = theta_t.sin() * n2;
                assert!((lhs - rhs).abs() < 1e-6, "lhs: {}, rhs: {}", lhs, rhs);
            }
            _ => panic!("0.7 rad at 1.5 -> 1.2 is below the critical angle"),
        }
    }

    #[test]
    fn total_internal_reflection() {
        // critical angle for 1.5 -> 1.0 is asin(1/1.5) ~ 0.7297 rad
        let critical = (1.0_f32 / 1.5).asin();
        assert_eq!(
            get_theta_t(critical + 0.01, 1.5, 1.0),
            Transmission::TotalInternalReflection
        );
        assert!(matches!(
            get_theta_t(critical - 0.01, 1.5, 1.0),
            Transmission::Angle(_)
        ));
    }

    #[test]
    fn from_below_supplementary_angle() {
        // An upward ray carries theta_i > pi/2 under the surface-angle
        // convention. Its sine matches the mirrored downward ray, so the
        // transmission angle must too.
        let theta_i = 0.6;
        let up = get_theta_t(PI - theta_i, 1.0, 1.33);
        let down = get_theta_t(theta_i, 1.0, 1.33);
        match (up, down) {
            (Transmission::Angle(a), Transmission::Angle(b)) => {
                assert!((a - b).abs() < 1e-6)
            }
            _ => panic!("both rays must transmit"),
        }
    }
}

/// Outcome of applying Snell's law at a single planar interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transmission {
    /// Real transmission angle, measured from the surface normal.
    Angle(f32),
    /// No real transmission angle exists; all energy reflects.
    TotalInternalReflection,
}

/// Computes the transmission angle for a ray crossing from a medium with
/// index `n1` into a medium with index `n2`, where `theta_i` is the incidence
/// angle measured from the surface normal.
///
/// `sin(theta_t) = n1 * sin(theta_i) / n2`. If the right hand side leaves
/// `[-1, 1]` the critical-angle condition has been exceeded and
/// [`Transmission::TotalInternalReflection`] is returned.
pub fn get_theta_t(theta_i: f32, n1: f32, n2: f32) -> Transmission {
    let sin_t = n1 * theta_i.sin() / n2;

    if sin_t.abs() >= 1.0 {
        Transmission::TotalInternalReflection
    } else {
        Transmission::Angle(sin_t.asin())
    }
}
