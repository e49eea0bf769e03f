//! Polarization-resolved Fresnel reflectance at a planar interface.
//!
//! This module implements the Fresnel equations that govern how much optical
//! power reflects when a ray meets a boundary between two dielectric media.
//! The reflectance is used directly as a Monte Carlo probability: each
//! boundary crossing draws one uniform sample against it to decide between
//! reflection and refraction. Each interface is treated independently, with
//! no thin-film interference between layers.

use serde::Deserialize;

use crate::snell::Transmission;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn normal_incidence_reduces_to_index_contrast() {
        // ((n2 - n1) / (n1 + n2))^2, identical for both polarizations
        let (n1, n2) = (1.0_f32, 1.33_f32);
        let m = n2 / n1;
        let expected = ((n2 - n1) / (n1 + n2)).powi(2);
        let rp = parallel(0.0, 0.0, m, false);
        let rs = perpendicular(0.0, 0.0, m, false);
        assert!((rp - expected).abs() < 1e-6, "rp: {}", rp);
        assert!((rs - expected).abs() < 1e-6, "rs: {}", rs);
    }

    #[test]
    fn reflectance_bounded() {
        let pairs = [(1.0, 1.33), (1.33, 1.0), (1.0, 2.4), (1.5, 1.2)];
        for (n1, n2) in pairs {
            for i in 0..90 {
                let theta_i = (i as f32).to_radians();
                let sin_t = n1 * theta_i.sin() / n2;
                if sin_t.abs() >= 1.0 {
                    continue;
                }
                let theta_t = sin_t.asin();
                let m = n2 / n1;
                for r in [
                    parallel(theta_i, theta_t, m, false),
                    perpendicular(theta_i, theta_t, m, false),
                ] {
                    assert!((0.0..=1.0).contains(&r), "r: {} at {} deg", r, i);
                }
            }
        }
    }

    #[test]
    fn grazing_incidence_is_clamped_to_unity() {
        // the raw s-polarized quotient exceeds 1 near grazing incidence
        let (n1, n2) = (1.0_f32, 1.33_f32);
        let theta_i = 85.0_f32.to_radians();
        let theta_t = (n1 * theta_i.sin() / n2).asin();
        let rs = perpendicular(theta_i, theta_t, n2 / n1, false);
        assert_eq!(rs, 1.0);
    }

    #[test]
    fn brewster_angle_kills_parallel_component() {
        // tan(theta_B) = n2 / n1
        let (n1, n2) = (1.0_f32, 1.5_f32);
        let theta_b = (n2 / n1).atan();
        let theta_t = (n1 * theta_b.sin() / n2).asin();
        let rp = parallel(theta_b, theta_t, n2 / n1, false);
        let rs = perpendicular(theta_b, theta_t, n2 / n1, false);
        assert!(rp < 1e-6, "rp at Brewster: {}", rp);
        assert!(rs > 0.0);
    }

    #[test]
    fn total_internal_reflection_is_unity() {
        let r = reflectance(
            Polarization::Parallel,
            1.2,
            Transmission::TotalInternalReflection,
            1.0 / 1.5,
            false,
        );
        assert_eq!(r, 1.0);
    }

    #[test]
    fn upward_incidence_matches_mirrored_downward() {
        // cos(theta_i) is negative for a ray approaching from below; the
        // abs-cosine convention must recover the downward result.
        let theta_i = 0.5_f32;
        let (n1, n2) = (1.33_f32, 1.0_f32);
        let theta_t = (n1 * theta_i.sin() / n2).asin();
        let m = n2 / n1;
        let down = parallel(theta_i, theta_t, m, false);
        let up = parallel(std::f32::consts::PI - theta_i, theta_t, m, true);
        assert!((down - up).abs() < 1e-6, "down: {}, up: {}", down, up);
    }
}

/// Linear polarization of a tracked ray, relative to the plane of incidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    /// p-polarized: field parallel to the plane of incidence.
    Parallel,
    /// s-polarized: field perpendicular to the plane of incidence.
    Perpendicular,
}

/// Reflectance for p-polarized light.
///
/// `m` is the relative index `n_far / n_near`. When the ray approaches the
/// boundary from below, its incidence angle under the surface convention is
/// obtuse and `cos(theta_i)` comes out negative, so the absolute value is
/// substituted to keep the incidence angle measured positive from the normal.
/// Near grazing incidence the quotient can creep past unity, so the result
/// is clamped to keep the reflectance a valid probability.
pub fn parallel(theta_i: f32, theta_t: f32, m: f32, from_below: bool) -> f32 {
    let mut cos_ti = theta_i.cos();
    let cos_tt = theta_t.cos();
    if from_below {
        cos_ti = cos_ti.abs();
    }
    ((cos_tt - m * cos_ti) / (cos_ti + m * cos_tt)).powi(2).min(1.0)
}

/// Reflectance for s-polarized light. Same conventions as [`parallel`].
pub fn perpendicular(theta_i: f32, theta_t: f32, m: f32, from_below: bool) -> f32 {
    let mut cos_ti = theta_i.cos();
    let cos_tt = theta_t.cos();
    if from_below {
        cos_ti = cos_ti.abs();
    }
    ((cos_ti - m * cos_tt) / (cos_tt + m * cos_ti)).powi(2).min(1.0)
}

/// Reflectance for the given polarization and Snell outcome.
///
/// Under total internal reflection the reflectance is exactly 1, so the
/// Monte Carlo draw always resolves to a reflection.
pub fn reflectance(
    polarization: Polarization,
    theta_i: f32,
    transmission: Transmission,
    m: f32,
    from_below: bool,
) -> f32 {
    match transmission {
        Transmission::TotalInternalReflection => 1.0,
        Transmission::Angle(theta_t) => match polarization {
            Polarization::Parallel => parallel(theta_i, theta_t, m, from_below),
            Polarization::Perpendicular => perpendicular(theta_i, theta_t, m, from_below),
        },
    }
}
