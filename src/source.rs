//! The particle emitter on the unit arc above the stack.
//!
//! The source sits on the arc from (-1, 0) through (0, 1) to (1, 0) and
//! fires particles inward, towards the layers. Its position is given by the
//! x coordinate; the emission angle follows as `acos(x)` so the ray always
//! points at the origin side of the arc. Automatic motion sweeps the source
//! between two angles, replacing the widget-driven movement modes of an
//! interactive frontend with an explicit selector.

use rand::Rng;
use serde::Deserialize;

use crate::settings::{LAMBDA_0, LAMBDA_F, SOURCE_CLAMP};


/// Wavelength selection applied at each spawn.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Spectrum {
    /// Every particle carries the same wavelength, in nm.
    Monochromatic { wavelength: f32 },
    /// Each particle draws a wavelength uniformly over the visible band.
    Broadband,
}

impl Spectrum {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match self {
            Spectrum::Monochromatic { wavelength } => *wavelength,
            Spectrum::Broadband => rng.random_range(LAMBDA_0..LAMBDA_F),
        }
    }
}

/// Automatic source movement. Angles are in degrees, angular velocity in
/// degrees per unit of `advance` time. Sweeps ping-pong between the two
/// bounds.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceMotion {
    /// The source stays where it was put.
    Fixed,
    /// The source travels along the arc perimeter.
    Orbit {
        omega: f32,
        theta_start: f32,
        theta_end: f32,
    },
    /// The source stays in place while the emission angle sweeps.
    Spin {
        omega: f32,
        theta_start: f32,
        theta_end: f32,
    },
}

/// Particle emitter constrained to the unit arc.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    x: f32,
    y: f32,
    theta: f32,
    motion: SourceMotion,
    /// Sweep angle in degrees for the automatic modes.
    sweep: f32,
    /// Current sweep direction, +1 or -1.
    sweep_dir: f32,
}

impl Source {
    /// Creates a fixed source at arc position `x`.
    pub fn new(x: f32) -> Self {
        let mut source = Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            motion: SourceMotion::Fixed,
            sweep: 0.0,
            sweep_dir: 1.0,
        };
        source.snap_to(x);
        source
    }

    /// Creates a source with an automatic movement mode.
    pub fn with_motion(x: f32, motion: SourceMotion) -> Self {
        let mut source = Source::new(x);
        if let SourceMotion::Orbit { theta_start, .. } | SourceMotion::Spin { theta_start, .. } =
            motion
        {
            source.sweep = theta_start;
        }
        source.motion = motion;
        source
    }

    /// Moves the source to arc position `x` and re-derives the emission
    /// angle. Positions beyond the arc ends are clamped inside them, since
    /// emission exactly along the surface is degenerate.
    pub fn snap_to(&mut self, x: f32) {
        let x = x.clamp(-SOURCE_CLAMP, SOURCE_CLAMP);
        self.theta = x.acos();
        self.x = x;
        self.y = self.theta.sin();
    }

    /// Applies the automatic movement mode over `dt` time units.
    pub fn advance(&mut self, dt: f32) {
        let (omega, theta_start, theta_end) = match self.motion {
            SourceMotion::Fixed => return,
            SourceMotion::Orbit {
                omega,
                theta_start,
                theta_end,
            }
            | SourceMotion::Spin {
                omega,
                theta_start,
                theta_end,
            } => (omega, theta_start, theta_end),
        };

        let (lo, hi) = (theta_start.min(theta_end), theta_start.max(theta_end));
        if hi - lo <= f32::EPSILON {
            self.sweep = lo;
        } else {
            // ping-pong between the bounds, reversing at each end
            let mut remaining = omega.abs() * dt;
            while remaining > 0.0 {
                let to_bound = if self.sweep_dir > 0.0 {
                    hi - self.sweep
                } else {
                    self.sweep - lo
                };
                if to_bound <= remaining {
                    self.sweep = if self.sweep_dir > 0.0 { hi } else { lo };
                    self.sweep_dir = -self.sweep_dir;
                    remaining -= to_bound;
                } else {
                    self.sweep += remaining * self.sweep_dir;
                    remaining = 0.0;
                }
            }
        }

        match self.motion {
            SourceMotion::Orbit { .. } => self.snap_to(self.sweep.to_radians().cos()),
            SourceMotion::Spin { .. } => self.theta = self.sweep.to_radians(),
            SourceMotion::Fixed => unreachable!(),
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Emission angle in radians. Spawned particles take this heading with
    /// a negated speed, so they travel inward from the arc.
    pub fn theta(&self) -> f32 {
        self.theta
    }
}
