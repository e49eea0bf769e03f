//! A single tracked ray and its per-tick state machine.
//!
//! Each particle advances itself once per tick: scan the stack for a
//! boundary it is about to cross, resolve the crossing with one Monte Carlo
//! draw against the Fresnel reflectance, then apply the step. A particle
//! that leaves the visible domain flips its alive flag and waits for the
//! session to reclaim it into the bounce histogram.

use nalgebra::{Point2, Vector2};
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

use crate::fresnel::{self, Polarization};
use crate::settings::DOMAIN;
use crate::snell::{self, Transmission};
use crate::stack::{Layer, Stack};


/// Which side of a layer boundary the particle is arriving from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Approach {
    /// Travelling downward into the layer's upper boundary.
    FromAbove,
    /// Travelling upward into the layer's lower boundary.
    FromBelow,
}

/// A single ray tracked through the stack.
///
/// The heading is stored redundantly as `(theta, speed)` and as the
/// velocity vector; the two are always updated together through
/// [`Particle::set_heading`] so that `vel == (speed * cos(theta),
/// speed * sin(theta))` holds exactly while the particle is alive.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: u64,
    pub pos: Point2<f32>,
    pub vel: Vector2<f32>,
    pub theta: f32,
    pub speed: f32,
    pub wavelength: f32,
    pub polarization: Polarization,
    pub bounces: u32,
    pub alive: bool,
}

impl Particle {
    pub fn new(
        id: u64,
        x: f32,
        y: f32,
        theta: f32,
        speed: f32,
        wavelength: f32,
        polarization: Polarization,
    ) -> Self {
        let mut particle = Self {
            id,
            pos: Point2::new(x, y),
            vel: Vector2::zeros(),
            theta,
            speed,
            wavelength,
            polarization,
            bounces: 0,
            alive: true,
        };
        particle.set_heading(theta, speed);
        particle
    }

    /// Updates `theta`, `speed` and the velocity vector together.
    fn set_heading(&mut self, theta: f32, speed: f32) {
        self.theta = theta;
        self.speed = speed;
        self.vel = Vector2::new(theta.cos() * speed, theta.sin() * speed);
    }

    /// Advances the particle by one tick: resolve at most one boundary
    /// crossing, step, then check for exit from the visible domain.
    pub fn advance<R: Rng + ?Sized>(&mut self, stack: &Stack, rng: &mut R) {
        if !self.alive {
            return;
        }
        self.cross_boundaries(stack, rng);
        self.pos += self.vel;
        if self.pos.x.abs() > DOMAIN || self.pos.y.abs() > DOMAIN {
            self.alive = false;
        }
    }

    /// Scans the stack in order and resolves the first boundary the pending
    /// step would cross. At most one crossing is processed per tick.
    fn cross_boundaries<R: Rng + ?Sized>(&mut self, stack: &Stack, rng: &mut R) {
        for layer in stack.layers() {
            if self.entering_from_above(layer) {
                self.resolve_crossing(layer, Approach::FromAbove, rng);
                break;
            } else if self.entering_from_below(layer) {
                self.resolve_crossing(layer, Approach::FromBelow, rng);
                break;
            }
        }
    }

    fn entering_from_above(&self, layer: &Layer) -> bool {
        self.vel.y < 0.0 && self.pos.y > layer.y0 && self.pos.y + self.vel.y < layer.y0
    }

    fn entering_from_below(&self, layer: &Layer) -> bool {
        self.vel.y > 0.0 && self.pos.y < layer.yf && self.pos.y + self.vel.y > layer.yf
    }

    /// One Monte Carlo trial at the detected boundary: total internal
    /// reflection forces a reflect, otherwise a single uniform draw against
    /// the Fresnel reflectance picks the branch.
    fn resolve_crossing<R: Rng + ?Sized>(&mut self, layer: &Layer, approach: Approach, rng: &mut R) {
        let li = layer.indices_at(self.wavelength);
        let (n_near, boundary_y) = match approach {
            Approach::FromAbove => (li.n_prev, layer.y0),
            Approach::FromBelow => (li.n_next, layer.yf),
        };
        let n_far = li.n;
        let theta_i = FRAC_PI_2 - self.theta;
        let from_below = approach == Approach::FromBelow;

        let transmission = snell::get_theta_t(theta_i, n_near, n_far);
        match transmission {
            Transmission::TotalInternalReflection => self.reflect(boundary_y),
            Transmission::Angle(theta_t) => {
                let m = n_far / n_near;
                let r = fresnel::reflectance(self.polarization, theta_i, transmission, m, from_below);
                if rng.random::<f32>() < r {
                    self.reflect(boundary_y);
                } else {
                    self.refract(boundary_y, theta_t, n_near / n_far, approach);
                }
            }
        }
    }

    /// Mirror the heading about the boundary plane, keeping the speed.
    fn reflect(&mut self, boundary_y: f32) {
        self.bounces += 1;
        self.move_to_boundary(boundary_y);
        self.set_heading(-self.theta, self.speed);
    }

    /// Bend into the far medium and rescale the speed by the index ratio.
    fn refract(&mut self, boundary_y: f32, theta_t: f32, speed_ratio: f32, approach: Approach) {
        self.move_to_boundary(boundary_y);
        let mut theta = FRAC_PI_2 - theta_t;
        // keep upward travel upward: the surface-angle convention folds the
        // travel direction into the sign of theta
        if approach == Approach::FromBelow {
            theta = -theta;
        }
        self.set_heading(theta, self.speed * speed_ratio);
    }

    /// Advances exactly to the boundary along the current heading, so the
    /// crossing is not detected a second time next tick.
    ///
    /// The fraction must lie in (0, 1) for a correctly detected crossing.
    /// A value outside that range is a detection bug, so debug builds fail
    /// fast while release builds clamp into range.
    fn move_to_boundary(&mut self, boundary_y: f32) {
        let pct_move = (boundary_y - self.pos.y) / self.vel.y;
        debug_assert!(
            pct_move > 0.0 && pct_move < 1.0,
            "boundary fraction {} outside (0, 1)",
            pct_move
        );
        let pct_move = pct_move.clamp(0.0, 1.0);
        self.pos += self.vel * pct_move;
    }
}
