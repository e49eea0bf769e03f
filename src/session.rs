//! The simulation session: particle ownership, ticking and statistics.
//!
//! A session owns the current stack snapshot, the live particle arena and
//! the bounce histogram. Each tick advances every live particle exactly
//! once; particles never interact, so the order is unspecified. Exited
//! particles stay in the arena until the periodic reclamation pass folds
//! their bounce counts into the histogram, which keeps the conservation
//! invariant `histogram total + arena size == particles spawned` true at
//! every point between calls.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::fresnel::Polarization;
use crate::particle::Particle;
use crate::settings::Settings;
use crate::source::{Source, Spectrum};
use crate::stack::Stack;
use crate::stats::BounceHistogram;

#[cfg(test)]
mod tests {

    use super::*;

    fn settings() -> Settings {
        Settings {
            indices: vec![1.33],
            dispersion: 0.0,
            speed: 0.04,
            source_x: 0.5,
            spectrum: Spectrum::Monochromatic { wavelength: 580.0 },
            polarization: None,
            bucket_ceiling: 4,
            cleanup_interval: 5,
            num_particles: 100,
            max_ticks_per_particle: 10_000,
            seed: Some(42),
        }
    }

    #[test]
    fn ids_increase_monotonically() {
        let mut session = Session::new(&settings()).unwrap();
        let a = session.spawn(0.0, 0.5, 1.0, -0.04, 580.0, Polarization::Parallel);
        let b = session.spawn(0.0, 0.5, 1.0, -0.04, 580.0, Polarization::Parallel);
        assert!(b > a);
        assert_eq!(session.total_spawned(), 2);
    }

    #[test]
    fn alternating_polarization_when_unset() {
        let mut session = Session::new(&settings()).unwrap();
        let source = Source::new(0.5);
        let a = session.spawn_from_source(&source, 0.04, Spectrum::Broadband, None);
        let b = session.spawn_from_source(&source, 0.04, Spectrum::Broadband, None);
        let pa = session.snapshot().iter().find(|p| p.id == a).unwrap().polarization;
        let pb = session.snapshot().iter().find(|p| p.id == b).unwrap().polarization;
        assert_ne!(pa, pb);
    }

    #[test]
    fn conservation_holds_across_ticks() {
        let mut session = Session::new(&settings()).unwrap();
        let source = Source::new(0.5);
        for tick in 0..400 {
            if tick % 2 == 0 {
                session.spawn_from_source(
                    &source,
                    0.04,
                    Spectrum::Monochromatic { wavelength: 580.0 },
                    None,
                );
            }
            session.tick();
            assert_eq!(
                session.histogram().total() + session.arena_size() as u64,
                session.total_spawned()
            );
        }
        // after enough ticks something must have exited
        session.reclaim();
        assert!(session.histogram().total() > 0);
    }

    #[test]
    fn reconfigure_clears_state_atomically() {
        let mut session = Session::new(&settings()).unwrap();
        for _ in 0..10 {
            session.spawn(0.0, 0.5, 1.0, -0.04, 580.0, Polarization::Parallel);
        }
        session.tick();
        session.reconfigure(&[1.5, 1.2], 0.001).unwrap();
        assert_eq!(session.live_count(), 0);
        assert_eq!(session.histogram().total(), 0);
        assert!(session.histogram().counts().iter().all(|&c| c == 0));
        assert_eq!(session.stack().layers().len(), 4);
    }

    #[test]
    fn reconfigure_rejects_bad_indices_and_keeps_old_state() {
        let mut session = Session::new(&settings()).unwrap();
        for _ in 0..3 {
            session.spawn(0.0, 0.5, 1.0, -0.04, 580.0, Polarization::Parallel);
        }
        assert!(session.reconfigure(&[1.5, -0.2], 0.0).is_err());
        assert!(session.reconfigure(&[], 0.0).is_err());
        // previous configuration and particles remain in effect
        assert_eq!(session.live_count(), 3);
        assert_eq!(session.stack().layers().len(), 3);
    }

    #[test]
    fn exited_particles_fold_into_histogram() {
        let mut session = Session::new(&settings()).unwrap();
        // horizontal particle close to the domain edge exits immediately
        session.spawn(0.99, 0.5, 0.0, 0.04, 580.0, Polarization::Parallel);
        session.tick();
        session.reclaim();
        assert_eq!(session.live_count(), 0);
        assert_eq!(session.histogram().total(), 1);
        assert_eq!(session.histogram().counts()[0], 1);
    }
}

/// Per-particle state exposed to a presentation layer each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub wavelength: f32,
    pub polarization: Polarization,
    pub bounces: u32,
    pub alive: bool,
}

/// A running simulation over one stack configuration.
#[derive(Debug)]
pub struct Session {
    stack: Arc<Stack>,
    particles: HashMap<u64, Particle>,
    histogram: BounceHistogram,
    next_id: u64,
    spawned: u64,
    frame: u64,
    cleanup_interval: u64,
    rng: StdRng,
}

impl Session {
    /// Builds a session from validated settings. Fails if the configured
    /// indices cannot form a stack.
    pub fn new(settings: &Settings) -> Result<Self> {
        let stack = Stack::build(&settings.indices, settings.dispersion)?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            stack: Arc::new(stack),
            particles: HashMap::new(),
            histogram: BounceHistogram::new(settings.bucket_ceiling),
            next_id: 0,
            spawned: 0,
            frame: 0,
            cleanup_interval: settings.cleanup_interval.max(1),
            rng,
        })
    }

    /// The current stack snapshot.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Adds a new travelling particle and returns its id. Ids increase
    /// monotonically and are never reused.
    pub fn spawn(
        &mut self,
        x: f32,
        y: f32,
        theta: f32,
        speed: f32,
        wavelength: f32,
        polarization: Polarization,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.spawned += 1;
        self.particles
            .insert(id, Particle::new(id, x, y, theta, speed, wavelength, polarization));
        id
    }

    /// Spawns a particle at the source, heading inward from the arc.
    ///
    /// The speed is negated so the ray travels towards the stack, matching
    /// the arc angle convention. When no polarization is given, spawns
    /// alternate between parallel and perpendicular by id parity.
    pub fn spawn_from_source(
        &mut self,
        source: &Source,
        speed: f32,
        spectrum: Spectrum,
        polarization: Option<Polarization>,
    ) -> u64 {
        let (x, y) = source.position();
        let wavelength = spectrum.sample(&mut self.rng);
        let polarization = polarization.unwrap_or(if self.next_id % 2 == 0 {
            Polarization::Parallel
        } else {
            Polarization::Perpendicular
        });
        self.spawn(x, y, source.theta(), -speed, wavelength, polarization)
    }

    /// Advances every live particle exactly once. Exited particles are
    /// folded into the histogram on a fixed tick interval; the batching is
    /// an optimization, callers needing immediate statistics may call
    /// [`Session::reclaim`] directly.
    pub fn tick(&mut self) {
        self.frame += 1;
        let stack = Arc::clone(&self.stack);
        let rng = &mut self.rng;
        for particle in self.particles.values_mut() {
            particle.advance(&stack, rng);
        }
        if self.frame % self.cleanup_interval == 0 {
            self.reclaim();
        }
    }

    /// Folds every exited particle into the histogram and drops it from
    /// the arena.
    pub fn reclaim(&mut self) {
        let histogram = &mut self.histogram;
        self.particles.retain(|_, particle| {
            if particle.alive {
                true
            } else {
                histogram.record(particle.bounces);
                false
            }
        });
    }

    /// Atomically replaces the stack. Mid-flight particles are discarded
    /// rather than migrated, and the histogram restarts from zero. On error
    /// the previous configuration stays in effect untouched.
    pub fn reconfigure(&mut self, indices: &[f32], dispersion: f32) -> Result<()> {
        let stack = Stack::build(indices, dispersion)?;
        self.stack = Arc::new(stack);
        self.particles.clear();
        self.histogram.reset();
        Ok(())
    }

    /// Snapshot of the current bucketed statistics.
    pub fn histogram(&self) -> &BounceHistogram {
        &self.histogram
    }

    /// Positions and status of every particle still in the arena, for the
    /// caller to render.
    pub fn snapshot(&self) -> Vec<ParticleView> {
        self.particles
            .values()
            .map(|p| ParticleView {
                id: p.id,
                x: p.pos.x,
                y: p.pos.y,
                wavelength: p.wavelength,
                polarization: p.polarization,
                bounces: p.bounces,
                alive: p.alive,
            })
            .collect()
    }

    /// Number of particles currently travelling.
    pub fn live_count(&self) -> usize {
        self.particles.values().filter(|p| p.alive).count()
    }

    /// Number of particles in the arena, including exited ones awaiting
    /// reclamation.
    pub fn arena_size(&self) -> usize {
        self.particles.len()
    }

    pub fn total_spawned(&self) -> u64 {
        self.spawned
    }
}
