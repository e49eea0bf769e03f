//! Batch Monte Carlo runner over many independent particles.
//!
//! A single interactive session traces particles one tick at a time; for
//! statistics it is faster to trace a whole population to exit in one go.
//! Particles never interact, so the ensemble distributes them across a
//! rayon pool, gives each trial its own generator derived from the base
//! seed, and reduces the per-trial bounce counts into one histogram. With
//! a fixed seed the result is reproducible regardless of thread count.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::fresnel::Polarization;
use crate::output;
use crate::particle::Particle;
use crate::settings::Settings;
use crate::source::Source;
use crate::stack::Stack;
use crate::stats::BounceHistogram;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::source::Spectrum;

    fn settings() -> Settings {
        Settings {
            indices: vec![1.33],
            dispersion: 0.0,
            speed: 0.04,
            source_x: 0.5,
            spectrum: Spectrum::Monochromatic { wavelength: 580.0 },
            polarization: None,
            bucket_ceiling: 4,
            cleanup_interval: 20,
            num_particles: 500,
            max_ticks_per_particle: 10_000,
            seed: Some(1234),
        }
    }

    #[test]
    fn traces_every_particle_to_a_bucket() {
        let mut ensemble = Ensemble::new(settings()).unwrap();
        ensemble.solve();
        assert_eq!(ensemble.result.total(), 500);
    }

    #[test]
    fn fixed_seed_reproduces_histogram() {
        let mut a = Ensemble::new(settings()).unwrap();
        let mut b = Ensemble::new(settings()).unwrap();
        a.solve();
        b.solve();
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut bad = settings();
        bad.indices = vec![-1.0];
        assert!(Ensemble::new(bad).is_err());
    }
}

/// A batch simulation tracing `num_particles` rays to exit.
#[derive(Debug)]
pub struct Ensemble {
    pub settings: Settings,
    pub result: BounceHistogram,
}

impl Ensemble {
    /// Creates a batch run from settings, validating the stack up front.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        // fail now rather than inside the worker pool
        Stack::build(&settings.indices, settings.dispersion)?;
        let result = BounceHistogram::new(settings.bucket_ceiling);
        Ok(Self { settings, result })
    }

    /// Traces all particles in parallel and reduces their bounce counts
    /// into the result histogram.
    pub fn solve(&mut self) {
        let start = Instant::now();
        println!("Tracing particles...");

        let stack = Stack::build(&self.settings.indices, self.settings.dispersion)
            .expect("stack was validated at construction");
        let source = Source::new(self.settings.source_x);
        let base_seed = match self.settings.seed {
            Some(seed) => seed,
            None => rand::rng().random(),
        };

        let n = self.settings.num_particles;
        let pb = ProgressBar::new(n as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>7}/{len:7} ETA: {eta_precise}",
            )
            .unwrap()
            .progress_chars("█▇▆▅▄▃▂▁"),
        );

        let ceiling = self.settings.bucket_ceiling;
        let result = (0..n)
            .into_par_iter()
            .map(|trial| {
                let bounces = self.trace_one(trial as u64, base_seed, &stack, &source);
                pb.inc(1);
                bounces
            })
            .fold(
                || BounceHistogram::new(ceiling),
                |mut hist, bounces| {
                    hist.record(bounces);
                    hist
                },
            )
            .reduce(
                || BounceHistogram::new(ceiling),
                |mut acc, local| {
                    acc += &local;
                    acc
                },
            );
        self.result = result;

        pb.finish();
        println!("Traced {} particles in {:.2?}", n, start.elapsed());
    }

    /// Traces a single particle until it exits the domain and returns its
    /// bounce count. Each trial derives an independent generator from the
    /// base seed so results do not depend on scheduling.
    fn trace_one(&self, trial: u64, base_seed: u64, stack: &Stack, source: &Source) -> u32 {
        let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(trial));
        let wavelength = self.settings.spectrum.sample(&mut rng);
        let polarization = self.settings.polarization.unwrap_or(if trial % 2 == 0 {
            Polarization::Parallel
        } else {
            Polarization::Perpendicular
        });
        let (x, y) = source.position();
        let mut particle = Particle::new(
            trial,
            x,
            y,
            source.theta(),
            -self.settings.speed,
            wavelength,
            polarization,
        );

        let mut ticks = 0;
        while particle.alive && ticks < self.settings.max_ticks_per_particle {
            particle.advance(stack, &mut rng);
            ticks += 1;
        }
        particle.bounces
    }

    /// Prints the final statistics and writes them to disk.
    pub fn writeup(&self) {
        println!("{}", self.result);
        if let Err(err) = output::writeup(&self.result) {
            eprintln!("Error writing bounce counts: {}", err);
        }
    }
}
