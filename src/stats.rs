//! Bucketed bounce-count statistics for exited particles.
//!
//! Every particle that leaves the visible domain contributes its final
//! reflection count to one bucket. Counts at or above the configured
//! ceiling share a single overflow bucket labelled `"<K>+"`, matching the
//! labels a presentation layer renders next to the plot.

use std::fmt;
use std::ops::AddAssign;


/// Histogram of bounce counts with a fixed overflow ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BounceHistogram {
    ceiling: u32,
    counts: Vec<u64>,
}

impl BounceHistogram {
    /// Creates an empty histogram with buckets `0..ceiling` plus the
    /// overflow bucket `"<ceiling>+"`.
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            counts: vec![0; ceiling as usize + 1],
        }
    }

    /// Folds one exited particle's bounce count into its bucket.
    pub fn record(&mut self, bounces: u32) {
        let bucket = bounces.min(self.ceiling) as usize;
        self.counts[bucket] += 1;
    }

    /// Clears all buckets, keeping the ceiling.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Total number of particles recorded.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Raw bucket counts, overflow last.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    fn label(&self, bucket: usize) -> String {
        if bucket == self.ceiling as usize {
            format!("{}+", self.ceiling)
        } else {
            format!("{}", bucket)
        }
    }

    /// Labelled snapshot of the current counts, suitable for rendering.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counts
            .iter()
            .enumerate()
            .map(|(bucket, &count)| (self.label(bucket), count))
            .collect()
    }
}

impl AddAssign<&BounceHistogram> for BounceHistogram {
    fn add_assign(&mut self, other: &BounceHistogram) {
        assert_eq!(
            self.ceiling, other.ceiling,
            "cannot merge histograms with different ceilings"
        );
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }
}

impl fmt::Display for BounceHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reflection Counts:")?;
        let total = self.total().max(1) as f64;
        for (bucket, &count) in self.counts.iter().enumerate() {
            let pct = 100.0 * count as f64 / total;
            writeln!(f, "  {}: {} ({:.2}%)", self.label(bucket), count, pct)?;
        }
        Ok(())
    }
}
