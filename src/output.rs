use std::{fs::File, io::BufWriter};

use anyhow::Result;
use std::io::Write;

use crate::stats::BounceHistogram;

/// Write the bounce-count histogram to a file, one labelled bucket per line
pub fn writeup(histogram: &BounceHistogram) -> Result<()> {
    let file = File::create("bounce_counts")?;
    let mut writer = BufWriter::new(file);

    let total = histogram.total().max(1) as f64;
    for (label, count) in histogram.snapshot() {
        writeln!(
            writer,
            "{} {} {:.4}",
            label,
            count,
            count as f64 / total
        )?;
    }

    Ok(())
}
