//! Sample Table Generator
//!
//! Writes a rectangular comma-separated table of byte values for the
//! inspector's table source. Background values are drawn uniformly from a
//! low band; with `--defect-rate` a fraction of rows carries a short burst
//! of high values that the filter should flag.
//!
//! # Usage
//! ```bash
//! ./table-gen --rows 200 --columns 8 --seed 7 --defect-rate 0.05 > rows.csv
//! ./sample-inspector --table rows.csv --columns 8 --threshold 128
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

// ============================================================================
// Value Bands
// ============================================================================

/// Background sample range (inclusive)
const BACKGROUND_MIN: u8 = 0;
const BACKGROUND_MAX: u8 = 96;
/// Defect burst range (inclusive)
const DEFECT_MIN: u8 = 200;
const DEFECT_MAX: u8 = 255;
/// Consecutive high samples per burst; wide enough to lift the window mean
const BURST_LENGTH: usize = 5;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "table-gen")]
#[command(about = "Generate comma-separated sample tables for the inspector")]
#[command(version)]
struct Args {
    /// Number of rows
    #[arg(short, long, default_value = "100")]
    rows: usize,

    /// Values per row (m)
    #[arg(short, long, default_value = "8", value_parser = clap::value_parser!(u64).range(1..=4096))]
    columns: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of rows (0.0-1.0) that carry a high-value burst
    #[arg(long, default_value = "0.0")]
    defect_rate: f64,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

// ============================================================================
// Generation
// ============================================================================

struct TableGenerator {
    rng: StdRng,
    columns: usize,
    defect_rate: f64,
    bursts: u64,
}

impl TableGenerator {
    fn new(seed: Option<u64>, columns: usize, defect_rate: f64) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            columns,
            defect_rate: defect_rate.clamp(0.0, 1.0),
            bursts: 0,
        }
    }

    fn row(&mut self) -> Vec<u8> {
        let mut row: Vec<u8> = (0..self.columns)
            .map(|_| self.rng.gen_range(BACKGROUND_MIN..=BACKGROUND_MAX))
            .collect();

        if self.defect_rate > 0.0 && self.rng.gen_bool(self.defect_rate) {
            let len = BURST_LENGTH.min(self.columns);
            let start = self.rng.gen_range(0..=self.columns - len);
            for v in &mut row[start..start + len] {
                *v = self.rng.gen_range(DEFECT_MIN..=DEFECT_MAX);
            }
            self.bursts += 1;
        }
        row
    }

    fn write_table<W: Write>(&mut self, out: &mut W, rows: usize) -> io::Result<()> {
        for _ in 0..rows {
            let line = self
                .row()
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",");
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let columns = usize::try_from(args.columns).context("Column count does not fit in memory")?;
    let mut generator = TableGenerator::new(args.seed, columns, args.defect_rate);

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            generator
                .write_table(&mut BufWriter::new(file), args.rows)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} rows x {} columns to {} ({} defect bursts)",
                args.rows,
                columns,
                path.display(),
                generator.bursts
            );
        }
        None => {
            let stdout = io::stdout();
            generator
                .write_table(&mut BufWriter::new(stdout.lock()), args.rows)
                .context("Failed to write table to stdout")?;
        }
    }

    Ok(())
}
