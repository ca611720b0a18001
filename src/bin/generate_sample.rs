use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Write synthetic per-subject profile files for trying out `profile-merge`.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", about)]
struct Args {
    /// Output directory (created if missing)
    #[arg(default_value = "sample_profiles")]
    out_dir: PathBuf,

    /// Number of subjects (one file each)
    #[arg(short, long, default_value_t = 6)]
    subjects: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn bump(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    // Rotate export styles so every delimiter and a headerless file show up.
    let delimiters = [b';', b',', b'\t'];
    let step = 5.0;

    for subject in 0..args.subjects {
        let delimiter = delimiters[subject % delimiters.len()];
        let with_header = subject % 4 != 3;
        // Profiles end where the arbor ends, so lengths differ.
        let n_rows = 30 + (rng.next_f64() * 15.0) as usize;
        let peak_at = rng.gauss(60.0, 10.0);
        let peak_height = rng.gauss(12.0, 2.0).max(1.0);

        let ext = if delimiter == b'\t' { "txt" } else { "csv" };
        let path = args.out_dir.join(format!("cell_{:02}.{ext}", subject + 1));
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(&path)
            .with_context(|| format!("creating {}", path.display()))?;

        if with_header {
            writer.write_record(["Radius", "Inters.", "Notes"])?;
        }
        for i in 0..n_rows {
            let radius = i as f64 * step;
            let intersections = (bump(radius, peak_at, 25.0, peak_height) + rng.gauss(0.0, 0.8))
                .round()
                .max(0.0);
            let note = if i == 0 { "soma" } else { "" };
            writer.write_record([radius.to_string(), intersections.to_string(), note.to_string()])?;
        }
        writer.flush()?;
        println!("Wrote {n_rows} rows to {}", path.display());
    }
    Ok(())
}
