use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use serde::Serialize;

#[derive(Parser)]
#[command(about = "Write a deterministic sample sales CSV")]
struct Args {
    #[arg(long, default_value = "data/base.csv")]
    out: PathBuf,
    #[arg(long, default_value_t = 300)]
    rows: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Every n-th row gets an unparseable date or revenue cell
    #[arg(long, default_value_t = 97)]
    corrupt_every: usize,
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "order-no")]
    order_no: String,
    #[serde(rename = "order-date")]
    order_date: String,
    category: &'static str,
    sku: String,
    #[serde(rename = "cust-zone")]
    cust_zone: &'static str,
    platform: &'static str,
    qty: u32,
    revenue: String,
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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }
}

/// (category, base unit price)
const CATEGORIES: [(&str, f64); 5] = [
    ("Electronics", 240.0),
    ("Apparel", 35.0),
    ("Home", 60.0),
    ("Beauty", 18.0),
    ("Toys", 25.0),
];
const ZONES: [&str; 4] = ["North", "South", "East", "West"];
const PLATFORMS: [&str; 3] = ["Web", "App", "Marketplace"];

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    if let Some(dir) = args.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut writer = csv::Writer::from_path(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let mut order_no = 100_000u64;
    for i in 0..args.rows {
        // Roughly one order in four carries a second line.
        if i == 0 || rng.next_f64() > 0.25 {
            order_no += 1;
        }
        let (category, base_price) = *rng.pick(&CATEGORIES);
        let qty = 1 + rng.below(4) as u32;
        let price = base_price * (0.7 + 0.6 * rng.next_f64());
        let date = first_day + Duration::days(rng.below(90) as i64);

        let corrupt = args.corrupt_every > 0 && i % args.corrupt_every == args.corrupt_every - 1;
        let (order_date, revenue) = match (corrupt, i % 2) {
            (true, 0) => ("not-a-date".to_string(), format!("{:.2}", price * qty as f64)),
            (true, _) => (date.to_string(), "n/a".to_string()),
            (false, _) => (date.to_string(), format!("{:.2}", price * qty as f64)),
        };

        writer
            .serialize(Row {
                order_no: order_no.to_string(),
                order_date,
                category,
                sku: format!("{}-{:03}", &category[..3].to_uppercase(), rng.below(40)),
                cust_zone: *rng.pick(&ZONES),
                platform: *rng.pick(&PLATFORMS),
                qty,
                revenue,
            })
            .context("writing row")?;
    }
    writer.flush().context("flushing CSV")?;

    println!("Wrote {} sales rows to {}", args.rows, args.out.display());
    Ok(())
}
