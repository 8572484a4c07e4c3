//! Writes a demo dataset: hourly readings from a few sensors, a daily sine
//! cycle with noise, and a handful of injected spikes and drops.
//!
//! Usage: `generate_sample [OUTPUT]` (default `sample_data.parquet`;
//! a `.csv` extension writes CSV instead).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const POINTS_PER_SENSOR: usize = 24 * 14;

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

struct Rows {
    timestamp: Vec<String>,
    value: Vec<f64>,
    sensor: Vec<String>,
    point_id: Vec<i64>,
}

/// (sensor, baseline, daily amplitude, noise, injected (hour, offset) pairs)
type SensorProfile = (&'static str, f64, f64, f64, &'static [(usize, f64)]);

const SENSORS: [SensorProfile; 3] = [
    ("server_logs", 20.0, 10.0, 1.0, &[(30, 45.0), (200, -40.0)]),
    ("network_traffic", 120.0, 35.0, 4.0, &[(90, 180.0)]),
    ("cpu_usage", 45.0, 15.0, 2.0, &[(150, 70.0), (151, 65.0), (300, -50.0)]),
];

fn generate(rng: &mut SimpleRng) -> Result<Rows> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    let mut rows = Rows {
        timestamp: Vec::new(),
        value: Vec::new(),
        sensor: Vec::new(),
        point_id: Vec::new(),
    };

    let mut point_id: i64 = 0;
    for &(name, base, amplitude, noise, spikes) in &SENSORS {
        for hour in 0..POINTS_PER_SENSOR {
            let phase = 2.0 * std::f64::consts::PI * (hour % 24) as f64 / 24.0;
            let mut value = base + amplitude * phase.sin() + rng.gauss(0.0, noise);
            if let Some(&(_, offset)) = spikes.iter().find(|(h, _)| *h == hour) {
                value += offset;
            }

            let ts = start + Duration::hours(hour as i64);
            rows.timestamp.push(ts.format("%Y-%m-%dT%H:%M:%S").to_string());
            rows.value.push(value);
            rows.sensor.push(name.to_string());
            rows.point_id.push(point_id);
            point_id += 1;
        }
    }
    Ok(rows)
}

fn write_parquet(path: &Path, rows: &Rows) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
        Field::new("sensor", DataType::Utf8, false),
        Field::new("point_id", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.timestamp.clone())),
            Arc::new(Float64Array::from(rows.value.clone())),
            Arc::new(StringArray::from(rows.sensor.clone())),
            Arc::new(Int64Array::from(rows.point_id.clone())),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).context("Failed to create output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn write_csv(path: &Path, rows: &Rows) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("Failed to create output file")?;
    writer.write_record(["timestamp", "value", "sensor", "point_id"])?;
    for i in 0..rows.value.len() {
        writer.write_record([
            rows.timestamp[i].clone(),
            format!("{:.4}", rows.value[i]),
            rows.sensor[i].clone(),
            rows.point_id[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data.parquet".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng)?;

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_csv(path, &rows)?;
    } else {
        write_parquet(path, &rows)?;
    }

    log::info!("sensors: {}", SENSORS.map(|s| s.0).join(", "));
    println!(
        "Wrote {} points ({} sensors × {POINTS_PER_SENSOR} hours) to {output}",
        rows.value.len(),
        SENSORS.len()
    );
    Ok(())
}
