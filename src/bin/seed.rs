//! Synthetic measurement seeder.
//!
//! Wipes the measurements table and repopulates it with 30 days of hourly
//! readings ending now:
//! - field1: daily sinusoidal cycle around 22 with mild noise
//! - field2: inverse daily cycle around 55, clamped to [0, 100]
//! - field3: slow upward trend from 410 with wider noise
//!
//! This is an administrative tool, not part of the served API contract.
//! The bulk delete here is the only deletion anywhere in the system.
//!
//! Usage:
//!   cargo run --bin seed
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use chrono::{Duration, Timelike, Utc};
use measurement_service::model::Measurement;
use measurement_service::{db, store};
use rand::Rng;
use std::f64::consts::PI;

const SEED_DAYS: i64 = 30;

/// Mean plus noise averaged from four uniform draws, which pulls the
/// distribution toward the mean without needing a real normal sampler.
fn random_normalish(rng: &mut impl Rng, mean: f64, spread: f64) -> f64 {
    let u: f64 = (0..4).map(|_| rng.gen_range(0.0..1.0)).sum::<f64>() / 4.0;
    mean + (u - 0.5) * 2.0 * spread
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn main() {
    println!("🌱 Seeding measurements...");

    let mut client = match db::connect_and_prepare() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("\n❌ Database setup failed: {}\n", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = client.execute("DELETE FROM measurements", &[]) {
        eprintln!("❌ Failed to clear measurements table: {}", e);
        std::process::exit(1);
    }

    let mut rng = rand::thread_rng();

    // Start 30 days back, aligned to the top of the hour
    let now = Utc::now();
    let start = (now - Duration::days(SEED_DAYS))
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now - Duration::days(SEED_DAYS));

    let hours = SEED_DAYS * 24;
    let mut inserted = 0usize;

    for i in 0..hours {
        let ts = start + Duration::hours(i);

        let daily_cycle = (2.0 * PI * (ts.hour() as f64 / 24.0)).sin();
        let field1 = round1(random_normalish(&mut rng, 22.0 + daily_cycle * 3.0, 1.2));
        let field2 = round1(
            random_normalish(&mut rng, 55.0 - daily_cycle * 8.0, 5.0).clamp(0.0, 100.0),
        );

        let trend = i as f64 / hours as f64;
        let field3 = random_normalish(&mut rng, 410.0 + trend * 15.0, 8.0).round();

        let measurement = Measurement {
            timestamp: ts,
            field1,
            field2,
            field3,
        };

        match store::insert_measurement(&mut client, &measurement) {
            Ok(()) => inserted += 1,
            Err(e) => {
                eprintln!("❌ Insert failed at {}: {}", measurement.timestamp, e);
                std::process::exit(1);
            }
        }
    }

    println!("✓ Seeded {} measurements.", inserted);
}
