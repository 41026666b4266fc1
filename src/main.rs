//! Measurement API Service - Main Entry Point
//!
//! A small HTTP service that:
//! 1. Ingests timestamped readings (three numeric series per sample)
//! 2. Serves paginated range queries over a single series
//! 3. Serves aggregate statistics (avg/min/max/stdDev/count)
//!
//! Usage:
//!   cargo run --release                 # Listen on PORT (default 3000)
//!   cargo run --release -- --port 8080  # Override the listen port
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string
//!   PORT         - Listen port (default 3000)
//!   WORKERS      - Request worker threads (default 4)

use measurement_service::config::ServiceConfig;
use measurement_service::{db, endpoint};
use std::env;

fn main() {
    println!("📊 Measurement API Service");
    println!("===========================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                if i + 1 < args.len() {
                    port_override = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = ServiceConfig::load();
    if let Some(port) = port_override {
        config.port = port;
    }

    // Validate database connectivity and create the schema up front so a
    // misconfigured service fails here, not on the first request
    println!("🗄  Preparing database...");
    match db::connect_and_prepare() {
        Ok(_) => println!("✓ Database ready\n"),
        Err(e) => {
            eprintln!("\n❌ Database setup failed: {}\n", e);
            std::process::exit(1);
        }
    }

    println!("🚀 Starting HTTP endpoint with {} workers...", config.workers);
    if let Err(e) = endpoint::start_endpoint_server(config.port, config.workers) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
