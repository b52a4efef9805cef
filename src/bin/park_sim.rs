//! Park load simulator
//!
//! Runs many concurrent visitor tasks against an in-process park: each
//! visitor cycles through attractions, checks in, earns points when admitted,
//! and checks out. Optionally declares an incident halfway through. Prints the
//! final attraction statuses and leaderboard.

use clap::Parser;
use park_admission::domain::types::{
    AttractionId, AttractionStatus, CapacityStatus, RankingEntry, VisitorId,
};
use park_admission::infra::{AttractionConfig, Config, Metrics, VisitorConfig};
use park_admission::io::StaticDirectory;
use park_admission::services::Park;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Barrier;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "park-sim", about = "Concurrent admission load simulator")]
struct Args {
    /// Load attractions and visitors from a TOML file instead of generating them
    #[arg(long)]
    config: Option<String>,

    /// Number of generated attractions
    #[arg(long, default_value = "4")]
    attractions: u32,

    /// Capacity of each generated attraction
    #[arg(long, default_value = "25")]
    capacity: u32,

    /// Number of generated visitors
    #[arg(long, default_value = "200")]
    visitors: u64,

    /// Check-in attempts per visitor
    #[arg(long, default_value = "20")]
    rounds: u32,

    /// Points earned per completed ride
    #[arg(long, default_value = "10")]
    points: i64,

    /// Declare an incident at this attraction once half the visitors finished
    #[arg(long)]
    incident: Option<u32>,

    /// Leaderboard rows to print
    #[arg(long, default_value = "10")]
    top: usize,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default)]
struct Tally {
    admitted: AtomicU64,
    rejected_full: AtomicU64,
    rejected_incident: AtomicU64,
}

#[derive(Serialize)]
struct Report {
    elapsed_ms: u128,
    admitted: u64,
    rejected_full: u64,
    rejected_incident: u64,
    statuses: Vec<AttractionStatus>,
    open_incidents: Vec<AttractionId>,
    ranking: Vec<RankingEntry>,
}

fn generated_config(args: &Args) -> Config {
    let attractions = (1..=args.attractions)
        .map(|i| AttractionConfig {
            id: AttractionId(i),
            name: format!("Attraction {i}"),
            max_capacity: args.capacity,
        })
        .collect();
    let visitors = (1..=args.visitors)
        .map(|i| VisitorConfig {
            id: VisitorId(i),
            name: format!("Visitor{i}"),
            surname: "Sim".to_string(),
            email: format!("visitor{i}@sim.park"),
        })
        .collect();
    Config::default().with_attractions(attractions).with_visitors(visitors)
}

/// Number of finished visitors after which the incident is declared
fn incident_trigger_point(visitors: usize) -> u64 {
    (visitors as u64 / 2).max(1)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => generated_config(&args),
    };

    let attraction_ids: Arc<Vec<AttractionId>> =
        Arc::new(config.attractions().iter().map(|a| a.id).collect());
    let visitor_ids: Vec<VisitorId> = config.visitors().iter().map(|v| v.id).collect();
    anyhow::ensure!(!attraction_ids.is_empty(), "no attractions configured");
    anyhow::ensure!(!visitor_ids.is_empty(), "no visitors configured");

    let directory = Arc::new(StaticDirectory::from_configs(config.visitors()));
    let park = Arc::new(Park::new(&config, directory, Arc::new(Metrics::new()))?);
    let tally = Arc::new(Tally::default());
    let finished = Arc::new(AtomicU64::new(0));
    let barrier = Arc::new(Barrier::new(visitor_ids.len()));

    info!(visitors = %visitor_ids.len(), attractions = %attraction_ids.len(), "sim_started");
    let start = Instant::now();

    let mut handles = Vec::with_capacity(visitor_ids.len());
    for (n, visitor_id) in visitor_ids.iter().copied().enumerate() {
        let park = park.clone();
        let tally = tally.clone();
        let finished = finished.clone();
        let barrier = barrier.clone();
        let attraction_ids = attraction_ids.clone();
        let rounds = args.rounds;
        let points = args.points;
        let incident = args.incident.map(AttractionId);
        let half = incident_trigger_point(visitor_ids.len());

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            for round in 0..rounds as usize {
                let attraction_id = attraction_ids[(n + round) % attraction_ids.len()];
                let outcome = park.check_in(attraction_id, visitor_id)?;
                if outcome.admitted {
                    tally.admitted.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                    park.add_points(visitor_id, points)?;
                    park.check_out(attraction_id, visitor_id)?;
                } else if outcome.status == CapacityStatus::ClosedIncident {
                    tally.rejected_incident.fetch_add(1, Ordering::Relaxed);
                } else {
                    tally.rejected_full.fetch_add(1, Ordering::Relaxed);
                }
            }

            if finished.fetch_add(1, Ordering::Relaxed) + 1 == half {
                if let Some(attraction_id) = incident {
                    park.declare_incident(attraction_id)?;
                }
            }
            Ok::<(), park_admission::domain::AdmissionError>(())
        }));
    }

    for handle in handles {
        handle.await??;
    }

    let report = Report {
        elapsed_ms: start.elapsed().as_millis(),
        admitted: tally.admitted.load(Ordering::Relaxed),
        rejected_full: tally.rejected_full.load(Ordering::Relaxed),
        rejected_incident: tally.rejected_incident.load(Ordering::Relaxed),
        statuses: park.statuses(),
        open_incidents: park.open_incidents(),
        ranking: park.get_ranking(Some(args.top)),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "elapsed={}ms admitted={} rejected_full={} rejected_incident={}",
        report.elapsed_ms, report.admitted, report.rejected_full, report.rejected_incident
    );
    if !report.open_incidents.is_empty() {
        let ids: Vec<String> = report.open_incidents.iter().map(|id| id.to_string()).collect();
        println!("open incidents: {}", ids.join(", "));
    }
    println!();
    println!("{:<6} {:<20} {:>9} {:>9}  STATUS", "ID", "NAME", "OCCUPANCY", "CAPACITY");
    for s in &report.statuses {
        println!(
            "{:<6} {:<20} {:>9} {:>9}  {}",
            s.attraction_id.0, s.name, s.occupancy, s.max_capacity, s.status
        );
    }
    println!();
    println!("{:<4} {:<10} {:<24} {:>8}", "POS", "VISITOR", "NAME", "POINTS");
    for entry in &report.ranking {
        let name = entry
            .visitor
            .as_ref()
            .map(|v| format!("{} {}", v.name, v.surname))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<4} {:<10} {:<24} {:>8}", entry.position, entry.visitor_id.0, name, entry.points);
    }

    Ok(())
}
