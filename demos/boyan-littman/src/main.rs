//! boyan-littman — Q-routing on the irregular 6×6 grid.
//!
//! Routes corner-to-corner traffic (node 0 → node 35) through a single
//! packet at low load, then three gradual-load scenarios of increasing
//! intensity.  The network keeps learning from one scenario to the next.
//!
//! Set `RUST_LOG=qr_net=debug` to see every decision and Q-value update.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use qr_core::{RoutingConfig, ScenarioConfig};
use qr_net::{RequestGenerator, Topology};
use qr_output::{CsvWriter, DeliveryLogObserver, OutputWriter, export_series};
use qr_sim::SimBuilder;

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:           u64  = 42;
const LEARNING_RATE:  f64  = 0.5;
const SAMPLE_EVERY:   u64  = 10;
const MAX_IDLE_TICKS: u64  = 10_000;
const OUTPUT_DIR:     &str = "output/boyan-littman";

/// (total packets, gap, label)
const GRADUAL_LOADS: [(usize, u64, &str); 3] = [
    (10, 10, "gradual_10pk_gap10"),
    (30, 5,  "gradual_30pk_gap5"),
    (60, 2,  "gradual_60pk_gap2"),
];

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== boyan-littman — Q-routing on the irregular 6×6 grid ===");
    println!("Seed: {SEED}  |  η: {LEARNING_RATE}  |  Sample every: {SAMPLE_EVERY} ticks");
    println!();

    // 1. Build the network.
    let routing = RoutingConfig {
        learning_rate: LEARNING_RATE,
        seed:          SEED,
        ..RoutingConfig::default()
    };
    let topology = Topology::boyan_littman_6x6(routing)?;
    let live = topology.nodes().iter().filter(|n| !n.neighbors().is_empty()).count();
    println!("Network: {} nodes ({} linked)", topology.node_count(), live);

    // 2. Requests always travel from the first corner to the last.
    let requests = RequestGenerator::corner_to_corner(topology.node_count())?;

    // 3. Build sim.
    let mut sim = SimBuilder::new(topology)
        .scenario(ScenarioConfig { sample_every: SAMPLE_EVERY, max_idle_ticks: MAX_IDLE_TICKS })
        .build()?;

    // 4. Set up output.
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut log = DeliveryLogObserver::new(writer);

    // 5. Run scenarios.
    let t0 = Instant::now();
    let first = requests.generate(sim.packet_ids());
    let single = sim.run_single("low_load_single", first, &mut log)?;
    println!("low_load_single      last avg: {:?}", single.last_point);

    for (total, gap, label) in GRADUAL_LOADS {
        let outcome = sim.run_gradual_load(&requests, total, gap, label, &mut log)?;
        println!(
            "{:<20} {} packets in {} ticks",
            label,
            outcome.injected,
            outcome.ticks()
        );
    }
    let elapsed = t0.elapsed();

    if let Some(e) = log.take_error() {
        eprintln!("output error: {e}");
    }

    // 6. Export series.
    let deliveries = log.written();
    let mut writer = log.into_writer();
    let points = export_series(sim.metrics(), &mut writer)?;
    writer.finish()?;

    // 7. Summary.
    println!();
    println!("All scenarios completed in {:.3} s ({} ticks)", elapsed.as_secs_f64(), sim.tick().0);
    println!("  series.csv     : {points} rows");
    println!("  deliveries.csv : {deliveries} rows");
    println!();

    println!("{:<20} {:<8} {:<10}", "Scenario", "Tick", "Avg time");
    println!("{}", "-".repeat(40));
    for series in sim.metrics().all_series() {
        match series.samples.last() {
            Some(p) => println!("{:<20} {:<8} {:<10.3}", series.label, p.tick.0, p.average_delivery_time),
            None => println!("{:<20} {:<8} {:<10}", series.label, "-", "-"),
        }
    }

    // 8. Learned estimates at the origin.
    println!();
    println!("{}", sim.topology().node(requests.origin())?.q_table());

    Ok(())
}
