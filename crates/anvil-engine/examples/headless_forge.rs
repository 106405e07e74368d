//! Headless forge demo.
//!
//! Builds a small forge, lets the ore spawner run for a few simulated
//! minutes while a scripted "player" shoves ore and bars around, records
//! the run and replays it to check determinism.
//!
//! Run with: `RUST_LOG=info cargo run --example headless_forge`

use anvil_engine::prelude::*;

const FRAME_MS: f64 = 1000.0 / 60.0;
const FRAMES: u64 = 60 * 180;

/// Pick this frame's intents: every second, push each ore toward the
/// furnace column and each bar toward the anvil column.
fn script(sim: &Simulation, furnace_x: i32, anvil_x: i32) -> Vec<Intent> {
    if sim.frame() % 60 != 0 {
        return Vec::new();
    }
    sim.grid()
        .objects()
        .filter_map(|object| {
            let material = object.as_material()?;
            let target_x = if material.component == catalog::ORE {
                furnace_x
            } else if material.component == catalog::BAR {
                anvil_x
            } else {
                return None;
            };
            let direction = match object.x().cmp(&target_x) {
                std::cmp::Ordering::Less => Direction::East,
                std::cmp::Ordering::Greater => Direction::West,
                std::cmp::Ordering::Equal => Direction::South,
            };
            Some(Intent::Slide {
                object: object.id(),
                direction,
            })
        })
        .collect()
}

fn build(config: SimConfig) -> Result<Simulation, anyhow::Error> {
    let mut sim = Simulation::try_new(config)?;
    sim.purchase(ShopItem::Furnace, 2, 6)
        .ok_or_else(|| anyhow::anyhow!("could not place the furnace"))?;
    sim.purchase(ShopItem::Anvil, 5, 6)
        .ok_or_else(|| anyhow::anyhow!("could not place the anvil"))?;
    sim.purchase(ShopItem::Mule, 7, 7)
        .ok_or_else(|| anyhow::anyhow!("could not place the mule"))?;
    sim.purchase(ShopItem::Warrior, 4, 3)
        .ok_or_else(|| anyhow::anyhow!("could not place the warrior"))?;
    sim.start_spawner();
    Ok(sim)
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = SimConfig {
        columns: 8,
        rows: 8,
        spawn_interval_ms: 2_000.0,
        starting_coins: 80,
        raid_threshold: 150,
        ..Default::default()
    };

    let mut sim = build(config.clone())?;
    let mut recorder = ReplayRecorder::new(&sim, 600);

    let mut crafts = 0;
    let mut sales = 0;
    for _ in 0..FRAMES {
        let intents = script(&sim, 2, 5);
        recorder.record_frame(sim.frame(), FRAME_MS, &intents, Some(sim.state_hash()));
        for &intent in &intents {
            sim.apply_intent(intent);
        }
        sim.update(FRAME_MS);

        for entry in sim.journal_mut().drain() {
            match entry.event {
                SimEvent::Crafted { .. } => crafts += 1,
                SimEvent::Sold { .. } => sales += 1,
                _ => {}
            }
        }
    }

    println!("frames:   {}", sim.frame());
    println!("objects:  {}", sim.grid().object_count());
    println!("crafts:   {crafts}");
    println!("sales:    {sales}");
    println!("coins:    {}", sim.economy().coins);
    println!("swords:   {}", sim.economy().swords);
    println!("raid:     {:?}", sim.raid());

    let log = recorder.finish();
    let mut again = build(log.config.clone())?;
    let result = replay(&mut again, &log)?;
    anyhow::ensure!(
        result.completed,
        "replay diverged: {:?}",
        result.first_divergence
    );
    anyhow::ensure!(again.state_hash() == sim.state_hash(), "final states differ");
    println!("replay:   {} frames, deterministic", result.frames_replayed);

    Ok(())
}
