//! Headless streaming demo — walks an observer through a world and logs
//! chunk churn and population statistics.
//!
//! Usage: cargo run --release --bin stream_world -- [OPTIONS]
//!
//! Options:
//!   --seed <SEED>      World seed (default: 12345)
//!   --edge <N>         Chunk edge length (default: 16)
//!   --radius <RD>      Render distance in chunks (default: 4)
//!   --steps <N>        Simulation steps (default: 600)
//!   --speed <UNITS>    Observer speed per step (default: 2.0)
//!   --save <PATH>      Write the world save file on exit
//!   --load <PATH>      Start from an existing save file

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec3;

use veldt::core::config::WorldConfig;
use veldt::core::logging;
use veldt::world::manager::ChunkManager;

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = parse_u64_arg(&args, "--seed").unwrap_or(12345);
    let edge = parse_u32_arg(&args, "--edge").unwrap_or(16);
    let radius = parse_i32_arg(&args, "--radius").unwrap_or(4);
    let steps = parse_u32_arg(&args, "--steps").unwrap_or(600);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(2.0);
    let save_path = parse_str_arg(&args, "--save").map(PathBuf::from);
    let load_path = parse_str_arg(&args, "--load").map(PathBuf::from);

    let mut config = WorldConfig::from_seed(seed);
    config.chunk_edge = edge;
    config.render_distance = radius;

    let mut manager = match load_path {
        Some(path) => match ChunkManager::load_from_path(config, &path) {
            Ok(manager) => {
                log::info!("resumed world from {}", path.display());
                manager
            }
            Err(e) => {
                log::error!("could not load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ChunkManager::new(config),
    };

    log::info!(
        "streaming world: seed={} edge={} radius={} steps={}",
        manager.config().seed,
        edge,
        manager.render_distance(),
        steps
    );

    let start = Instant::now();
    let mut observer = Vec3::ZERO;
    for step in 0..steps {
        // Wander outward on a loose spiral
        let t = step as f32 * 0.01;
        observer += Vec3::new(t.cos() * speed, 0.0, t.sin() * speed);
        manager.update(observer);

        if step % 60 == 0 {
            log::info!(
                "step {:>5}: observer {} | {} chunks loaded | {} objects live | {} records saved",
                step,
                manager.to_chunk_coord(observer),
                manager.loaded_count(),
                manager.arena().live_count(),
                manager.store().len()
            );
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    // Let in-flight generation finish before shutdown accounting
    manager.settle(observer);
    log::info!(
        "walked {} steps in {:.1}s; {} chunks loaded, {} objects live",
        steps,
        start.elapsed().as_secs_f32(),
        manager.loaded_count(),
        manager.arena().live_count()
    );

    manager.unload_all();
    if let Some(path) = save_path {
        match manager.save_to_path(&path) {
            Ok(()) => log::info!("world saved to {}", path.display()),
            Err(e) => log::error!("save failed: {}", e),
        }
    }
}

fn parse_str_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_u64_arg(args: &[String], name: &str) -> Option<u64> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], name: &str) -> Option<u32> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}

fn parse_i32_arg(args: &[String], name: &str) -> Option<i32> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}

fn parse_f32_arg(args: &[String], name: &str) -> Option<f32> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}
