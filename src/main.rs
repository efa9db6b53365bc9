use anyhow::Result;
use clap::Parser;
use meadow::model::config::AppConfig;
use meadow::model::events::EventSink;
use meadow::model::world::World;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Foxes, rabbits & plants simulation", long_about = None)]
struct Args {
    /// Number of plants at the start of the simulation
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=400))]
    plants: Option<u16>,

    /// Number of rabbits at the start of the simulation
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=300))]
    rabbits: Option<u16>,

    /// Number of foxes at the start of the simulation
    #[arg(long, value_parser = clap::value_parser!(u16).range(0..=300))]
    foxes: Option<u16>,

    /// Width of the world
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=1500))]
    width: Option<u16>,

    /// Height of the world
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    height: Option<u16>,

    /// Stop after this many ticks
    #[arg(long, default_value_t = 10_000)]
    ticks: u64,

    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load_or_init(&args.config);
    if let Some(n) = args.plants {
        config.world.initial_plants = n as usize;
    }
    if let Some(n) = args.rabbits {
        config.world.initial_rabbits = n as usize;
    }
    if let Some(n) = args.foxes {
        config.world.initial_foxes = n as usize;
    }
    if let Some(w) = args.width {
        config.world.width = w as f64;
    }
    if let Some(h) = args.height {
        config.world.height = h as f64;
    }
    config.validate()?;

    let (events, event_rx) = EventSink::channel();
    let world = World::new(config, events);

    // Telemetry is off the tick path; drain it on its own thread.
    let telemetry = std::thread::spawn(move || {
        let mut counts = std::collections::HashMap::new();
        for event in event_rx {
            *counts.entry(event.kind).or_insert(0u64) += 1;
        }
        counts
    });

    // Periodic stat display on its own cadence, independent of tick rate.
    {
        let world = std::sync::Arc::clone(&world);
        std::thread::spawn(move || {
            while !world.is_shutdown() {
                let stats = world.stats();
                tracing::info!(
                    tick = stats.tick,
                    plants = stats.plants,
                    rabbits = stats.rabbits,
                    foxes = stats.foxes,
                    avg_rabbit_energy = format!("{:.1}", stats.avg_rabbit_energy),
                    "population"
                );
                std::thread::sleep(std::time::Duration::from_secs(1));
            }
        });
    }

    world.seed();
    world.run_until(args.ticks);

    let final_stats = world.stats();
    tracing::info!(
        tick = final_stats.tick,
        plants = final_stats.plants,
        rabbits = final_stats.rabbits,
        foxes = final_stats.foxes,
        "simulation completed"
    );

    drop(world);
    if let Ok(counts) = telemetry.join() {
        for (kind, count) in counts {
            tracing::info!(?kind, count, "lifetime events");
        }
    }

    Ok(())
}
