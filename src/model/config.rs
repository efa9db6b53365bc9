use crate::model::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    pub initial_plants: usize,
    pub initial_rabbits: usize,
    pub initial_foxes: usize,
    /// Delay inserted before each barrier release, in milliseconds.
    /// 10ms gives the ~100 ticks/second pacing the renderer expects.
    pub tick_interval_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlantConfig {
    pub max_population: usize,
    pub reproduce_rate: f64,
    /// Number of bites a plant survives before it is gone.
    pub food_value: u32,
    pub min_spawn_distance: f64,
    pub max_spawn_distance: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RabbitConfig {
    pub max_population: usize,
    /// Energy gained per successful bite of food.
    pub metabolism: f64,
    /// Upper bound on stored energy.
    pub stomach_capacity: f64,
    pub speed: f64,
    pub reproduce_rate: f64,
    pub reproduce_cutoff: f64,
    pub mutation_rate: f64,
    pub fear_factor: f64,
    pub hunger_factor: f64,
    pub avoid_others_factor: f64,
    pub min_spawn_distance: f64,
    pub max_spawn_distance: f64,
    pub starting_energy: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FoxConfig {
    pub max_population: usize,
    pub metabolism: f64,
    pub stomach_capacity: f64,
    pub speed: f64,
    pub reproduce_rate: f64,
    pub reproduce_cutoff: f64,
    pub hunger_factor: f64,
    pub avoid_others_factor: f64,
    pub min_spawn_distance: f64,
    pub max_spawn_distance: f64,
    pub starting_energy: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub plant: PlantConfig,
    pub rabbit: RabbitConfig,
    pub fox: FoxConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig {
                width: 500.0,
                height: 500.0,
                initial_plants: 200,
                initial_rabbits: 100,
                initial_foxes: 0,
                tick_interval_ms: 10,
            },
            plant: PlantConfig {
                max_population: 500,
                reproduce_rate: 0.1,
                food_value: 1,
                min_spawn_distance: 30.0,
                max_spawn_distance: 6000.0,
            },
            rabbit: RabbitConfig {
                max_population: 150,
                metabolism: 60.0,
                stomach_capacity: 400.0,
                speed: 1.2,
                reproduce_rate: 0.003,
                reproduce_cutoff: 100.0,
                mutation_rate: 0.1,
                fear_factor: 0.75,
                hunger_factor: 1.0,
                avoid_others_factor: 0.1,
                min_spawn_distance: 30.0,
                max_spawn_distance: 50.0,
                starting_energy: 200.0,
            },
            fox: FoxConfig {
                max_population: 50,
                metabolism: 50.0,
                stomach_capacity: 350.0,
                speed: 2.0,
                reproduce_rate: 0.001,
                reproduce_cutoff: 100.0,
                hunger_factor: 1.0,
                avoid_others_factor: 0.3,
                min_spawn_distance: 30.0,
                max_spawn_distance: 50.0,
                starting_energy: 200.0,
            },
        }
    }
}

impl AppConfig {
    /// Checks that the loaded values describe a world that can actually
    /// run. Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        fn ensure(ok: bool, msg: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(SimError::config(msg))
            }
        }

        ensure(self.world.width > 0.0, "world width must be positive")?;
        ensure(self.world.height > 0.0, "world height must be positive")?;
        ensure(
            self.world.initial_plants <= self.plant.max_population,
            "initial plants exceed the plant population cap",
        )?;
        ensure(
            self.world.initial_rabbits <= self.rabbit.max_population,
            "initial rabbits exceed the rabbit population cap",
        )?;
        ensure(
            self.world.initial_foxes <= self.fox.max_population,
            "initial foxes exceed the fox population cap",
        )?;
        // Seeding places each starting creature on its own integer cell.
        let cells = (self.world.width.max(1.0) as usize)
            .saturating_mul(self.world.height.max(1.0) as usize);
        ensure(
            self.world.initial_plants + self.world.initial_rabbits + self.world.initial_foxes
                <= cells,
            "initial population exceeds the number of distinct starting cells",
        )?;
        for (label, rate) in [
            ("plant", self.plant.reproduce_rate),
            ("rabbit", self.rabbit.reproduce_rate),
            ("fox", self.fox.reproduce_rate),
        ] {
            ensure(
                (0.0..=1.0).contains(&rate),
                &format!("{label} reproduce rate must be within [0, 1]"),
            )?;
        }
        for (label, min, max) in [
            (
                "plant",
                self.plant.min_spawn_distance,
                self.plant.max_spawn_distance,
            ),
            (
                "rabbit",
                self.rabbit.min_spawn_distance,
                self.rabbit.max_spawn_distance,
            ),
            (
                "fox",
                self.fox.min_spawn_distance,
                self.fox.max_spawn_distance,
            ),
        ] {
            ensure(
                min >= 0.0 && min <= max,
                &format!("{label} spawn distances must satisfy 0 <= min <= max"),
            )?;
        }
        ensure(self.rabbit.speed >= 0.0, "rabbit speed must be non-negative")?;
        ensure(self.fox.speed >= 0.0, "fox speed must be non-negative")?;
        Ok(())
    }

    /// Parses and validates a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SimError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the config at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Loads the config from the given path, falling back to defaults.
    /// A missing file is created with the default values so the user has
    /// something to edit on the next run.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            return match Self::load(path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Invalid config at {}: {e}. Using defaults.", path.display());
                    Self::default()
                }
            };
        }
        let default = Self::default();
        if let Ok(rendered) = toml::to_string(&default) {
            let _ = fs::write(path, rendered);
        }
        default
    }
}
