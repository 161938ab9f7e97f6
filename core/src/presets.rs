//! Difficulty, mission and insect tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MovementClass;

/// Difficulty selected when a run is first built.
pub const DEFAULT_DIFFICULTY: &str = "easy";

/// Mission selected when a run is first built.
pub const DEFAULT_MISSION: &str = "1";

/// Scaling applied to every agent and the starting economy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPreset {
    /// Multiplier on agent hit points.
    pub enemy_hp_multiplier: f32,
    /// Multiplier on agent speed.
    pub enemy_speed_multiplier: f32,
    /// Multiplier on the number of agents per wave.
    pub wave_multiplier: f32,
    /// Scrap granted at the start of the run.
    pub starting_scrap: u32,
    /// Base hit points at the start of the run.
    pub base_hp: u32,
}

/// Length of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissionPreset {
    /// Title shown to the player.
    pub name: String,
    /// One-line briefing.
    pub description: String,
    /// Final wave; `None` for endless missions.
    pub max_waves: Option<u32>,
}

/// Species template agents are drawn from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsectClass {
    /// Species name, e.g. `"beetle"`.
    pub name: String,
    /// Whether the species flies or crawls.
    pub movement: MovementClass,
    /// Multiplier on wave-scaled hit points.
    pub hp_multiplier: f32,
    /// Multiplier on wave-scaled speed.
    pub speed_multiplier: f32,
    /// Base damage dealt on arrival.
    pub damage: u32,
    /// Scrap paid out when killed.
    pub reward: u32,
    /// Multiplier on the base agent radius.
    pub size: f32,
    /// First wave on which the species may spawn.
    pub unlock_wave: u32,
}

impl InsectClass {
    #[allow(clippy::too_many_arguments)]
    fn new(
        name: &str,
        movement: MovementClass,
        hp_multiplier: f32,
        speed_multiplier: f32,
        damage: u32,
        reward: u32,
        size: f32,
        unlock_wave: u32,
    ) -> Self {
        Self {
            name: name.to_owned(),
            movement,
            hp_multiplier,
            speed_multiplier,
            damage,
            reward,
            size,
            unlock_wave,
        }
    }
}

/// Lookup tables for difficulties, missions and insect species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presets {
    /// Difficulty presets keyed by identifier.
    pub difficulties: BTreeMap<String, DifficultyPreset>,
    /// Mission presets keyed by identifier.
    pub missions: BTreeMap<String, MissionPreset>,
    /// Species in spawn-table order.
    pub insects: Vec<InsectClass>,
}

impl Presets {
    /// Difficulty preset registered under `id`.
    #[must_use]
    pub fn difficulty(&self, id: &str) -> Option<&DifficultyPreset> {
        self.difficulties.get(id)
    }

    /// Mission preset registered under `id`.
    #[must_use]
    pub fn mission(&self, id: &str) -> Option<&MissionPreset> {
        self.missions.get(id)
    }

    /// Species that may spawn on `wave`, in table order.
    pub fn unlocked(&self, wave: u32) -> impl Iterator<Item = &InsectClass> + '_ {
        self.insects
            .iter()
            .filter(move |insect| insect.unlock_wave <= wave)
    }
}

impl Default for Presets {
    fn default() -> Self {
        let difficulty = |hp, speed, waves, scrap, base_hp| DifficultyPreset {
            enemy_hp_multiplier: hp,
            enemy_speed_multiplier: speed,
            wave_multiplier: waves,
            starting_scrap: scrap,
            base_hp,
        };
        let mission = |name: &str, description: &str, max_waves| MissionPreset {
            name: name.to_owned(),
            description: description.to_owned(),
            max_waves,
        };

        let difficulties = BTreeMap::from([
            ("easy".to_owned(), difficulty(0.7, 0.8, 0.8, 150, 25)),
            ("normal".to_owned(), difficulty(1.0, 1.0, 1.0, 100, 20)),
            ("hard".to_owned(), difficulty(1.5, 1.3, 1.3, 75, 15)),
        ]);
        let missions = BTreeMap::from([
            (
                "1".to_owned(),
                mission("First Contact", "Survive 10 waves of insects", Some(10)),
            ),
            (
                "2".to_owned(),
                mission("Swarm Rising", "Survive 15 waves of insects", Some(15)),
            ),
            (
                "3".to_owned(),
                mission("Infestation", "Hold out for as long as you can", None),
            ),
        ]);

        use MovementClass::{Crawling, Flying};
        let insects = vec![
            InsectClass::new("ant", Crawling, 0.8, 1.0, 1, 15, 1.0, 1),
            InsectClass::new("beetle", Crawling, 1.5, 0.6, 2, 25, 1.2, 5),
            InsectClass::new("spider", Crawling, 1.0, 1.4, 1, 20, 1.1, 7),
            InsectClass::new("fly", Flying, 0.5, 1.3, 1, 12, 0.9, 10),
            InsectClass::new("wasp", Flying, 0.8, 1.5, 2, 22, 1.0, 12),
            InsectClass::new("moth", Flying, 0.6, 1.1, 1, 15, 1.15, 15),
        ];

        Self {
            difficulties,
            missions,
            insects,
        }
    }
}
