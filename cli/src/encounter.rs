//! Encounter files read by the CLI

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use vpet_battle::{Digimon, GlobalBattleConfig, PatternTable, Protocol};

/// 1v1 encounter: `{ "protocol": "DMX_BS", "device1": {...}, "device2": {...} }`
#[derive(Debug, Deserialize)]
pub struct DuelEncounter {
    #[serde(default)]
    pub protocol: Option<Protocol>,
    pub device1: Digimon,
    pub device2: Digimon,
}

/// Team encounter: `{ "team1": [...], "team2": [...], "config": {...} }`
#[derive(Debug, Deserialize)]
pub struct TeamEncounter {
    pub team1: Vec<Digimon>,
    pub team2: Vec<Digimon>,
    #[serde(default)]
    pub config: GlobalBattleConfig,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pattern table from `path`, or the built-in one
pub fn load_patterns(path: Option<&Path>) -> Result<PatternTable> {
    match path {
        Some(path) => {
            let table: PatternTable = read_json(path)?;
            if table.is_empty() {
                tracing::warn!(path = %path.display(), "pattern table is empty, every hit deals 1");
            }
            Ok(table)
        }
        None => Ok(PatternTable::builtin()),
    }
}
