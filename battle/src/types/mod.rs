//! Domain types: combatants and battle results

mod digimon;
mod result;
mod wire;

pub use digimon::{Digimon, DigimonStatus};
pub use result::{AttackLog, BattleResult, TurnLog, Winner};
