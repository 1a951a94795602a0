//! Battle simulation and result model for virtual-pet link battles.
//!
//! # Overview
//!
//! `vpet-battle` sits between `vpet-protocol` (wire format) and the layers
//! that present or transport a finished battle:
//!
//! ```text
//! vpet-protocol (packets, codecs, hit rate)
//!        │
//!        ▼
//! vpet-battle (combatants + simulators + result) ← THIS CRATE
//!        │
//!        ├─> vpet-replay (transport, relabel, playback)
//!        └─> vpet-cli
//! ```
//!
//! # Main Types
//!
//! - [`Digimon`] - combatant input record
//! - [`BattleSimulator`] - 1v1 battle driven by a full packet exchange
//! - [`GlobalBattleSimulator`] - N-vs-N team battle with the boss rule
//! - [`BattleResult`] - winner, final statuses, per-turn log, raw packets
//! - [`AttackPatterns`] / [`PatternTable`] - per-turn damage lookups
//!
//! Every battle is resolved up front; the result is plain data and never
//! changes afterwards.
//!
//! # Example Usage
//!
//! ```ignore
//! use vpet_battle::{Attribute, BattleSimulator, Digimon, Protocol};
//!
//! let agumon = Digimon::new("Agumon", Attribute::Vaccine, 100, 8);
//! let gabumon = Digimon::new("Gabumon", Attribute::Data, 95, 8);
//!
//! let result = BattleSimulator::new().simulate_seeded(&agumon, &gabumon, Protocol::DmxBs, 42)?;
//! println!("{} after {} turns", result.winner, result.turns());
//! ```

use thiserror::Error;
use vpet_protocol::ProtocolError;

pub mod patterns;
pub mod simulation;
pub mod types;

pub use patterns::{AttackPatterns, PatternRow, PatternTable, TagPatternRow};
pub use simulation::{
    BattleSimulator, GlobalBattleConfig, GlobalBattleSimulator, MAX_ROUNDS, Targeting,
};
pub use types::{AttackLog, BattleResult, Digimon, DigimonStatus, TurnLog, Winner};

// Re-export commonly used protocol types
pub use vpet_protocol::{Attribute, Protocol, Side};

#[derive(Error, Debug)]
pub enum BattleError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("{0} has no combatants")]
    EmptyTeam(Side),

    #[error("{protocol} exchange ended with a {found} outcome")]
    UnexpectedOutcome {
        protocol: Protocol,
        found: &'static str,
    },

    #[error("Invalid pattern table: {0}")]
    PatternTable(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
