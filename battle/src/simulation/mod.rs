//! Battle resolvers
//!
//! - [`BattleSimulator`] runs a 1v1 link battle over one of the four wire
//!   protocols, keeping every packet each device sent.
//! - [`GlobalBattleSimulator`] resolves N-vs-N team battles directly from
//!   stats, without packets.

mod duel;
mod targeting;
mod team;

pub use duel::BattleSimulator;
pub use targeting::Targeting;
pub use team::{GlobalBattleConfig, GlobalBattleSimulator, MAX_ROUNDS};
