//! Target selection policies for team battles

use rand::Rng;
use rand::seq::SliceRandom;

/// How an attacker picks its defenders among the opposing team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Targeting {
    /// The opponent in the same slot, or a random living opponent once that
    /// slot has fallen
    SameIndex,
    /// One uniformly random living opponent
    RandomAlive,
    /// Every living opponent (boss attacks)
    AllAlive,
}

impl Targeting {
    /// Indices of the defenders to attack. Empty when no opponent is alive.
    pub fn select<R: Rng + ?Sized>(&self, attacker: usize, alive: &[bool], rng: &mut R) -> Vec<usize> {
        match self {
            Targeting::SameIndex => {
                if alive.get(attacker).copied().unwrap_or(false) {
                    vec![attacker]
                } else {
                    Targeting::RandomAlive.select(attacker, alive, rng)
                }
            }
            Targeting::RandomAlive => living(alive).choose(rng).copied().into_iter().collect(),
            Targeting::AllAlive => living(alive),
        }
    }
}

fn living(alive: &[bool]) -> Vec<usize> {
    alive
        .iter()
        .enumerate()
        .filter(|(_, alive)| **alive)
        .map(|(index, _)| index)
        .collect()
}
