//! N-vs-N team battles resolved without a wire exchange

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vpet_protocol::hitrate::points_hit_rate;
use vpet_protocol::{Protocol, Side, roll_hit};

use super::targeting::Targeting;
use crate::patterns::{AttackPatterns, PatternTable, tiled};
use crate::types::{AttackLog, BattleResult, Digimon, DigimonStatus, TurnLog, Winner};
use crate::{BattleError, Result};

/// Round ceiling for team battles
pub const MAX_ROUNDS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalBattleConfig {
    /// Player-vs-player: disables the boss rule
    pub pvp_mode: bool,

    /// Break exact hp ties in favour of device2 instead of calling a draw
    pub force_winner: bool,

    /// Cap on pattern damage per hit, applied before the buff
    pub damage_limit: u32,

    /// Protocol whose pattern rows drive team damage
    pub pattern_protocol: Protocol,
}

impl Default for GlobalBattleConfig {
    fn default() -> Self {
        Self {
            pvp_mode: false,
            force_winner: true,
            damage_limit: 99,
            pattern_protocol: Protocol::Dm20Bs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalBattleSimulator<P = PatternTable> {
    config: GlobalBattleConfig,
    patterns: P,
}

impl GlobalBattleSimulator<PatternTable> {
    pub fn new(config: GlobalBattleConfig) -> Self {
        Self {
            config,
            patterns: PatternTable::builtin(),
        }
    }
}

impl Default for GlobalBattleSimulator<PatternTable> {
    fn default() -> Self {
        Self::new(GlobalBattleConfig::default())
    }
}

/// Working copy of one team
struct Squad {
    side: Side,
    members: Vec<Digimon>,
    patterns: Vec<Vec<u32>>,
}

impl Squad {
    fn alive(&self) -> Vec<bool> {
        self.members.iter().map(Digimon::is_alive).collect()
    }

    fn wiped(&self) -> bool {
        !self.members.iter().any(Digimon::is_alive)
    }

    fn total_hp(&self) -> u64 {
        self.members.iter().map(|d| d.hp as u64).sum()
    }

    fn statuses(&self) -> Vec<DigimonStatus> {
        self.members.iter().map(Digimon::status).collect()
    }
}

impl<P: AttackPatterns> GlobalBattleSimulator<P> {
    pub fn with_patterns(config: GlobalBattleConfig, patterns: P) -> Self {
        Self { config, patterns }
    }

    pub fn config(&self) -> &GlobalBattleConfig {
        &self.config
    }

    /// Fight `team1` (device1) against `team2` (device2). The inputs are
    /// copied; hp changes only show up in the result.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        team1: &[Digimon],
        team2: &[Digimon],
        rng: &mut R,
    ) -> Result<BattleResult> {
        if team1.is_empty() {
            return Err(BattleError::EmptyTeam(Side::Device1));
        }
        if team2.is_empty() {
            return Err(BattleError::EmptyTeam(Side::Device2));
        }

        let mut squad1 = self.squad(Side::Device1, team1);
        let mut squad2 = self.squad(Side::Device2, team2);

        let boss = !self.config.pvp_mode && team2.len() == 1 && team1.len() > 1;
        let targeting2 = if boss {
            Targeting::AllAlive
        } else {
            Targeting::SameIndex
        };

        let mut battle_log = Vec::new();
        for round in 0..MAX_ROUNDS {
            let mut attacks = self.phase(round, &squad1, &mut squad2, Targeting::SameIndex, rng);
            attacks.extend(self.phase(round, &squad2, &mut squad1, targeting2, rng));

            let turn = round as u32 + 1;
            tracing::debug!(
                turn,
                device1_hp = squad1.total_hp(),
                device2_hp = squad2.total_hp(),
                "team round"
            );
            battle_log.push(TurnLog {
                turn,
                device1_status: squad1.statuses(),
                device2_status: squad2.statuses(),
                attacks,
            });

            if squad1.wiped() || squad2.wiped() {
                break;
            }
        }

        let winner = self.winner(&squad1, &squad2);
        tracing::debug!(%winner, rounds = battle_log.len(), boss, "team battle resolved");

        Ok(BattleResult {
            winner,
            protocol: None,
            device1_status: squad1.statuses(),
            device2_status: squad2.statuses(),
            battle_log,
            device1_packets: Vec::new(),
            device2_packets: Vec::new(),
        })
    }

    pub fn simulate_seeded(
        &self,
        team1: &[Digimon],
        team2: &[Digimon],
        seed: u64,
    ) -> Result<BattleResult> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.simulate(team1, team2, &mut rng)
    }

    fn squad(&self, side: Side, team: &[Digimon]) -> Squad {
        let patterns = team
            .iter()
            .map(|d| {
                let pattern = self.patterns.attack_pattern(
                    d.level,
                    d.skill_score,
                    self.config.pattern_protocol,
                );
                tiled(&pattern, MAX_ROUNDS)
            })
            .collect();
        Squad {
            side,
            members: team.to_vec(),
            patterns,
        }
    }

    /// Every living member of `attackers` strikes in team order. Damage
    /// lands immediately, so later attackers only see living targets.
    fn phase<R: Rng + ?Sized>(
        &self,
        round: usize,
        attackers: &Squad,
        defenders: &mut Squad,
        targeting: Targeting,
        rng: &mut R,
    ) -> Vec<AttackLog> {
        let mut attacks = Vec::new();

        for (index, attacker) in attackers.members.iter().enumerate() {
            if !attacker.is_alive() {
                continue;
            }
            let targets = targeting.select(index, &defenders.alive(), rng);
            for target in targets {
                let defender = &mut defenders.members[target];
                let hitrate = points_hit_rate(
                    attacker.power,
                    attacker.attribute,
                    defender.power,
                    defender.attribute,
                    attacker.handicap,
                );
                let hit = roll_hit(rng, hitrate);
                let damage = if hit {
                    let base = attackers.patterns[index][round].min(self.config.damage_limit);
                    defender.take_damage(base.saturating_add(attacker.buff))
                } else {
                    0
                };

                attacks.push(AttackLog {
                    turn: round as u32 + 1,
                    device: attackers.side,
                    attacker: index,
                    defender: Some(target),
                    hit,
                    damage,
                });
            }
        }

        attacks
    }

    fn winner(&self, squad1: &Squad, squad2: &Squad) -> Winner {
        match (squad1.wiped(), squad2.wiped()) {
            (false, true) => Winner::Device1,
            (true, false) => Winner::Device2,
            _ => match squad1.total_hp().cmp(&squad2.total_hp()) {
                std::cmp::Ordering::Greater => Winner::Device1,
                std::cmp::Ordering::Less => Winner::Device2,
                std::cmp::Ordering::Equal if self.config.force_winner => Winner::Device2,
                std::cmp::Ordering::Equal => Winner::Draw,
            },
        }
    }
}
