//! Attack pattern lookup
//!
//! Pattern data comes from outside the engine. [`AttackPatterns`] is the
//! contract the simulators consume; [`PatternTable`] is a data-driven
//! implementation that can be loaded from JSON or built from the default
//! curve.

use serde::{Deserialize, Serialize};
use vpet_protocol::Protocol;

use crate::Result;

/// Highest skill score the mini-game produces
pub const MAX_SKILL_SCORE: u8 = 3;

/// Pure lookups from combatant stats to per-turn base damage
pub trait AttackPatterns {
    fn attack_pattern(&self, level: u8, skill_score: u8, protocol: Protocol) -> Vec<u32>;

    fn dm20_attack_pattern(&self, tag_meter: u8, skill_score: u8) -> Vec<u32>;
}

impl<T: AttackPatterns + ?Sized> AttackPatterns for &T {
    fn attack_pattern(&self, level: u8, skill_score: u8, protocol: Protocol) -> Vec<u32> {
        (**self).attack_pattern(level, skill_score, protocol)
    }

    fn dm20_attack_pattern(&self, tag_meter: u8, skill_score: u8) -> Vec<u32> {
        (**self).dm20_attack_pattern(tag_meter, skill_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRow {
    pub protocol: Protocol,
    pub level: u8,
    pub skill_score: u8,
    pub damage: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatternRow {
    pub tag_meter: u8,
    pub skill_score: u8,
    pub damage: Vec<u32>,
}

/// Table-backed pattern source. Lookups pick the row with the highest level
/// (or tag meter) not above the request; requests below every row use the
/// lowest one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTable {
    pub rows: Vec<PatternRow>,
    pub tag_rows: Vec<TagPatternRow>,
}

impl PatternTable {
    /// Default curve shipped with the engine
    ///
    /// - PEN20_BS: one damage per hit, six turns
    /// - other protocols: `1 + min(level, 10) / 2`, plus one on the first
    ///   `skill_score` turns
    /// - DM20 tag meter: `1 + min(tag_meter, 4)`, same skill bonus
    pub fn builtin() -> Self {
        let mut rows = Vec::new();
        for protocol in Protocol::ALL {
            for level in 0..=10u8 {
                for skill_score in 0..=MAX_SKILL_SCORE {
                    let damage = if protocol == Protocol::Pen20Bs {
                        vec![1; protocol.turn_limit()]
                    } else {
                        skill_curve(1 + level as u32 / 2, skill_score, protocol.turn_limit())
                    };
                    rows.push(PatternRow {
                        protocol,
                        level,
                        skill_score,
                        damage,
                    });
                }
            }
        }

        let mut tag_rows = Vec::new();
        for tag_meter in 0..=4u8 {
            for skill_score in 0..=MAX_SKILL_SCORE {
                tag_rows.push(TagPatternRow {
                    tag_meter,
                    skill_score,
                    damage: skill_curve(
                        1 + tag_meter as u32,
                        skill_score,
                        Protocol::Dm20Bs.turn_limit(),
                    ),
                });
            }
        }

        Self { rows, tag_rows }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.tag_rows.is_empty()
    }
}

impl AttackPatterns for PatternTable {
    fn attack_pattern(&self, level: u8, skill_score: u8, protocol: Protocol) -> Vec<u32> {
        let skill_score = skill_score.min(MAX_SKILL_SCORE);
        let candidates = self
            .rows
            .iter()
            .filter(|r| r.protocol == protocol && r.skill_score == skill_score);

        nearest_below(candidates, level, |r| r.level)
            .map(|r| r.damage.clone())
            .unwrap_or_else(|| vec![1; protocol.turn_limit()])
    }

    fn dm20_attack_pattern(&self, tag_meter: u8, skill_score: u8) -> Vec<u32> {
        let skill_score = skill_score.min(MAX_SKILL_SCORE);
        let candidates = self
            .tag_rows
            .iter()
            .filter(|r| r.skill_score == skill_score);

        nearest_below(candidates, tag_meter, |r| r.tag_meter)
            .map(|r| r.damage.clone())
            .unwrap_or_else(|| vec![1; Protocol::Dm20Bs.turn_limit()])
    }
}

fn skill_curve(base: u32, skill_score: u8, turns: usize) -> Vec<u32> {
    (0..turns)
        .map(|turn| base + (turn < skill_score as usize) as u32)
        .collect()
}

fn nearest_below<'a, T: 'a>(
    rows: impl Iterator<Item = &'a T> + Clone,
    key: u8,
    key_of: impl Fn(&T) -> u8,
) -> Option<&'a T> {
    rows.clone()
        .filter(|r| key_of(*r) <= key)
        .max_by_key(|r| key_of(*r))
        .or_else(|| rows.min_by_key(|r| key_of(*r)))
}

/// Repeat `pattern` until it covers `len` turns. An empty pattern deals no
/// damage.
pub fn tiled(pattern: &[u32], len: usize) -> Vec<u32> {
    if pattern.is_empty() {
        return vec![0; len];
    }
    pattern.iter().copied().cycle().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lengths_follow_turn_limits() {
        let table = PatternTable::builtin();
        for protocol in Protocol::ALL {
            assert_eq!(
                table.attack_pattern(4, 2, protocol).len(),
                protocol.turn_limit()
            );
        }
        assert_eq!(table.dm20_attack_pattern(2, 0).len(), 6);
    }

    #[test]
    fn test_builtin_pen20_single_damage() {
        let table = PatternTable::builtin();
        assert_eq!(
            table.attack_pattern(10, 3, Protocol::Pen20Bs),
            vec![1, 1, 1, 1, 1, 1]
        );
    }

    #[test]
    fn test_builtin_curve() {
        let table = PatternTable::builtin();
        assert_eq!(
            table.attack_pattern(4, 2, Protocol::DmxBs),
            vec![4, 4, 3, 3, 3]
        );
        assert_eq!(
            table.dm20_attack_pattern(1, 1),
            vec![3, 2, 2, 2, 2, 2]
        );
    }

    #[test]
    fn test_level_above_table_uses_highest_row() {
        let table = PatternTable::builtin();
        assert_eq!(
            table.attack_pattern(200, 0, Protocol::DmcBs),
            table.attack_pattern(10, 0, Protocol::DmcBs)
        );
        assert_eq!(
            table.attack_pattern(4, 9, Protocol::DmcBs),
            table.attack_pattern(4, 3, Protocol::DmcBs)
        );
    }

    #[test]
    fn test_from_json_nearest_below() {
        let table = PatternTable::from_json(
            r#"{
                "rows": [
                    {"protocol": "DMX_BS", "level": 2, "skill_score": 0, "damage": [2, 2, 2, 2, 2]},
                    {"protocol": "DMX_BS", "level": 5, "skill_score": 0, "damage": [5, 5, 5, 5, 5]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(table.attack_pattern(4, 0, Protocol::DmxBs), vec![2; 5]);
        assert_eq!(table.attack_pattern(7, 0, Protocol::DmxBs), vec![5; 5]);
        // below every row
        assert_eq!(table.attack_pattern(0, 0, Protocol::DmxBs), vec![2; 5]);
        // nothing for this protocol
        assert_eq!(table.attack_pattern(3, 0, Protocol::DmcBs), vec![1; 5]);
        assert_eq!(table.dm20_attack_pattern(3, 0), vec![1; 6]);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(PatternTable::from_json("{\"rows\": 3}").is_err());
    }

    #[test]
    fn test_tiled() {
        assert_eq!(tiled(&[1, 2, 3], 7), vec![1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(tiled(&[], 3), vec![0, 0, 0]);
        assert_eq!(tiled(&[4, 5, 6], 2), vec![4, 5]);
    }
}
