//! Battle output consumed by presentation and transport layers

use serde::{Deserialize, Serialize};
use vpet_protocol::{Protocol, Side};

use super::digimon::DigimonStatus;
use super::wire::{defender_index, hex_packets};

/// Who won the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Device1,
    Device2,
    Draw,
}

impl Winner {
    pub fn side(&self) -> Option<Side> {
        match self {
            Winner::Device1 => Some(Side::Device1),
            Winner::Device2 => Some(Side::Device2),
            Winner::Draw => None,
        }
    }

    pub fn mirrored(&self) -> Winner {
        match self {
            Winner::Device1 => Winner::Device2,
            Winner::Device2 => Winner::Device1,
            Winner::Draw => Winner::Draw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Device1 => "device1",
            Winner::Device2 => "device2",
            Winner::Draw => "draw",
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Device1 => Winner::Device1,
            Side::Device2 => Winner::Device2,
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single attack within a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackLog {
    pub turn: u32,

    /// Side the attack came from
    pub device: Side,

    /// Attacker's index within its team
    pub attacker: usize,

    /// Defender's index within the opposing team, -1 on the wire when absent
    #[serde(with = "defender_index")]
    pub defender: Option<usize>,

    pub hit: bool,

    /// Hit points actually removed
    pub damage: u32,
}

impl AttackLog {
    pub fn mirrored(&self) -> AttackLog {
        AttackLog {
            device: self.device.opposite(),
            ..self.clone()
        }
    }
}

/// Status of both sides after a turn, and the attacks that led there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLog {
    pub turn: u32,
    pub device1_status: Vec<DigimonStatus>,
    pub device2_status: Vec<DigimonStatus>,
    pub attacks: Vec<AttackLog>,
}

impl TurnLog {
    pub fn status(&self, side: Side) -> &[DigimonStatus] {
        match side {
            Side::Device1 => &self.device1_status,
            Side::Device2 => &self.device2_status,
        }
    }

    pub fn attacks_from(&self, side: Side) -> impl Iterator<Item = &AttackLog> {
        self.attacks.iter().filter(move |a| a.device == side)
    }

    pub fn mirrored(&self) -> TurnLog {
        TurnLog {
            turn: self.turn,
            device1_status: self.device2_status.clone(),
            device2_status: self.device1_status.clone(),
            attacks: self.attacks.iter().map(AttackLog::mirrored).collect(),
        }
    }
}

/// Outcome of one `simulate()` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    pub winner: Winner,

    /// Link protocol for duels, `None` for team battles
    pub protocol: Option<Protocol>,

    pub device1_status: Vec<DigimonStatus>,
    pub device2_status: Vec<DigimonStatus>,

    pub battle_log: Vec<TurnLog>,

    /// Raw packets each device sent, in order (duels only)
    #[serde(with = "hex_packets")]
    pub device1_packets: Vec<Vec<u8>>,
    #[serde(with = "hex_packets")]
    pub device2_packets: Vec<Vec<u8>>,
}

impl BattleResult {
    pub fn turns(&self) -> usize {
        self.battle_log.len()
    }

    pub fn is_draw(&self) -> bool {
        self.winner == Winner::Draw
    }

    pub fn final_status(&self, side: Side) -> &[DigimonStatus] {
        match side {
            Side::Device1 => &self.device1_status,
            Side::Device2 => &self.device2_status,
        }
    }

    pub fn packets(&self, side: Side) -> &[Vec<u8>] {
        match side {
            Side::Device1 => &self.device1_packets,
            Side::Device2 => &self.device2_packets,
        }
    }

    /// The same battle seen from the other device: every device1/device2
    /// reference is swapped
    pub fn mirrored(&self) -> BattleResult {
        BattleResult {
            winner: self.winner.mirrored(),
            protocol: self.protocol,
            device1_status: self.device2_status.clone(),
            device2_status: self.device1_status.clone(),
            battle_log: self.battle_log.iter().map(TurnLog::mirrored).collect(),
            device1_packets: self.device2_packets.clone(),
            device2_packets: self.device1_packets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BattleResult {
        BattleResult {
            winner: Winner::Device1,
            protocol: Some(Protocol::DmxBs),
            device1_status: vec![DigimonStatus::new("Agumon", 3)],
            device2_status: vec![DigimonStatus::new("Betamon", 0)],
            battle_log: vec![TurnLog {
                turn: 1,
                device1_status: vec![DigimonStatus::new("Agumon", 3)],
                device2_status: vec![DigimonStatus::new("Betamon", 0)],
                attacks: vec![
                    AttackLog {
                        turn: 1,
                        device: Side::Device1,
                        attacker: 0,
                        defender: Some(0),
                        hit: true,
                        damage: 2,
                    },
                    AttackLog {
                        turn: 1,
                        device: Side::Device2,
                        attacker: 0,
                        defender: None,
                        hit: false,
                        damage: 0,
                    },
                ],
            }],
            device1_packets: vec![vec![0xAB, 0xCE]],
            device2_packets: vec![vec![0x00, 0x1E]],
        }
    }

    #[test]
    fn test_winner_mirrored() {
        assert_eq!(Winner::Device1.mirrored(), Winner::Device2);
        assert_eq!(Winner::Draw.mirrored(), Winner::Draw);
        assert_eq!(Winner::from(Side::Device2).side(), Some(Side::Device2));
    }

    #[test]
    fn test_mirrored_swaps_everything() {
        let result = sample();
        let mirrored = result.mirrored();

        assert_eq!(mirrored.winner, Winner::Device2);
        assert_eq!(mirrored.device1_status[0].name, "Betamon");
        assert_eq!(mirrored.battle_log[0].device2_status[0].name, "Agumon");
        assert_eq!(mirrored.battle_log[0].attacks[0].device, Side::Device2);
        assert_eq!(mirrored.device1_packets, vec![vec![0x00, 0x1E]]);
        assert_eq!(mirrored.mirrored(), result);
    }

    #[test]
    fn test_serialized_form() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["winner"], "device1");
        assert_eq!(value["protocol"], "DMX_BS");
        assert_eq!(value["device1_packets"][0], "abce");
        assert_eq!(value["battle_log"][0]["attacks"][0]["device"], "device1");
        assert_eq!(value["battle_log"][0]["attacks"][1]["defender"], -1);
    }

    #[test]
    fn test_serde_round_trip() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        let decoded: BattleResult = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_attacks_from_side() {
        let result = sample();
        let turn = &result.battle_log[0];
        assert_eq!(turn.attacks_from(Side::Device2).count(), 1);
        assert_eq!(turn.status(Side::Device2)[0].hp, 0);
    }
}
