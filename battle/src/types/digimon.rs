//! Combatant input record and per-turn status snapshot

use serde::{Deserialize, Serialize};
use vpet_protocol::{Attribute, LinkProfile};

/// One combatant, built fresh by the caller for each encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Digimon {
    pub name: String,

    /// Position within its team
    pub order: usize,

    pub traited: bool,
    pub egg_shake: bool,

    /// Species/sprite id
    pub index: u16,

    pub hp: u32,
    pub attribute: Attribute,
    pub power: u32,

    /// Flat hit-rate penalty
    pub handicap: u32,

    /// Flat damage bonus on every hit
    pub buff: u32,

    /// Skill mini-game result (0-3)
    pub skill_score: u8,

    pub level: u8,

    /// Evolutionary stage
    pub stage: u8,

    pub sick: bool,

    /// Primary and alternate attack ids (sprite selection)
    pub shot1: u16,
    pub shot2: u16,

    /// DM20 family only
    pub tag_meter: u8,
}

impl Digimon {
    pub fn new(name: impl Into<String>, attribute: Attribute, power: u32, hp: u32) -> Self {
        Self {
            name: name.into(),
            attribute,
            power,
            hp,
            ..Self::default()
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Remove up to `damage` hp, returning what was actually removed
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        let dealt = damage.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    pub fn status(&self) -> DigimonStatus {
        DigimonStatus::new(self.name.clone(), self.hp)
    }

    /// Fields this combatant's device puts on the wire
    pub fn link_profile(&self) -> LinkProfile {
        LinkProfile {
            index: self.index,
            order: self.order.min(u8::MAX as usize) as u8,
            attribute: self.attribute,
            power: self.power,
            hp: self.hp,
            level: self.level,
            stage: self.stage,
            handicap: self.handicap,
            buff: self.buff,
            skill_score: self.skill_score,
            traited: self.traited,
            egg_shake: self.egg_shake,
            sick: self.sick,
            shot1: self.shot1,
            shot2: self.shot2,
            tag_meter: self.tag_meter,
        }
    }
}

impl Default for Digimon {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            order: 0,
            traited: false,
            egg_shake: false,
            index: 0,
            hp: 1,
            attribute: Attribute::Free,
            power: 0,
            handicap: 0,
            buff: 0,
            skill_score: 0,
            level: 0,
            stage: 0,
            sick: false,
            shot1: 0,
            shot2: 0,
            tag_meter: 0,
        }
    }
}

impl From<&Digimon> for LinkProfile {
    fn from(digimon: &Digimon) -> Self {
        digimon.link_profile()
    }
}

/// Snapshot of one combatant after a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigimonStatus {
    pub name: String,
    pub hp: u32,
    pub alive: bool,
}

impl DigimonStatus {
    pub fn new(name: impl Into<String>, hp: u32) -> Self {
        Self {
            name: name.into(),
            hp,
            alive: hp > 0,
        }
    }
}
