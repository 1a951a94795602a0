//! 1v1 link battles over the wire protocols

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vpet_protocol::codec::PEN20_HP;
use vpet_protocol::{CodecOutcome, HitDodge, PacketCodec, Protocol, ProtocolCodec, Side};

use crate::patterns::{AttackPatterns, PatternTable, tiled};
use crate::types::{AttackLog, BattleResult, Digimon, DigimonStatus, TurnLog, Winner};
use crate::{BattleError, Result};

/// DMC turns on which the winner's attack lands
const DMC_WINNER_HITS: [bool; 5] = [true, false, true, true, true];

/// DMC turns on which the loser's attack lands
const DMC_LOSER_HITS: [bool; 5] = [false, true, false, true, false];

/// DMX bitmaps cover four turns; the fifth turn is a judgement with no attacks
const DMX_ATTACK_TURNS: usize = 4;

/// Runs the packet exchange for a protocol and turns it into a battle log
#[derive(Debug, Clone)]
pub struct BattleSimulator<P = PatternTable> {
    patterns: P,
}

impl BattleSimulator<PatternTable> {
    /// Simulator backed by the built-in pattern table
    pub fn new() -> Self {
        Self {
            patterns: PatternTable::builtin(),
        }
    }
}

impl Default for BattleSimulator<PatternTable> {
    fn default() -> Self {
        Self::new()
    }
}

/// Hit points and per-turn damage of one side during a duel
struct Duelist<'a> {
    digimon: &'a Digimon,
    hp: u32,
    pattern: Vec<u32>,
}

impl Duelist<'_> {
    fn damage_on(&self, turn: usize) -> u32 {
        self.pattern[turn].saturating_add(self.digimon.buff)
    }

    fn status(&self) -> DigimonStatus {
        DigimonStatus::new(self.digimon.name.clone(), self.hp)
    }
}

impl<P: AttackPatterns> BattleSimulator<P> {
    pub fn with_patterns(patterns: P) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &P {
        &self.patterns
    }

    /// Resolve `attacker` (device1) against `defender` (device2)
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        attacker: &Digimon,
        defender: &Digimon,
        protocol: Protocol,
        rng: &mut R,
    ) -> Result<BattleResult> {
        let (device1, device2) = exchange_packets(attacker, defender, protocol, rng)?;
        let outcome1 = device1.compute_result()?;
        // device2's view is checked for consistency even though device1's
        // outcome drives the log
        device2.compute_result()?;

        let mut d1 = self.duelist(attacker, protocol);
        let mut d2 = self.duelist(defender, protocol);

        let (winner, battle_log) = match (protocol, outcome1) {
            (Protocol::DmcBs, CodecOutcome::Verdict { won }) => resolve_dmc(&mut d1, &mut d2, won),
            (_, CodecOutcome::HitMap { own, peer }) => {
                resolve_bitmap(&mut d1, &mut d2, protocol, own, peer)
            }
            (_, CodecOutcome::Verdict { .. }) => {
                return Err(BattleError::UnexpectedOutcome {
                    protocol,
                    found: "verdict",
                });
            }
        };

        tracing::debug!(
            %protocol,
            %winner,
            turns = battle_log.len(),
            device1_hp = d1.hp,
            device2_hp = d2.hp,
            "duel resolved"
        );

        Ok(BattleResult {
            winner,
            protocol: Some(protocol),
            device1_status: vec![d1.status()],
            device2_status: vec![d2.status()],
            battle_log,
            device1_packets: device1.sent_bytes(),
            device2_packets: device2.sent_bytes(),
        })
    }

    /// [`simulate`](Self::simulate) with a ChaCha8 stream seeded from `seed`
    pub fn simulate_seeded(
        &self,
        attacker: &Digimon,
        defender: &Digimon,
        protocol: Protocol,
        seed: u64,
    ) -> Result<BattleResult> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.simulate(attacker, defender, protocol, &mut rng)
    }

    fn duelist<'a>(&self, digimon: &'a Digimon, protocol: Protocol) -> Duelist<'a> {
        let pattern = match protocol {
            Protocol::Dm20Bs => self
                .patterns
                .dm20_attack_pattern(digimon.tag_meter, digimon.skill_score),
            _ => self
                .patterns
                .attack_pattern(digimon.level, digimon.skill_score, protocol),
        };
        let hp = match protocol {
            Protocol::Pen20Bs => PEN20_HP,
            _ => digimon.hp,
        };
        Duelist {
            digimon,
            hp,
            pattern: tiled(&pattern, protocol.turn_limit()),
        }
    }
}

/// Interleave both devices packet by packet, device1 sending first
fn exchange_packets<R: Rng + ?Sized>(
    attacker: &Digimon,
    defender: &Digimon,
    protocol: Protocol,
    rng: &mut R,
) -> Result<(ProtocolCodec, ProtocolCodec)> {
    let mut device1 = ProtocolCodec::new(protocol, attacker.link_profile(), Side::Device1);
    let mut device2 = ProtocolCodec::new(protocol, defender.link_profile(), Side::Device2);

    for step in 0..protocol.packet_count() {
        let packet = device1.generate_packet(step, rng)?;
        device2.consume_packet(&packet.to_bytes())?;
        let packet = device2.generate_packet(step, rng)?;
        device1.consume_packet(&packet.to_bytes())?;
    }

    Ok((device1, device2))
}

/// Single up-front verdict, then fixed hit schedules for five turns. The
/// loser cannot fall before turn 5 and cannot knock the winner out.
fn resolve_dmc(d1: &mut Duelist, d2: &mut Duelist, device1_won: bool) -> (Winner, Vec<TurnLog>) {
    let last_turn = DMC_WINNER_HITS.len() - 1;
    let mut battle_log = Vec::with_capacity(DMC_WINNER_HITS.len());

    for turn in 0..DMC_WINNER_HITS.len() {
        let schedule = |won: bool| {
            if won {
                DMC_WINNER_HITS[turn]
            } else {
                DMC_LOSER_HITS[turn]
            }
        };
        let hit1 = schedule(device1_won);
        let hit2 = schedule(!device1_won);
        let damage1 = if hit1 { d1.damage_on(turn) } else { 0 };
        let damage2 = if hit2 { d2.damage_on(turn) } else { 0 };

        let (dealt1, dealt2) = if device1_won {
            (
                finish_or_spare(&mut d2.hp, damage1, turn == last_turn),
                spare(&mut d1.hp, damage2),
            )
        } else {
            (
                spare(&mut d2.hp, damage1),
                finish_or_spare(&mut d1.hp, damage2, turn == last_turn),
            )
        };

        battle_log.push(duel_turn(turn, d1, d2, [(hit1, dealt1), (hit2, dealt2)]));
    }

    let winner = if device1_won {
        Winner::Device1
    } else {
        Winner::Device2
    };
    (winner, battle_log)
}

/// Damage that never takes the last hit point
fn spare(hp: &mut u32, damage: u32) -> u32 {
    let floor = (*hp).min(1);
    let after = hp.saturating_sub(damage).max(floor);
    let dealt = *hp - after;
    *hp = after;
    dealt
}

/// Damage that only finishes on the final turn. On that turn the loser's
/// remaining hp is removed and reported as the damage dealt, whatever the
/// pattern value.
fn finish_or_spare(hp: &mut u32, damage: u32, last: bool) -> u32 {
    if last {
        let dealt = *hp;
        *hp = 0;
        dealt
    } else {
        spare(hp, damage)
    }
}

/// Bitmap protocols: both sides attack each turn and damage lands at once
fn resolve_bitmap(
    d1: &mut Duelist,
    d2: &mut Duelist,
    protocol: Protocol,
    frame1: HitDodge,
    frame2: HitDodge,
) -> (Winner, Vec<TurnLog>) {
    let mut battle_log = Vec::with_capacity(protocol.turn_limit());

    for turn in 0..protocol.turn_limit() {
        if protocol == Protocol::DmxBs && turn >= DMX_ATTACK_TURNS {
            battle_log.push(duel_turn(turn, d1, d2, []));
            break;
        }

        let hit1 = frame1.hit_on_turn(turn);
        let hit2 = frame2.hit_on_turn(turn);
        let damage1 = if hit1 { d1.damage_on(turn) } else { 0 };
        let damage2 = if hit2 { d2.damage_on(turn) } else { 0 };

        let dealt1 = damage1.min(d2.hp);
        let dealt2 = damage2.min(d1.hp);
        d2.hp -= dealt1;
        d1.hp -= dealt2;

        battle_log.push(duel_turn(turn, d1, d2, [(hit1, dealt1), (hit2, dealt2)]));

        if d1.hp == 0 || d2.hp == 0 {
            break;
        }
    }

    (bitmap_winner(d1.hp, d2.hp, protocol), battle_log)
}

/// Double knockouts go to device1. Survivors compare hp; DMX breaks ties
/// for device1, the other protocols call it a draw.
fn bitmap_winner(hp1: u32, hp2: u32, protocol: Protocol) -> Winner {
    match (hp1 == 0, hp2 == 0) {
        (true, true) => Winner::Device1,
        (true, false) => Winner::Device2,
        (false, true) => Winner::Device1,
        (false, false) => match hp1.cmp(&hp2) {
            std::cmp::Ordering::Greater => Winner::Device1,
            std::cmp::Ordering::Less => Winner::Device2,
            std::cmp::Ordering::Equal if protocol == Protocol::DmxBs => Winner::Device1,
            std::cmp::Ordering::Equal => Winner::Draw,
        },
    }
}

/// Turn log for a duel. `attacks` holds `(hit, damage)` for device1 then
/// device2.
fn duel_turn<const N: usize>(
    turn: usize,
    d1: &Duelist,
    d2: &Duelist,
    attacks: [(bool, u32); N],
) -> TurnLog {
    let turn = turn as u32 + 1;
    let attacks = attacks
        .into_iter()
        .zip([Side::Device1, Side::Device2])
        .map(|((hit, damage), device)| AttackLog {
            turn,
            device,
            attacker: 0,
            defender: Some(0),
            hit,
            damage,
        })
        .collect();

    tracing::debug!(turn, device1_hp = d1.hp, device2_hp = d2.hp, "duel turn");

    TurnLog {
        turn,
        device1_status: vec![d1.status()],
        device2_status: vec![d2.status()],
        attacks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpet_protocol::{Attribute, HitDodge};

    fn agumon() -> Digimon {
        let mut digimon = Digimon::new("Agumon", Attribute::Vaccine, 100, 8);
        digimon.level = 3;
        digimon
    }

    fn elecmon() -> Digimon {
        let mut digimon = Digimon::new("Elecmon", Attribute::Data, 90, 7);
        digimon.level = 3;
        digimon
    }

    #[test]
    fn test_dmc_always_five_turns() {
        let simulator = BattleSimulator::new();
        for seed in 0..20 {
            let result = simulator
                .simulate_seeded(&agumon(), &elecmon(), Protocol::DmcBs, seed)
                .unwrap();
            assert_eq!(result.turns(), 5);
            assert_eq!(result.device1_packets.len(), 4);
            assert_eq!(result.device2_packets.len(), 4);

            let loser = match result.winner {
                Winner::Device1 => Side::Device2,
                Winner::Device2 => Side::Device1,
                Winner::Draw => panic!("DMC never draws"),
            };
            assert_eq!(result.final_status(loser)[0].hp, 0);
            assert!(result.final_status(loser.opposite())[0].alive);
        }
    }

    #[test]
    fn test_dmc_loser_survives_until_last_turn() {
        let simulator = BattleSimulator::new();
        let mut frail = elecmon();
        frail.hp = 1;
        let result = simulator
            .simulate_seeded(&agumon(), &frail, Protocol::DmcBs, 11)
            .unwrap();
        for turn in &result.battle_log[..4] {
            assert!(turn.device1_status[0].alive);
            assert!(turn.device2_status[0].alive);
        }
    }

    #[test]
    fn test_packet_counts_and_turn_limits() {
        let simulator = BattleSimulator::new();
        for protocol in Protocol::ALL {
            for seed in 0..10 {
                let result = simulator
                    .simulate_seeded(&agumon(), &elecmon(), protocol, seed)
                    .unwrap();
                assert_eq!(result.device1_packets.len(), protocol.packet_count());
                assert_eq!(result.device2_packets.len(), protocol.packet_count());
                assert!(result.turns() <= protocol.turn_limit());
                assert_eq!(result.protocol, Some(protocol));
            }
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let simulator = BattleSimulator::new();
        for protocol in Protocol::ALL {
            let a = simulator
                .simulate_seeded(&agumon(), &elecmon(), protocol, 77)
                .unwrap();
            let b = simulator
                .simulate_seeded(&agumon(), &elecmon(), protocol, 77)
                .unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_pen20_fixed_hp() {
        let simulator = BattleSimulator::new();
        let result = simulator
            .simulate_seeded(&agumon(), &elecmon(), Protocol::Pen20Bs, 3)
            .unwrap();
        let first = &result.battle_log[0];
        for (side, status) in [
            (Side::Device1, &first.device1_status[0]),
            (Side::Device2, &first.device2_status[0]),
        ] {
            let taken: u32 = first
                .attacks_from(side.opposite())
                .map(|a| a.damage)
                .sum();
            assert_eq!(status.hp + taken, 3);
        }
    }

    #[test]
    fn test_bitmap_winner_double_knockout() {
        assert_eq!(bitmap_winner(0, 0, Protocol::Dm20Bs), Winner::Device1);
        assert_eq!(bitmap_winner(0, 0, Protocol::Pen20Bs), Winner::Device1);
        assert_eq!(bitmap_winner(0, 2, Protocol::Dm20Bs), Winner::Device2);
        assert_eq!(bitmap_winner(3, 3, Protocol::Dm20Bs), Winner::Draw);
        assert_eq!(bitmap_winner(3, 3, Protocol::DmxBs), Winner::Device1);
        assert_eq!(bitmap_winner(2, 5, Protocol::DmxBs), Winner::Device2);
    }

    #[test]
    fn test_dm20_double_knockout_goes_to_device1() {
        let simulator = BattleSimulator::new();
        let mut a = agumon();
        let mut b = elecmon();
        a.hp = 1;
        b.hp = 1;
        b.power = 100;
        b.attribute = Attribute::Free;

        let mut seen = 0;
        for seed in 0..200 {
            let result = simulator
                .simulate_seeded(&a, &b, Protocol::Dm20Bs, seed)
                .unwrap();
            if result.device1_status[0].hp == 0 && result.device2_status[0].hp == 0 {
                assert_eq!(result.winner, Winner::Device1);
                seen += 1;
            }
        }
        assert!(seen > 0, "expected at least one double knockout");
    }

    #[test]
    fn test_resolve_bitmap_repeats_first_turns() {
        let a = Digimon::new("A", Attribute::Free, 1, 20);
        let b = Digimon::new("B", Attribute::Free, 1, 20);
        let mut d1 = Duelist {
            digimon: &a,
            hp: 20,
            pattern: vec![1; 6],
        };
        let mut d2 = Duelist {
            digimon: &b,
            hp: 20,
            pattern: vec![1; 6],
        };

        let (winner, log) = resolve_bitmap(
            &mut d1,
            &mut d2,
            Protocol::Dm20Bs,
            HitDodge::new(0b1000),
            HitDodge::new(0b0000),
        );

        assert_eq!(log.len(), 6);
        let device1_hits: Vec<bool> = log.iter().map(|t| t.attacks[0].hit).collect();
        assert_eq!(device1_hits, vec![true, false, false, false, true, false]);
        assert_eq!(d2.hp, 18);
        assert_eq!(winner, Winner::Device1);
    }

    #[test]
    fn test_dmx_judgement_turn() {
        let a = Digimon::new("A", Attribute::Free, 1, 20);
        let b = Digimon::new("B", Attribute::Free, 1, 20);
        let mut d1 = Duelist {
            digimon: &a,
            hp: 20,
            pattern: vec![2; 5],
        };
        let mut d2 = Duelist {
            digimon: &b,
            hp: 20,
            pattern: vec![2; 5],
        };

        let (winner, log) = resolve_bitmap(
            &mut d1,
            &mut d2,
            Protocol::DmxBs,
            HitDodge::new(0b0101),
            HitDodge::new(0b0101),
        );

        assert_eq!(log.len(), 5);
        assert!(log[4].attacks.is_empty());
        assert_eq!(d1.hp, 16);
        assert_eq!(d2.hp, 16);
        assert_eq!(winner, Winner::Device1);
    }

    #[test]
    fn test_huge_buff_saturates() {
        let simulator = BattleSimulator::new();
        let mut a = agumon();
        a.buff = u32::MAX;
        let mut b = elecmon();
        b.buff = u32::MAX;

        for protocol in Protocol::ALL {
            let result = simulator.simulate_seeded(&a, &b, protocol, 1).unwrap();
            for turn in &result.battle_log {
                for attack in &turn.attacks {
                    if attack.hit && protocol != Protocol::DmcBs {
                        let start = match (protocol, attack.device) {
                            (Protocol::Pen20Bs, _) => 3,
                            (_, Side::Device1) => b.hp,
                            (_, Side::Device2) => a.hp,
                        };
                        assert_eq!(attack.damage, start);
                    }
                }
            }
        }
    }

    #[test]
    fn test_huge_pattern_row_saturates() {
        let patterns = PatternTable::from_json(
            r#"{"rows": [{"protocol": "DMX_BS", "level": 0, "skill_score": 0, "damage": [4294967295]}]}"#,
        )
        .unwrap();
        let simulator = BattleSimulator::with_patterns(patterns);
        let mut a = agumon();
        a.buff = 3;

        let result = simulator.simulate_seeded(&a, &elecmon(), Protocol::DmxBs, 4).unwrap();
        for attack in result.battle_log.iter().flat_map(|t| &t.attacks) {
            assert!(attack.damage <= 8);
        }
    }

    #[test]
    fn test_spare_keeps_last_hit_point() {
        let mut hp = 5;
        assert_eq!(spare(&mut hp, 3), 3);
        assert_eq!(spare(&mut hp, 9), 1);
        assert_eq!(hp, 1);

        let mut dead = 0;
        assert_eq!(spare(&mut dead, 4), 0);
        assert_eq!(dead, 0);
        assert_eq!(finish_or_spare(&mut hp, 0, true), 1);
        assert_eq!(hp, 0);
    }
}
