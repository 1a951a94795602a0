//! DMC_BS codec
//!
//! | # | Layout |
//! |---|--------|
//! | 1 | `[index:8][attribute:2][stage:3][level:3]` |
//! | 2 | `[power:8][handicap:4][skill:2][sick:1][egg_shake:1]` |
//! | 3 | `[!v:8][v:8]`, `v = [shot1:4][outcome:4]` |
//! | 4 | `[!v:8][v:8]`, `v = [peer_outcome:4][EOL:4]` |
//!
//! Device1 initiates: it rolls the single win/lose outcome from the peer's
//! first two packets. Device2 mirrors the initiator's outcome packet.

use rand::Rng;

use super::{CodecOutcome, Exchange, LinkProfile, PacketCodec};
use crate::hitrate::{points_hit_rate, roll_hit};
use crate::packet::{EOL, Packet, saturate_byte};
use crate::types::{Attribute, Protocol, Side};
use crate::{ProtocolError, Result};

pub const OUTCOME_WIN: u8 = 0x1;
pub const OUTCOME_LOSE: u8 = 0x2;

const OUTCOME_STEP: usize = 2;
const ACK_STEP: usize = 3;

#[derive(Debug, Clone)]
pub struct DmcDevice {
    profile: LinkProfile,
    side: Side,
    exchange: Exchange,
}

impl DmcDevice {
    pub fn new(profile: LinkProfile, side: Side) -> Self {
        Self {
            profile,
            side,
            exchange: Exchange::new(Protocol::DmcBs),
        }
    }

    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }

    pub fn is_initiator(&self) -> bool {
        self.side == Side::Device1
    }

    pub fn generate_packet1(&self) -> Packet {
        let p = &self.profile;
        Packet::from_fields(&[
            (p.index as u32 & 0xFF, 8),
            (p.attribute.code() as u32, 2),
            (p.stage.min(7) as u32, 3),
            (p.level.min(7) as u32, 3),
        ])
    }

    pub fn generate_packet2(&self) -> Packet {
        let p = &self.profile;
        Packet::from_fields(&[
            (saturate_byte(p.power), 8),
            (p.handicap.min(0xF), 4),
            (p.skill_score.min(3) as u32, 2),
            (p.sick as u32, 1),
            (p.egg_shake as u32, 1),
        ])
    }

    /// Outcome packet. The initiator rolls here; the responder mirrors the
    /// initiator's outcome packet.
    pub fn generate_packet3<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Packet> {
        let won = if self.is_initiator() {
            self.exchange.require(OUTCOME_STEP, 2)?;
            let identity = self.exchange.peer(0)?;
            let stats = self.exchange.peer(1)?;

            let peer_attribute = Attribute::from_code(identity.field(6, 2) as u8);
            let peer_power = stats.high_byte() as u32;
            let hitrate = points_hit_rate(
                saturate_byte(self.profile.power),
                self.profile.attribute,
                peer_power,
                peer_attribute,
                self.profile.handicap,
            );
            let won = roll_hit(rng, hitrate);
            tracing::debug!(hitrate, won, "DMC outcome rolled");
            won
        } else {
            self.exchange.require(OUTCOME_STEP, 3)?;
            outcome_code(self.exchange.peer(OUTCOME_STEP)?)? == OUTCOME_LOSE
        };

        let outcome = if won { OUTCOME_WIN } else { OUTCOME_LOSE };
        let value = ((self.profile.shot1 as u8 & 0xF) << 4) | outcome;
        Ok(Packet::complemented(value))
    }

    /// Acknowledge the peer's outcome
    pub fn generate_packet4(&self) -> Result<Packet> {
        self.exchange.require(ACK_STEP, 3)?;
        let peer_outcome = outcome_code(self.exchange.peer(OUTCOME_STEP)?)?;
        Ok(Packet::complemented((peer_outcome << 4) | EOL))
    }

    /// Store a raw peer packet. Outcome and ack packets must carry a valid
    /// complement byte.
    pub fn process_packet(&mut self, bytes: &[u8]) -> Result<()> {
        if self.exchange.received_count() >= OUTCOME_STEP {
            Packet::from_bytes(bytes)?.complemented_value()?;
        }
        self.exchange.store(bytes)
    }
}

/// Low nibble of a complemented outcome packet
fn outcome_code(packet: Packet) -> Result<u8> {
    let code = packet.complemented_value()? & 0xF;
    match code {
        OUTCOME_WIN | OUTCOME_LOSE => Ok(code),
        other => Err(ProtocolError::UnknownOutcome(other)),
    }
}

impl PacketCodec for DmcDevice {
    fn protocol(&self) -> Protocol {
        Protocol::DmcBs
    }

    fn generate_packet<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Result<Packet> {
        if let Some(sent) = self.exchange.replay_or_next(step)? {
            return Ok(sent);
        }
        let packet = match step {
            0 => self.generate_packet1(),
            1 => self.generate_packet2(),
            OUTCOME_STEP => self.generate_packet3(rng)?,
            _ => self.generate_packet4()?,
        };
        Ok(self.exchange.record(step, packet))
    }

    fn consume_packet(&mut self, bytes: &[u8]) -> Result<()> {
        self.process_packet(bytes)
    }

    fn compute_result(&self) -> Result<CodecOutcome> {
        let own = self
            .exchange
            .sent()
            .get(OUTCOME_STEP)
            .copied()
            .ok_or(ProtocolError::ExchangeIncomplete {
                protocol: Protocol::DmcBs,
                sent: self.exchange.sent().len(),
                required: OUTCOME_STEP + 1,
            })?;
        self.exchange.require(OUTCOME_STEP, OUTCOME_STEP + 1)?;

        let own = outcome_code(own)?;
        let peer = outcome_code(self.exchange.peer(OUTCOME_STEP)?)?;
        if own == peer {
            let label = if own == OUTCOME_WIN { "win" } else { "lose" };
            return Err(ProtocolError::OutcomeConflict(label));
        }

        Ok(CodecOutcome::Verdict {
            won: own == OUTCOME_WIN,
        })
    }

    fn sent(&self) -> &[Packet] {
        self.exchange.sent()
    }
}
