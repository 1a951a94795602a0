//! DM20_BS codec
//!
//! Every word is `[byte:8][nibble:4][EOL:4]` except the hit/dodge frame.
//!
//! | # | byte | nibble |
//! |---|------|--------|
//! | 1 | index high | order |
//! | 2 | index low | attribute |
//! | 3 | power | stage |
//! | 4 | hp | level |
//! | 5 | handicap | skill score |
//! | 6 | buff | flags (traited, egg shake, sick) |
//! | 7 | shot1 | 0 |
//! | 8 | shot2 | 0 |
//! | 9 | tag meter | 0 |
//! | 10 | peer index low | peer attribute |
//! | 11 | hit/dodge frame | |

use rand::Rng;

use super::{CodecOutcome, Exchange, LinkProfile, PacketCodec, hit_map, roll_hit_frame};
use crate::packet::Packet;
use crate::types::{Attribute, Protocol};
use crate::Result;

const TAG_STEP: usize = 8;
const ACK_STEP: usize = 9;
const HIT_STEP: usize = 10;

/// Packets 1 to 8, shared with PEN20
pub(crate) fn profile_packet(profile: &LinkProfile, step: usize, hp: u32) -> Packet {
    let p = profile;
    match step {
        0 => Packet::data((p.index >> 8) as u32, p.order as u32),
        1 => Packet::data(p.index as u32 & 0xFF, p.attribute.code() as u32),
        2 => Packet::data(p.power, p.stage as u32),
        3 => Packet::data(hp, p.level as u32),
        4 => Packet::data(p.handicap, p.skill_score as u32),
        5 => Packet::data(p.buff, p.flags()),
        6 => Packet::data(p.shot1 as u32, 0),
        _ => Packet::data(p.shot2 as u32, 0),
    }
}

/// Echo the peer's index low byte and attribute from its packet 2
pub(crate) fn ack_packet(exchange: &Exchange, step: usize) -> Result<Packet> {
    exchange.require(step, 2)?;
    let identity = exchange.peer(1)?;
    Ok(Packet::data(identity.high_byte() as u32, identity.nibble(1) as u32))
}

/// Power from packet 3 and attribute from packet 2 of the peer
pub(crate) fn peer_stats(exchange: &Exchange) -> Result<(u32, Attribute)> {
    let identity = exchange.peer(1)?;
    let stats = exchange.peer(2)?;
    Ok((
        stats.high_byte() as u32,
        Attribute::from_code(identity.nibble(1)),
    ))
}

#[derive(Debug, Clone)]
pub struct Dm20Device {
    profile: LinkProfile,
    exchange: Exchange,
}

impl Dm20Device {
    pub fn new(profile: LinkProfile) -> Self {
        Self {
            profile,
            exchange: Exchange::new(Protocol::Dm20Bs),
        }
    }

    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }

    pub fn tag_meter_packet(&self) -> Packet {
        Packet::data(self.profile.tag_meter as u32, 0)
    }

    /// Hit/dodge frame rolled against the peer's stored data packets
    pub fn hit_packet<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Packet> {
        self.exchange.require(HIT_STEP, HIT_STEP)?;
        let (peer_power, peer_attribute) = peer_stats(&self.exchange)?;
        Ok(roll_hit_frame(&self.profile, peer_power, peer_attribute, rng).encode())
    }

    pub fn process_packet(&mut self, bytes: &[u8]) -> Result<()> {
        self.exchange.store_framed(bytes, HIT_STEP)
    }
}

impl PacketCodec for Dm20Device {
    fn protocol(&self) -> Protocol {
        Protocol::Dm20Bs
    }

    fn generate_packet<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Result<Packet> {
        if let Some(sent) = self.exchange.replay_or_next(step)? {
            return Ok(sent);
        }
        let packet = match step {
            TAG_STEP => self.tag_meter_packet(),
            ACK_STEP => ack_packet(&self.exchange, step)?,
            HIT_STEP => self.hit_packet(rng)?,
            _ => profile_packet(&self.profile, step, self.profile.hp),
        };
        Ok(self.exchange.record(step, packet))
    }

    fn consume_packet(&mut self, bytes: &[u8]) -> Result<()> {
        self.process_packet(bytes)
    }

    fn compute_result(&self) -> Result<CodecOutcome> {
        hit_map(&self.exchange, HIT_STEP)
    }

    fn sent(&self) -> &[Packet] {
        self.exchange.sent()
    }
}
