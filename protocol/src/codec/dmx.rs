//! DMX_BS codec
//!
//! | # | Layout |
//! |---|--------|
//! | 1 | `[index:12][EOL]` |
//! | 2 | `[power:8][attribute:4][EOL]` |
//! | 3 | `[hp:8][level:4][EOL]` |
//! | 4 | `[handicap:8][skill:4][EOL]` |
//! | 5 | `[shot1:8][flags:4][EOL]` |
//! | 6 | hit/dodge frame |

use rand::Rng;

use super::{CodecOutcome, Exchange, LinkProfile, PacketCodec, hit_map, roll_hit_frame};
use crate::packet::{EOL, Packet};
use crate::types::{Attribute, Protocol};
use crate::Result;

const HIT_STEP: usize = 5;

#[derive(Debug, Clone)]
pub struct DmxDevice {
    profile: LinkProfile,
    exchange: Exchange,
}

impl DmxDevice {
    pub fn new(profile: LinkProfile) -> Self {
        Self {
            profile,
            exchange: Exchange::new(Protocol::DmxBs),
        }
    }

    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }

    fn profile_packet(&self, step: usize) -> Packet {
        let p = &self.profile;
        match step {
            0 => Packet::from_fields(&[(p.index.min(0xFFF) as u32, 12), (EOL as u32, 4)]),
            1 => Packet::data(p.power, p.attribute.code() as u32),
            2 => Packet::data(p.hp, p.level as u32),
            3 => Packet::data(p.handicap, p.skill_score as u32),
            _ => Packet::data(p.shot1 as u32, p.flags()),
        }
    }

    /// Hit/dodge frame rolled against the power and attribute in the
    /// peer's packet 2
    pub fn hit_packet<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Packet> {
        self.exchange.require(HIT_STEP, HIT_STEP)?;
        let stats = self.exchange.peer(1)?;
        let peer_power = stats.high_byte() as u32;
        let peer_attribute = Attribute::from_code(stats.nibble(1));
        Ok(roll_hit_frame(&self.profile, peer_power, peer_attribute, rng).encode())
    }

    pub fn process_packet(&mut self, bytes: &[u8]) -> Result<()> {
        self.exchange.store_framed(bytes, HIT_STEP)
    }
}

impl PacketCodec for DmxDevice {
    fn protocol(&self) -> Protocol {
        Protocol::DmxBs
    }

    fn generate_packet<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Result<Packet> {
        if let Some(sent) = self.exchange.replay_or_next(step)? {
            return Ok(sent);
        }
        let packet = match step {
            HIT_STEP => self.hit_packet(rng)?,
            _ => self.profile_packet(step),
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
