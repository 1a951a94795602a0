//! PEN20_BS codec
//!
//! Same words as DM20_BS packets 1 to 8 with the hp byte fixed at 3,
//! followed by the acknowledgement and the hit/dodge frame. There is no
//! tag meter packet.

use rand::Rng;

use super::dm20::{ack_packet, peer_stats, profile_packet};
use super::{CodecOutcome, Exchange, LinkProfile, PacketCodec, hit_map, roll_hit_frame};
use crate::packet::Packet;
use crate::types::Protocol;
use crate::Result;

/// Every PEN20 combatant enters with this many hit points
pub const PEN20_HP: u32 = 3;

const ACK_STEP: usize = 8;
const HIT_STEP: usize = 9;

#[derive(Debug, Clone)]
pub struct Pen20Device {
    profile: LinkProfile,
    exchange: Exchange,
}

impl Pen20Device {
    pub fn new(profile: LinkProfile) -> Self {
        Self {
            profile,
            exchange: Exchange::new(Protocol::Pen20Bs),
        }
    }

    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }

    pub fn hit_packet<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Packet> {
        self.exchange.require(HIT_STEP, HIT_STEP)?;
        let (peer_power, peer_attribute) = peer_stats(&self.exchange)?;
        Ok(roll_hit_frame(&self.profile, peer_power, peer_attribute, rng).encode())
    }

    pub fn process_packet(&mut self, bytes: &[u8]) -> Result<()> {
        self.exchange.store_framed(bytes, HIT_STEP)
    }
}

impl PacketCodec for Pen20Device {
    fn protocol(&self) -> Protocol {
        Protocol::Pen20Bs
    }

    fn generate_packet<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Result<Packet> {
        if let Some(sent) = self.exchange.replay_or_next(step)? {
            return Ok(sent);
        }
        let packet = match step {
            ACK_STEP => ack_packet(&self.exchange, step)?,
            HIT_STEP => self.hit_packet(rng)?,
            _ => profile_packet(&self.profile, step, PEN20_HP),
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
