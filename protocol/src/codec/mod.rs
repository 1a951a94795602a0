//! Per-protocol packet codecs
//!
//! Each device builds its packets one step at a time and keeps the peer's
//! raw bytes in arrival order. Steps that depend on peer data (outcome
//! rolls, hit/dodge frames, acknowledgements) fail with
//! [`ProtocolError::PacketNotReady`] until the peer packets they read have
//! been processed.

mod dm20;
mod dmc;
mod dmx;
mod pen20;

use rand::Rng;

use crate::hitrate::{bonus_hit_rate, roll_hit};
use crate::packet::{HitDodge, Packet, bitmap_from_rolls};
use crate::types::{Attribute, Protocol, Side};
use crate::{ProtocolError, Result};

pub use dm20::Dm20Device;
pub use dmc::DmcDevice;
pub use dmx::DmxDevice;
pub use pen20::{PEN20_HP, Pen20Device};

/// Battle-relevant fields a device transmits about its combatant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkProfile {
    pub index: u16,
    pub order: u8,
    pub attribute: Attribute,
    pub power: u32,
    pub hp: u32,
    pub level: u8,
    pub stage: u8,
    pub handicap: u32,
    pub buff: u32,
    pub skill_score: u8,
    pub traited: bool,
    pub egg_shake: bool,
    pub sick: bool,
    pub shot1: u16,
    pub shot2: u16,
    pub tag_meter: u8,
}

impl LinkProfile {
    /// `[traited][egg_shake][sick]` in the low three bits
    pub fn flags(&self) -> u32 {
        ((self.traited as u32) << 2) | ((self.egg_shake as u32) << 1) | self.sick as u32
    }
}

/// What a device concluded once the exchange is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOutcome {
    /// DMC: single up-front roll
    Verdict { won: bool },
    /// Bitmap protocols: this device's frame and the peer's frame
    HitMap { own: HitDodge, peer: HitDodge },
}

/// Shared interface of the four protocol codecs
pub trait PacketCodec {
    fn protocol(&self) -> Protocol;

    /// Build packet `step` (0-based). Steps must be requested in order;
    /// asking again for an earlier step returns the packet already sent.
    fn generate_packet<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Result<Packet>;

    /// Store one raw peer packet
    fn consume_packet(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read the outcome out of the stored packets
    fn compute_result(&self) -> Result<CodecOutcome>;

    /// Packets this device has sent so far
    fn sent(&self) -> &[Packet];

    fn packet_count(&self) -> usize {
        self.protocol().packet_count()
    }
}

/// Closed set of codecs, one per protocol
#[derive(Debug, Clone)]
pub enum ProtocolCodec {
    Dmc(DmcDevice),
    Dm20(Dm20Device),
    Pen20(Pen20Device),
    Dmx(DmxDevice),
}

impl ProtocolCodec {
    pub fn new(protocol: Protocol, profile: LinkProfile, side: Side) -> Self {
        match protocol {
            Protocol::DmcBs => ProtocolCodec::Dmc(DmcDevice::new(profile, side)),
            Protocol::Dm20Bs => ProtocolCodec::Dm20(Dm20Device::new(profile)),
            Protocol::Pen20Bs => ProtocolCodec::Pen20(Pen20Device::new(profile)),
            Protocol::DmxBs => ProtocolCodec::Dmx(DmxDevice::new(profile)),
        }
    }

    /// Raw bytes of every packet sent so far
    pub fn sent_bytes(&self) -> Vec<Vec<u8>> {
        self.sent().iter().map(|p| p.to_bytes().to_vec()).collect()
    }
}

impl PacketCodec for ProtocolCodec {
    fn protocol(&self) -> Protocol {
        match self {
            ProtocolCodec::Dmc(d) => d.protocol(),
            ProtocolCodec::Dm20(d) => d.protocol(),
            ProtocolCodec::Pen20(d) => d.protocol(),
            ProtocolCodec::Dmx(d) => d.protocol(),
        }
    }

    fn generate_packet<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Result<Packet> {
        match self {
            ProtocolCodec::Dmc(d) => d.generate_packet(step, rng),
            ProtocolCodec::Dm20(d) => d.generate_packet(step, rng),
            ProtocolCodec::Pen20(d) => d.generate_packet(step, rng),
            ProtocolCodec::Dmx(d) => d.generate_packet(step, rng),
        }
    }

    fn consume_packet(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            ProtocolCodec::Dmc(d) => d.consume_packet(bytes),
            ProtocolCodec::Dm20(d) => d.consume_packet(bytes),
            ProtocolCodec::Pen20(d) => d.consume_packet(bytes),
            ProtocolCodec::Dmx(d) => d.consume_packet(bytes),
        }
    }

    fn compute_result(&self) -> Result<CodecOutcome> {
        match self {
            ProtocolCodec::Dmc(d) => d.compute_result(),
            ProtocolCodec::Dm20(d) => d.compute_result(),
            ProtocolCodec::Pen20(d) => d.compute_result(),
            ProtocolCodec::Dmx(d) => d.compute_result(),
        }
    }

    fn sent(&self) -> &[Packet] {
        match self {
            ProtocolCodec::Dmc(d) => d.sent(),
            ProtocolCodec::Dm20(d) => d.sent(),
            ProtocolCodec::Pen20(d) => d.sent(),
            ProtocolCodec::Dmx(d) => d.sent(),
        }
    }
}

/// Sent and received packets of one device
#[derive(Debug, Clone)]
pub(crate) struct Exchange {
    protocol: Protocol,
    sent: Vec<Packet>,
    received: Vec<Vec<u8>>,
}

impl Exchange {
    pub(crate) fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            sent: Vec::with_capacity(protocol.packet_count()),
            received: Vec::with_capacity(protocol.packet_count()),
        }
    }

    pub(crate) fn sent(&self) -> &[Packet] {
        &self.sent
    }

    /// Returns the already-sent packet for a repeated step, `None` when
    /// `step` is the next one to build
    pub(crate) fn replay_or_next(&self, step: usize) -> Result<Option<Packet>> {
        if step >= self.protocol.packet_count() {
            return Err(ProtocolError::InvalidStep {
                protocol: self.protocol,
                step,
            });
        }
        if let Some(packet) = self.sent.get(step) {
            return Ok(Some(*packet));
        }
        if step > self.sent.len() {
            return Err(ProtocolError::OutOfOrder {
                protocol: self.protocol,
                step,
                expected: self.sent.len(),
            });
        }
        Ok(None)
    }

    pub(crate) fn record(&mut self, step: usize, packet: Packet) -> Packet {
        tracing::trace!(protocol = %self.protocol, step, packet = %packet, "packet sent");
        self.sent.push(packet);
        packet
    }

    pub(crate) fn store(&mut self, bytes: &[u8]) -> Result<()> {
        Packet::from_bytes(bytes)?;
        if self.received.len() >= self.protocol.packet_count() {
            return Err(ProtocolError::TooManyPackets(self.protocol.packet_count()));
        }
        self.received.push(bytes.to_vec());
        Ok(())
    }

    pub(crate) fn received_count(&self) -> usize {
        self.received.len()
    }

    /// Store a peer packet, verifying the checksum when it lands on the
    /// hit/dodge step
    pub(crate) fn store_framed(&mut self, bytes: &[u8], hit_step: usize) -> Result<()> {
        if self.received.len() == hit_step {
            HitDodge::decode(Packet::from_bytes(bytes)?)?;
        }
        self.store(bytes)
    }

    /// Fail unless at least `required` peer packets have arrived
    pub(crate) fn require(&self, step: usize, required: usize) -> Result<()> {
        if self.received.len() < required {
            return Err(ProtocolError::PacketNotReady {
                protocol: self.protocol,
                step,
                required,
                received: self.received.len(),
            });
        }
        Ok(())
    }

    /// Peer packet `index` (0-based)
    pub(crate) fn peer(&self, index: usize) -> Result<Packet> {
        let bytes = self
            .received
            .get(index)
            .ok_or(ProtocolError::PacketNotReady {
                protocol: self.protocol,
                step: index,
                required: index + 1,
                received: self.received.len(),
            })?;
        Packet::from_bytes(bytes)
    }
}

/// Roll four attacks against the peer described by the stored packets and
/// frame them. Used by DM20, PEN20 and DMX.
pub(crate) fn roll_hit_frame<R: Rng + ?Sized>(
    profile: &LinkProfile,
    peer_power: u32,
    peer_attribute: Attribute,
    rng: &mut R,
) -> HitDodge {
    let hitrate = bonus_hit_rate(
        profile.power.min(0xFF),
        profile.attribute,
        peer_power,
        peer_attribute,
        profile.handicap,
    );
    let rolls: Vec<bool> = (0..4).map(|_| roll_hit(rng, hitrate)).collect();
    let frame = HitDodge::new(bitmap_from_rolls(rolls));
    tracing::debug!(hitrate, hits = frame.hits, "hit bitmap rolled");
    frame
}

/// Outcome of a bitmap protocol once both hit/dodge frames are known
pub(crate) fn hit_map(exchange: &Exchange, hit_step: usize) -> Result<CodecOutcome> {
    let own = exchange
        .sent()
        .get(hit_step)
        .copied()
        .ok_or(ProtocolError::ExchangeIncomplete {
            protocol: exchange.protocol,
            sent: exchange.sent().len(),
            required: hit_step + 1,
        })?;
    exchange.require(hit_step, hit_step + 1)?;
    let peer = exchange.peer(hit_step)?;

    Ok(CodecOutcome::HitMap {
        own: HitDodge::decode(own)?,
        peer: HitDodge::decode(peer)?,
    })
}
