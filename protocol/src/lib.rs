//! Wire format for virtual-pet battle links.
//!
//! Four link protocols are supported, each with its own packet count,
//! bit layout and hit model:
//!
//! ```text
//! DMC_BS    4 packets   single win/lose roll, complemented outcome bytes
//! DM20_BS  11 packets   4-bit hit bitmap + check nibble, tag meter packet
//! PEN20_BS 10 packets   DM20 layout without the tag meter, fixed hp 3
//! DMX_BS    6 packets   4-bit hit bitmap + check nibble
//! ```
//!
//! Every packet is a 16-bit word sent big-endian. The codecs in [`codec`]
//! build a device's packets step by step and store the peer's raw bytes in
//! arrival order; the hit and checksum packets are computed from those
//! stored peer bytes.

use thiserror::Error;

pub mod codec;
pub mod hitrate;
pub mod packet;
pub mod types;

pub use codec::{
    CodecOutcome, Dm20Device, DmcDevice, DmxDevice, LinkProfile, PacketCodec, Pen20Device,
    ProtocolCodec,
};
pub use hitrate::{hit_rate, roll_hit};
pub use packet::{CHECKSUM_TARGET, EOL, HitDodge, Packet};
pub use types::{Attribute, Protocol, Side};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{protocol} packet {step} needs {required} peer packets, only {received} processed")]
    PacketNotReady {
        protocol: Protocol,
        step: usize,
        required: usize,
        received: usize,
    },

    #[error("{protocol} has no packet step {step}")]
    InvalidStep { protocol: Protocol, step: usize },

    #[error("{protocol} packet {step} requested before packet {expected}")]
    OutOfOrder {
        protocol: Protocol,
        step: usize,
        expected: usize,
    },

    #[error("{protocol} exchange incomplete: {sent} of {required} packets sent")]
    ExchangeIncomplete {
        protocol: Protocol,
        sent: usize,
        required: usize,
    },

    #[error("Malformed packet: expected {expected} bytes, got {actual}")]
    MalformedPacket { expected: usize, actual: usize },

    #[error("Peer sent more than {0} packets")]
    TooManyPackets(usize),

    #[error("Checksum mismatch in packet {packet:04X}: nibble sum {sum} mod 16 is not 11")]
    ChecksumMismatch { packet: u16, sum: u32 },

    #[error("Complement mismatch in packet {0:04X}")]
    ComplementMismatch(u16),

    #[error("Unknown outcome code {0:X}")]
    UnknownOutcome(u8),

    #[error("Both devices report the same outcome: {0}")]
    OutcomeConflict(&'static str),

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
