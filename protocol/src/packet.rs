//! 16-bit packet words and the hit/dodge frame
//!
//! Fields are packed MSB-first. Packets of the DM20 family and DMX end
//! with the [`EOL`] nibble in bits 3..0.

use crate::{ProtocolError, Result};

/// Sentinel nibble terminating DM20/PEN20/DMX packets
pub const EOL: u8 = 0xE;

/// Required remainder of `hits + dodges + eol + check` modulo 16
pub const CHECKSUM_TARGET: u8 = 11;

/// Bytes per packet on the wire
pub const PACKET_BYTES: usize = 2;

/// One 16-bit packet word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet(pub u16);

impl Packet {
    /// Pack `(value, width)` fields MSB-first. Values are masked to their
    /// width; the widths should sum to 16.
    pub fn from_fields(fields: &[(u32, u32)]) -> Self {
        debug_assert_eq!(fields.iter().map(|(_, w)| w).sum::<u32>(), 16);

        let word = fields.iter().fold(0u32, |acc, &(value, width)| {
            (acc << width) | (value & ((1 << width) - 1))
        });
        Packet(word as u16)
    }

    /// Standard data word: `[byte:8][nibble:4][EOL:4]`.
    /// The byte saturates at 255, the nibble is masked.
    pub fn data(byte: u32, nibble: u32) -> Self {
        Self::from_fields(&[(saturate_byte(byte), 8), (nibble, 4), (EOL as u32, 4)])
    }

    /// Complemented word: `[!value:8][value:8]`
    pub fn complemented(value: u8) -> Self {
        Packet(((!value as u16) << 8) | value as u16)
    }

    /// Extract `width` bits starting at bit `shift` (0 = least significant)
    pub fn field(&self, shift: u32, width: u32) -> u16 {
        (self.0 >> shift) & ((1 << width) - 1)
    }

    pub fn high_byte(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn low_byte(&self) -> u8 {
        self.0 as u8
    }

    /// Nibble `index`, counted from the least significant end
    pub fn nibble(&self, index: u32) -> u8 {
        self.field(index * 4, 4) as u8
    }

    /// Value of a complemented word, verifying the high byte
    pub fn complemented_value(&self) -> Result<u8> {
        if self.high_byte() != !self.low_byte() {
            return Err(ProtocolError::ComplementMismatch(self.0));
        }
        Ok(self.low_byte())
    }

    pub fn to_bytes(self) -> [u8; PACKET_BYTES] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; PACKET_BYTES] =
            bytes
                .try_into()
                .map_err(|_| ProtocolError::MalformedPacket {
                    expected: PACKET_BYTES,
                    actual: bytes.len(),
                })?;
        Ok(Packet(u16::from_be_bytes(raw)))
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

pub fn saturate_byte(value: u32) -> u32 {
    value.min(0xFF)
}

/// Pack hit rolls into a bitmap, first roll in the most significant bit
pub fn bitmap_from_rolls(rolls: impl IntoIterator<Item = bool>) -> u8 {
    rolls
        .into_iter()
        .take(4)
        .fold(0u8, |acc, hit| (acc << 1) | hit as u8)
}

/// Hit/dodge frame: `[check:4][dodges:4][hits:4][eol:4]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitDodge {
    pub hits: u8,
    pub dodges: u8,
    pub eol: u8,
    pub check: u8,
}

impl HitDodge {
    /// Frame for a hits bitmap. Dodges are the turns the defender escaped.
    pub fn new(hits: u8) -> Self {
        let hits = hits & 0xF;
        let dodges = !hits & 0xF;
        Self {
            hits,
            dodges,
            eol: EOL,
            check: Self::checksum(hits, dodges, EOL),
        }
    }

    /// Check nibble making the four nibbles sum to [`CHECKSUM_TARGET`] mod 16
    pub fn checksum(hits: u8, dodges: u8, eol: u8) -> u8 {
        let sum = (hits & 0xF) as u32 + (dodges & 0xF) as u32 + (eol & 0xF) as u32;
        ((CHECKSUM_TARGET as u32 + 64 - sum) % 16) as u8
    }

    pub fn nibble_sum(&self) -> u32 {
        self.hits as u32 + self.dodges as u32 + self.eol as u32 + self.check as u32
    }

    pub fn is_valid(&self) -> bool {
        self.nibble_sum() % 16 == CHECKSUM_TARGET as u32
    }

    pub fn encode(&self) -> Packet {
        Packet::from_fields(&[
            (self.check as u32, 4),
            (self.dodges as u32, 4),
            (self.hits as u32, 4),
            (self.eol as u32, 4),
        ])
    }

    /// Parse and verify a hit/dodge word
    pub fn decode(packet: Packet) -> Result<Self> {
        let frame = Self {
            check: packet.nibble(3),
            dodges: packet.nibble(2),
            hits: packet.nibble(1),
            eol: packet.nibble(0),
        };
        if !frame.is_valid() {
            return Err(ProtocolError::ChecksumMismatch {
                packet: packet.0,
                sum: frame.nibble_sum(),
            });
        }
        Ok(frame)
    }

    /// Whether the attack on `turn` (0-based) connects. The bitmap holds four
    /// turns; later turns wrap around to the start.
    pub fn hit_on_turn(&self, turn: usize) -> bool {
        let bit = 3 - (turn % 4);
        (self.hits >> bit) & 1 == 1
    }

    /// Hits in turn order
    pub fn turn_order(&self) -> [bool; 4] {
        [0, 1, 2, 3].map(|turn| self.hit_on_turn(turn))
    }
}
