//! Plain-data form of a battle result
//!
//! Packets travel as lowercase hex strings and a missing defender as `-1`;
//! both are handled by the serde attributes on [`BattleResult`]. This module
//! adds the versioned envelope and the guest-side relabel.

use serde::Deserialize;
use serde_json::{Value, json};
use vpet_battle::BattleResult;

use crate::{ReplayError, Result};

/// Envelope version written by [`encode_result`]
pub const ENVELOPE_VERSION: u64 = 1;

/// Wrap a result in the transport envelope
pub fn encode_result(result: &BattleResult) -> Result<Value> {
    Ok(json!({
        "version": ENVELOPE_VERSION,
        "result": serde_json::to_value(result)?,
    }))
}

/// Unwrap an envelope produced by [`encode_result`]
pub fn decode_result(value: &Value) -> Result<BattleResult> {
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(ReplayError::MissingField("version"))?;
    if version != ENVELOPE_VERSION {
        return Err(ReplayError::UnsupportedVersion {
            found: version,
            expected: ENVELOPE_VERSION,
        });
    }

    let result = value
        .get("result")
        .ok_or(ReplayError::MissingField("result"))?;
    Ok(BattleResult::deserialize(result)?)
}

pub fn to_json(result: &BattleResult) -> Result<String> {
    Ok(serde_json::to_string(&encode_result(result)?)?)
}

pub fn from_json(json: &str) -> Result<BattleResult> {
    let value: Value = serde_json::from_str(json)?;
    decode_result(&value)
}

/// Decode a result simulated by the host and relabel it so that `device1`
/// refers to this (guest) device
pub fn receive_from_host(value: &Value) -> Result<BattleResult> {
    let result = decode_result(value)?;
    tracing::debug!(
        host_winner = %result.winner,
        turns = result.turns(),
        "relabeling host result"
    );
    Ok(result.mirrored())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpet_battle::{Attribute, BattleSimulator, Digimon, Protocol, Side, Winner};

    fn duel(protocol: Protocol, seed: u64) -> BattleResult {
        let a = Digimon::new("Agumon", Attribute::Vaccine, 100, 6);
        let b = Digimon::new("Tentomon", Attribute::Virus, 100, 6);
        BattleSimulator::new()
            .simulate_seeded(&a, &b, protocol, seed)
            .unwrap()
    }

    #[test]
    fn test_envelope_shape() {
        let result = duel(Protocol::DmxBs, 1);
        let value = encode_result(&result).unwrap();

        assert_eq!(value["version"], 1);
        let packets = value["result"]["device1_packets"].as_array().unwrap();
        assert_eq!(packets.len(), 6);
        assert!(packets.iter().all(|p| p.as_str().unwrap().len() == 4));
    }

    #[test]
    fn test_round_trip() {
        for protocol in Protocol::ALL {
            let result = duel(protocol, 5);
            let decoded = decode_result(&encode_result(&result).unwrap()).unwrap();
            assert_eq!(decoded, result);
            assert_eq!(from_json(&to_json(&result).unwrap()).unwrap(), result);
        }
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut value = encode_result(&duel(Protocol::DmcBs, 0)).unwrap();
        value["version"] = json!(2);
        assert!(matches!(
            decode_result(&value),
            Err(ReplayError::UnsupportedVersion { found: 2, expected: 1 })
        ));

        assert!(matches!(
            decode_result(&json!({ "result": {} })),
            Err(ReplayError::MissingField("version"))
        ));
        assert!(matches!(
            decode_result(&json!({ "version": 1 })),
            Err(ReplayError::MissingField("result"))
        ));
    }

    #[test]
    fn test_rejects_bad_hex() {
        let mut value = encode_result(&duel(Protocol::DmcBs, 0)).unwrap();
        value["result"]["device1_packets"][0] = json!("zz00");
        assert!(matches!(decode_result(&value), Err(ReplayError::Json(_))));
    }

    #[test]
    fn test_receive_from_host_swaps_sides() {
        let result = duel(Protocol::Dm20Bs, 12);
        let guest = receive_from_host(&encode_result(&result).unwrap()).unwrap();

        match result.winner {
            Winner::Device1 => assert_eq!(guest.winner, Winner::Device2),
            Winner::Device2 => assert_eq!(guest.winner, Winner::Device1),
            Winner::Draw => assert_eq!(guest.winner, Winner::Draw),
        }
        assert_eq!(guest.device1_status[0].name, "Tentomon");
        assert_eq!(guest.packets(Side::Device1), result.packets(Side::Device2));
        for (host_turn, guest_turn) in result.battle_log.iter().zip(&guest.battle_log) {
            for (host, guest) in host_turn.attacks.iter().zip(&guest_turn.attacks) {
                assert_eq!(guest.device, host.device.opposite());
            }
        }
    }
}
