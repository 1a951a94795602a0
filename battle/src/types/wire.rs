//! Serde adapters for the transport form of battle results

/// Raw packets as lowercase hex strings
pub(crate) mod hex_packets {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(packets: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(packets.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Missing defender index travels as -1
pub(crate) mod defender_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(defender: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match defender {
            Some(index) => serializer.serialize_i64(*index as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let index = i64::deserialize(deserializer)?;
        Ok(usize::try_from(index).ok())
    }
}
