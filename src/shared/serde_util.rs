//! Custom serde helpers for wire formats.

/// Serializes a `U256` as a base-10 string.
///
/// JSON numbers lose precision past 2^53, so 256-bit integers always travel
/// as strings. Deserialization accepts a decimal string, a `0x` hex string
/// (as JSON-RPC nodes send quantities), or a plain JSON integer.
pub mod u256_dec {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(U256::from(n)),
            Repr::Text(s) => parse(&s).map_err(serde::de::Error::custom),
        }
    }

    pub(crate) fn parse(s: &str) -> Result<U256, String> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16),
            Some(_) => return Err(format!("Invalid integer: {}", s)),
            None => U256::from_str_radix(s, 10),
        };
        parsed.map_err(|e| format!("Invalid integer '{}': {}", s, e))
    }
}

/// Deserializes a JSON-RPC hex quantity (`"0x1a"`) into a `u64`.
pub mod hex_u64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| {
            let digits = s.trim_start_matches("0x");
            u64::from_str_radix(digits, 16)
                .map_err(|e| serde::de::Error::custom(format!("Invalid quantity '{}': {}", s, e)))
        })
        .transpose()
    }
}
