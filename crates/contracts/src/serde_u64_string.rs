//! Serde codec for u64 fields that must survive JSON consumers without
//! 53-bit integer precision (seeds, state hashes). Serializes as a decimal
//! string, accepts either a string or a number on input.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U64Input {
        String(String),
        Number(u64),
    }

    match U64Input::deserialize(deserializer)? {
        U64Input::String(raw) => raw.parse::<u64>().map_err(D::Error::custom),
        U64Input::Number(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Wrapper {
        #[serde(with = "super")]
        seed: u64,
    }

    #[test]
    fn round_trips_as_string() {
        let encoded = serde_json::to_string(&Wrapper { seed: u64::MAX }).expect("encode");
        assert_eq!(encoded, r#"{"seed":"18446744073709551615"}"#);
        let decoded: Wrapper = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded.seed, u64::MAX);
    }

    #[test]
    fn deserialize_accepts_number() {
        let parsed: Wrapper = serde_json::from_str(r#"{"seed":4242}"#).expect("numeric seed");
        assert_eq!(parsed.seed, 4242);
    }
}
