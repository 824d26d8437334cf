//! Pubkey 的 serde 辅助：快照里统一使用 base58 字符串，而不是 32 个数字的数组

use serde::{Deserialize, Deserializer, Serializer};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

pub mod pubkey {
    use super::*;

    pub fn serialize<S>(value: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub mod pubkey_set {
    use super::*;
    use serde::ser::SerializeSeq;
    use std::collections::BTreeSet;

    pub fn serialize<S>(value: &BTreeSet<Pubkey>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(value.len()))?;
        for key in value {
            seq.serialize_element(&key.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<Pubkey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| Pubkey::from_str(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
